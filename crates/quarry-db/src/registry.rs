//! The model metadata registry.
//!
//! Every model is registered once, at startup, with a [`TableBuilder`]. The
//! registry keeps the resulting [`TableDescriptor`] keyed by the model's
//! `TypeId`; builders and the hydrator look it up afterwards. Descriptors
//! are shared through `Arc` and never mutated after registration.
//!
//! # Examples
//!
//! ```
//! use quarry_core::QuarryResult;
//! use quarry_db::fields::FieldDescriptor;
//! use quarry_db::model::{Model, TableBuilder};
//! use quarry_db::registry::Registry;
//! use quarry_db::row::Record;
//!
//! struct TagModel;
//!
//! impl Model for TagModel {
//!     fn from_record(_: &Record) -> QuarryResult<Self> { Ok(Self) }
//!     fn to_record(&self) -> Record { Record::new() }
//! }
//!
//! let registry = Registry::new();
//! registry
//!     .register::<TagModel>(TableBuilder::new().field("id", FieldDescriptor::new().primary_key()))
//!     .unwrap();
//! assert_eq!(registry.lookup::<TagModel>().unwrap().table_name(), "tag");
//! ```

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use quarry_core::{QuarryError, QuarryResult};

use crate::model::{default_table_name, Model, TableBuilder, TableDescriptor};

/// A write-once table of model metadata keyed by model type.
#[derive(Debug, Default)]
pub struct Registry {
    tables: RwLock<HashMap<TypeId, Arc<TableDescriptor>>>,
}

impl Registry {
    /// Creates a new, empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds and stores the descriptor for `M`.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyRegistered` if `M` was registered before, or any
    /// validation error from [`TableBuilder::build`].
    pub fn register<M: Model>(&self, table: TableBuilder) -> QuarryResult<Arc<TableDescriptor>> {
        let descriptor = Arc::new(table.build(&default_table_name(M::model_name()))?);

        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        if tables.contains_key(&TypeId::of::<M>()) {
            return Err(QuarryError::AlreadyRegistered(M::model_name().to_string()));
        }
        tables.insert(TypeId::of::<M>(), Arc::clone(&descriptor));
        drop(tables);

        tracing::debug!(
            model = M::model_name(),
            table = descriptor.table_name(),
            fields = descriptor.fields().len(),
            "registered model"
        );
        Ok(descriptor)
    }

    /// Returns the descriptor for `M`.
    ///
    /// # Errors
    ///
    /// Returns `NotAnnotated` naming the model if it was never registered.
    pub fn lookup<M: Model>(&self) -> QuarryResult<Arc<TableDescriptor>> {
        self.get::<M>()
            .ok_or_else(|| QuarryError::NotAnnotated(M::model_name().to_string()))
    }

    /// Returns the descriptor for `M`, or an empty one named after the
    /// model's default table name if it was never registered.
    pub fn probe<M: Model>(&self) -> Arc<TableDescriptor> {
        self.get::<M>().unwrap_or_else(|| {
            Arc::new(TableDescriptor::empty(default_table_name(M::model_name())))
        })
    }

    /// Returns `true` if `M` has been registered.
    pub fn is_registered<M: Model>(&self) -> bool {
        self.get::<M>().is_some()
    }

    /// Returns the number of registered models.
    pub fn len(&self) -> usize {
        self.tables.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get<M: Model>(&self) -> Option<Arc<TableDescriptor>> {
        self.tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&TypeId::of::<M>())
            .cloned()
    }
}

/// Returns the process-wide registry.
///
/// Builders created without an explicit registry resolve models here.
pub fn registry() -> &'static Registry {
    static GLOBAL: OnceLock<Registry> = OnceLock::new();
    GLOBAL.get_or_init(Registry::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::FieldDescriptor;
    use crate::row::Record;
    use std::thread;

    struct PersonModel;
    struct Ghost;

    impl Model for PersonModel {
        fn from_record(_: &Record) -> QuarryResult<Self> {
            Ok(Self)
        }
        fn to_record(&self) -> Record {
            Record::new()
        }
    }

    impl Model for Ghost {
        fn from_record(_: &Record) -> QuarryResult<Self> {
            Ok(Self)
        }
        fn to_record(&self) -> Record {
            Record::new()
        }
    }

    fn person_table() -> TableBuilder {
        TableBuilder::new()
            .field("id", FieldDescriptor::new().primary_key())
            .field("name", FieldDescriptor::new())
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = Registry::new();
        let registered = registry.register::<PersonModel>(person_table()).unwrap();
        let found = registry.lookup::<PersonModel>().unwrap();
        assert!(Arc::ptr_eq(&registered, &found));
        assert_eq!(found.table_name(), "person");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_register_twice_fails() {
        let registry = Registry::new();
        registry.register::<PersonModel>(person_table()).unwrap();
        let err = registry.register::<PersonModel>(person_table()).unwrap_err();
        assert!(matches!(err, QuarryError::AlreadyRegistered(ref m) if m == "PersonModel"));
    }

    #[test]
    fn test_lookup_unregistered_fails() {
        let registry = Registry::new();
        let err = registry.lookup::<Ghost>().unwrap_err();
        assert!(err.to_string().contains("Ghost"));
        assert!(err.is_metadata_error());
    }

    #[test]
    fn test_probe_unregistered_is_empty() {
        let registry = Registry::new();
        let table = registry.probe::<Ghost>();
        assert!(table.is_empty());
        assert_eq!(table.table_name(), "ghost");
        assert!(!registry.is_registered::<Ghost>());
    }

    #[test]
    fn test_explicit_table_name() {
        let registry = Registry::new();
        registry
            .register::<PersonModel>(TableBuilder::named("people").field("id", FieldDescriptor::new()))
            .unwrap();
        assert_eq!(registry.lookup::<PersonModel>().unwrap().table_name(), "people");
    }

    #[test]
    fn test_concurrent_lookups() {
        let registry = Arc::new(Registry::new());
        registry.register::<PersonModel>(person_table()).unwrap();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || registry.lookup::<PersonModel>().unwrap().table_name().to_string())
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), "person");
        }
    }
}
