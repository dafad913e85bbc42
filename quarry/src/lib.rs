//! # quarry
//!
//! Typed query construction for Rust.
//!
//! This is the meta-crate that re-exports the quarry sub-crates. Depend on
//! `quarry` for everything, or on the individual crates for finer-grained
//! control.
//!
//! ```
//! use quarry::prelude::*;
//!
//! struct Person;
//! impl Model for Person {
//!     fn from_record(_: &Record) -> QuarryResult<Self> { Ok(Person) }
//!     fn to_record(&self) -> Record { Record::new() }
//! }
//!
//! let registry = Registry::new();
//! registry
//!     .register::<Person>(
//!         TableBuilder::new()
//!             .field("id", FieldDescriptor::new().primary_key())
//!             .field("name", FieldDescriptor::new()),
//!     )
//!     .unwrap();
//!
//! let query = Select::from_in::<Person>(&registry)
//!     .unwrap()
//!     .filter_eq([("name", "Ada")])
//!     .unwrap()
//!     .build();
//! assert_eq!(query.kind, StatementKind::Select);
//! ```

/// Error types, settings, and logging setup.
pub use quarry_core as core;

/// Metadata, expressions, builders, and hydration.
pub use quarry_db as db;

// Third-party crates that appear in quarry's public API.
pub use async_trait::async_trait;
pub use chrono;
pub use serde;
pub use serde_json;
pub use tracing;
pub use uuid;

/// Everything needed to declare models and build statements.
pub mod prelude {
    pub use quarry_core::logging::setup_logging;
    pub use quarry_core::{Settings, VirtualValuesPolicy, SETTINGS};
    pub use quarry_db::executor::{Compiler, Driver};
    pub use quarry_db::prelude::*;
}
