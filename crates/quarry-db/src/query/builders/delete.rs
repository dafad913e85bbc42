//! The DELETE builder.

use std::sync::Arc;

use quarry_core::QuarryResult;

use super::common;
use crate::model::Model;
use crate::query::expressions::{Expr, IntoExpr};
use crate::query::resolver::Resolver;
use crate::query::tree::{Query, StatementKind};
use crate::registry::{registry, Registry};

/// A DELETE under construction.
#[derive(Debug, Clone)]
pub struct Delete {
    query: Query,
    resolver: Resolver,
}

impl Delete {
    /// Starts a DELETE from a globally registered model's table.
    ///
    /// # Errors
    ///
    /// Returns `NotAnnotated` if `M` was never registered.
    pub fn from<M: Model>() -> QuarryResult<Self> {
        Self::from_in::<M>(registry())
    }

    /// Starts a DELETE from a model's table in `registry`.
    ///
    /// # Errors
    ///
    /// Returns `NotAnnotated` if `M` was never registered.
    pub fn from_in<M: Model>(registry: &Registry) -> QuarryResult<Self> {
        let table = registry.lookup::<M>()?;
        let resolver = Resolver::new(Arc::clone(&table));
        let mut query = Query::new(StatementKind::Delete, table);
        query.columns = common::default_columns(&resolver)?;
        Ok(Self { query, resolver })
    }

    /// Appends a WHERE predicate.
    ///
    /// # Errors
    ///
    /// Propagates any error from the callback.
    pub fn filter<F>(mut self, predicate: F) -> QuarryResult<Self>
    where
        F: FnOnce(&Resolver) -> QuarryResult<Expr>,
    {
        let expr = predicate(&self.resolver)?;
        self.query.predicates.push(expr.unaliased());
        Ok(self)
    }

    /// Appends `field = value` for every pair, ANDed together.
    ///
    /// # Errors
    ///
    /// Returns `UnknownField` for unregistered names.
    pub fn filter_eq<I, K, V>(mut self, pairs: I) -> QuarryResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: IntoExpr,
    {
        let expr = common::equality_predicate(&self.resolver, pairs)?;
        self.query.predicates.push(expr);
        Ok(self)
    }

    /// LIMIT.
    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.query.limit = Some(limit);
        self
    }

    /// Returns the finished query tree.
    pub fn build(self) -> Query {
        common::log_built(&self.query);
        self.query
    }
}

impl From<Delete> for Query {
    fn from(delete: Delete) -> Self {
        delete.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::FieldDescriptor;
    use crate::model::TableBuilder;
    use crate::query::expressions::{and, NaryOp};
    use crate::row::Record;
    use pretty_assertions::assert_eq;

    struct Session;

    impl Model for Session {
        fn from_record(_record: &Record) -> QuarryResult<Self> {
            Ok(Self)
        }
        fn to_record(&self) -> Record {
            Record::new()
        }
    }

    fn registry() -> Registry {
        let registry = Registry::new();
        registry
            .register::<Session>(
                TableBuilder::new()
                    .field("id", FieldDescriptor::new().primary_key())
                    .field("user", FieldDescriptor::new().column("user_id"))
                    .field("expired", FieldDescriptor::new()),
            )
            .unwrap();
        registry
    }

    #[test]
    fn test_delete_filter_eq_pairs_are_anded() {
        let registry = registry();
        let query = Delete::from_in::<Session>(&registry)
            .unwrap()
            .filter_eq([("user", 1), ("expired", 1)])
            .unwrap()
            .build();
        assert_eq!(query.kind, StatementKind::Delete);
        assert!(matches!(&query.predicates[0], Expr::Nary { op: NaryOp::And, operands } if operands.len() == 2));
    }

    #[test]
    fn test_delete_filter_and_limit() {
        let registry = registry();
        let query = Delete::from_in::<Session>(&registry)
            .unwrap()
            .filter(|s| Ok(and([s.field("user")?.eq(1), s.field("expired")?.is_not_null()])))
            .unwrap()
            .limit(100)
            .build();
        assert_eq!(query.limit, Some(100));
        assert_eq!(query.table().table_name(), "session");
    }
}
