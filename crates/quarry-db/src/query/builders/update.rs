//! The UPDATE builder.

use std::sync::Arc;

use quarry_core::{QuarryResult, VirtualValuesPolicy};

use super::common::{self, ValuesMode};
use crate::model::Model;
use crate::query::expressions::{Expr, IntoExpr};
use crate::query::resolver::Resolver;
use crate::query::tree::{Query, StatementKind};
use crate::registry::{registry, Registry};

/// An UPDATE under construction.
///
/// Unlike inserts, updates refuse fields marked read-only.
#[derive(Debug, Clone)]
pub struct Update {
    query: Query,
    resolver: Resolver,
    mode: ValuesMode,
}

impl Update {
    /// Starts an UPDATE of a globally registered model's table.
    ///
    /// # Errors
    ///
    /// Returns `NotAnnotated` if `M` was never registered.
    pub fn table<M: Model>() -> QuarryResult<Self> {
        Self::table_in::<M>(registry())
    }

    /// Starts an UPDATE of a model's table from `registry`.
    ///
    /// # Errors
    ///
    /// Returns `NotAnnotated` if `M` was never registered.
    pub fn table_in<M: Model>(registry: &Registry) -> QuarryResult<Self> {
        let table = registry.lookup::<M>()?;
        let resolver = Resolver::new(Arc::clone(&table));
        let mut query = Query::new(StatementKind::Update, table);
        query.columns = common::default_columns(&resolver)?;
        Ok(Self {
            query,
            resolver,
            mode: ValuesMode::update(),
        })
    }

    /// Overrides the configured policy for filter-only fields in values.
    #[must_use]
    pub fn on_virtual_values(mut self, policy: VirtualValuesPolicy) -> Self {
        self.mode.policy = policy;
        self
    }

    /// Assigns literal values by property name.
    ///
    /// # Errors
    ///
    /// Returns `UnknownField`, `ReadOnlyField`, `VirtualField` (under the
    /// reject policy), or any error from the field's writer.
    pub fn values<I, K, V>(mut self, pairs: I) -> QuarryResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: IntoExpr,
    {
        common::assign_values(&self.resolver, &mut self.query, self.mode, pairs)?;
        Ok(self)
    }

    /// Assigns every cell of a model instance.
    ///
    /// # Errors
    ///
    /// As for [`values`](Self::values).
    pub fn values_from<M: Model>(self, model: &M) -> QuarryResult<Self> {
        let pairs = common::model_values(self.resolver.table(), model);
        self.values(pairs)
    }

    /// Assigns the expressions returned by the callback, e.g.
    /// `visits = visits + 1`.
    ///
    /// # Errors
    ///
    /// As for [`values`](Self::values), plus any error from the callback.
    pub fn values_with<F, K>(self, values: F) -> QuarryResult<Self>
    where
        F: FnOnce(&Resolver) -> QuarryResult<Vec<(K, Expr)>>,
        K: AsRef<str>,
    {
        let pairs = values(&self.resolver)?;
        self.values(pairs)
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

impl From<Update> for Query {
    fn from(update: Update) -> Self {
        update.build()
    }
}
