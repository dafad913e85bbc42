//! The INSERT and upsert builders.
//!
//! [`Insert`] assigns column values; [`Upsert`] adds an ON CONFLICT target
//! resolved from the table's primary key or a declared index.

use std::sync::Arc;

use quarry_core::{QuarryError, QuarryResult, VirtualValuesPolicy};

use super::common::{self, ValuesMode};
use crate::model::{Model, TableDescriptor};
use crate::query::expressions::{Expr, IntoExpr};
use crate::query::resolver::Resolver;
use crate::query::tree::{ConflictAction, ConflictSpec, Query, StatementKind};
use crate::registry::{registry, Registry};

/// An INSERT under construction.
#[derive(Debug, Clone)]
pub struct Insert {
    query: Query,
    resolver: Resolver,
    mode: ValuesMode,
}

impl Insert {
    /// Starts an INSERT into a globally registered model's table.
    ///
    /// # Errors
    ///
    /// Returns `NotAnnotated` if `M` was never registered.
    pub fn into<M: Model>() -> QuarryResult<Self> {
        Self::into_in::<M>(registry())
    }

    /// Starts an INSERT into a model's table from `registry`.
    ///
    /// # Errors
    ///
    /// Returns `NotAnnotated` if `M` was never registered.
    pub fn into_in<M: Model>(registry: &Registry) -> QuarryResult<Self> {
        let (query, resolver) = seeded(StatementKind::Insert, registry.lookup::<M>()?)?;
        Ok(Self {
            query,
            resolver,
            mode: ValuesMode::insert(),
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
    /// Returns `UnknownField`, `VirtualField` (under the reject policy), or
    /// any error from the field's writer.
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

    /// Assigns the expressions returned by the callback.
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

    /// Returns the finished query tree.
    pub fn build(self) -> Query {
        common::log_built(&self.query);
        self.query
    }
}

impl From<Insert> for Query {
    fn from(insert: Insert) -> Self {
        insert.build()
    }
}

/// An `INSERT ... ON CONFLICT` under construction.
///
/// The conflict target defaults to the primary key when [`conflict`]
/// is never called, and the statement is limited to one row unless
/// [`limit`](Self::limit) says otherwise.
///
/// [`conflict`]: Self::conflict
#[derive(Debug, Clone)]
pub struct Upsert {
    query: Query,
    resolver: Resolver,
    mode: ValuesMode,
}

impl Upsert {
    /// Starts an upsert into a globally registered model's table.
    ///
    /// # Errors
    ///
    /// Returns `NotAnnotated` if `M` was never registered.
    pub fn into<M: Model>() -> QuarryResult<Self> {
        Self::into_in::<M>(registry())
    }

    /// Starts an upsert into a model's table from `registry`.
    ///
    /// # Errors
    ///
    /// Returns `NotAnnotated` if `M` was never registered.
    pub fn into_in<M: Model>(registry: &Registry) -> QuarryResult<Self> {
        let (mut query, resolver) = seeded(StatementKind::Upsert, registry.lookup::<M>()?)?;
        query.limit = Some(1);
        Ok(Self {
            query,
            resolver,
            mode: ValuesMode::insert(),
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
    /// As for [`Insert::values`].
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
    /// As for [`Insert::values`].
    pub fn values_from<M: Model>(self, model: &M) -> QuarryResult<Self> {
        let pairs = common::model_values(self.resolver.table(), model);
        self.values(pairs)
    }

    /// Assigns the expressions returned by the callback.
    ///
    /// # Errors
    ///
    /// As for [`Insert::values`], plus any error from the callback.
    pub fn values_with<F, K>(self, values: F) -> QuarryResult<Self>
    where
        F: FnOnce(&Resolver) -> QuarryResult<Vec<(K, Expr)>>,
        K: AsRef<str>,
    {
        let pairs = values(&self.resolver)?;
        self.values(pairs)
    }

    /// Appends a predicate restricting which conflicting rows are updated.
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

    /// Sets the conflict target.
    ///
    /// Without a name the primary-key columns are used. A name selects a
    /// declared index and carries its partial-index condition.
    ///
    /// # Errors
    ///
    /// Returns `ConflictTarget` naming the table when the index is not
    /// declared, or when no name is given and the table has no primary key.
    pub fn conflict(self, index: Option<&str>) -> QuarryResult<Self> {
        let target = index.map_or(Target::PrimaryKey, Target::Named);
        self.set_target(target)
    }

    /// Targets the index declared with
    /// [`default_target`](crate::model::IndexDescriptor::default_target).
    ///
    /// # Errors
    ///
    /// Returns `ConflictTarget` if the table declares no default index.
    pub fn conflict_default(self) -> QuarryResult<Self> {
        self.set_target(Target::DefaultIndex)
    }

    fn set_target(mut self, target: Target<'_>) -> QuarryResult<Self> {
        let action = self
            .query
            .conflict
            .as_ref()
            .map_or(ConflictAction::Update, |c| c.action);
        let mut spec = conflict_target(self.resolver.table(), target)?;
        spec.action = action;
        self.query.conflict = Some(spec);
        Ok(self)
    }

    /// Switches the conflict action to DO NOTHING.
    ///
    /// # Errors
    ///
    /// Returns `ConflictTarget` if no target was set and the table has no
    /// primary key.
    pub fn do_nothing(mut self) -> QuarryResult<Self> {
        let mut spec = match self.query.conflict.take() {
            Some(spec) => spec,
            None => conflict_target(self.resolver.table(), Target::PrimaryKey)?,
        };
        spec.action = ConflictAction::Nothing;
        self.query.conflict = Some(spec);
        Ok(self)
    }

    /// Overrides the default limit of one row.
    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.query.limit = Some(limit);
        self
    }

    /// Returns the finished query tree.
    ///
    /// A missing conflict target is filled from the primary key. When the
    /// table has none, a warning is logged and the target stays empty; use
    /// [`try_build`](Self::try_build) to get the error instead.
    pub fn build(mut self) -> Query {
        if let Err(err) = self.derive_target() {
            tracing::warn!(
                table = self.resolver.table().table_name(),
                error = %err,
                "upsert built without a conflict target"
            );
        }
        common::log_built(&self.query);
        self.query
    }

    /// Returns the finished query tree, failing when no conflict target was
    /// set and none can be derived.
    ///
    /// # Errors
    ///
    /// Returns `ConflictTarget` when the table has no primary key.
    pub fn try_build(mut self) -> QuarryResult<Query> {
        self.derive_target()?;
        common::log_built(&self.query);
        Ok(self.query)
    }

    fn derive_target(&mut self) -> QuarryResult<()> {
        if self.query.conflict.is_none() {
            let spec = conflict_target(self.resolver.table(), Target::PrimaryKey)?;
            self.query.conflict = Some(spec);
        }
        Ok(())
    }
}

impl From<Upsert> for Query {
    fn from(upsert: Upsert) -> Self {
        upsert.build()
    }
}

fn seeded(kind: StatementKind, table: Arc<TableDescriptor>) -> QuarryResult<(Query, Resolver)> {
    let resolver = Resolver::new(Arc::clone(&table));
    let mut query = Query::new(kind, table);
    query.columns = common::default_columns(&resolver)?;
    Ok((query, resolver))
}

#[derive(Debug, Clone, Copy)]
enum Target<'a> {
    PrimaryKey,
    Named(&'a str),
    DefaultIndex,
}

fn conflict_target(table: &TableDescriptor, target: Target<'_>) -> QuarryResult<ConflictSpec> {
    let fail = |reason: String| QuarryError::ConflictTarget {
        table: table.table_name().to_string(),
        reason,
    };

    let index = match target {
        Target::Named(name) => {
            if table.indexes().is_empty() {
                return Err(fail(format!("no indexes declared, cannot use '{name}'")));
            }
            Some(
                table
                    .index(name)
                    .ok_or_else(|| fail(format!("index '{name}' is not declared")))?,
            )
        }
        Target::PrimaryKey if table.primary_key().is_empty() => {
            return Err(fail("no primary key and no index name given".to_string()));
        }
        Target::PrimaryKey => None,
        Target::DefaultIndex => Some(
            table
                .default_index()
                .ok_or_else(|| fail("no index is flagged as the default target".to_string()))?,
        ),
    };

    match index {
        Some(index) => Ok(ConflictSpec {
            columns: table.columns_for(&index.key_fields)?,
            condition: index.where_condition.clone(),
            action: ConflictAction::Update,
        }),
        None => Ok(ConflictSpec {
            columns: table.columns_for(table.primary_key())?,
            condition: None,
            action: ConflictAction::Update,
        }),
    }
}
