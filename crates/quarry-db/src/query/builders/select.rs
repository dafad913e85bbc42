//! The SELECT builder.
//!
//! [`Select`] accumulates clauses into a [`Query`] in call order. Clause
//! methods consume and return the builder; the ones that resolve names or run
//! callbacks return `QuarryResult<Self>` so mistakes surface at the call that
//! made them.
//!
//! # Examples
//!
//! ```
//! use quarry_db::prelude::*;
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
//!             .field("age", FieldDescriptor::new()),
//!     )
//!     .unwrap();
//!
//! let query = Select::from_in::<Person>(&registry)
//!     .unwrap()
//!     .filter(|p| Ok(p.field("age")?.gte(18)))
//!     .unwrap()
//!     .order_by([desc("age")])
//!     .unwrap()
//!     .limit(10)
//!     .build();
//! assert_eq!(query.predicates.len(), 1);
//! assert_eq!(query.limit, Some(10));
//! ```

use std::sync::Arc;

use quarry_core::{QuarryError, QuarryResult, SETTINGS};

use super::common;
use crate::model::{Model, TableDescriptor};
use crate::query::expressions::{Expr, IntoExpr, OrderTarget, OrderTerm};
use crate::query::resolver::Resolver;
use crate::query::tree::{
    Join, JoinKind, LockMode, Query, SetOperation, SetOperator, Source, StatementKind,
};
use crate::registry::{registry, Registry};

/// A SELECT under construction.
#[derive(Debug, Clone)]
pub struct Select<'r> {
    registry: &'r Registry,
    query: Query,
    resolver: Resolver,
    custom_columns: bool,
}

impl Select<'static> {
    /// Starts a SELECT over a model registered in the global registry.
    ///
    /// # Errors
    ///
    /// Returns `NotAnnotated` if `M` was never registered.
    pub fn from<M: Model>() -> QuarryResult<Self> {
        Self::from_in::<M>(registry())
    }

    /// Starts an aliased SELECT over a globally registered model.
    ///
    /// # Errors
    ///
    /// Returns `NotAnnotated` if `M` was never registered.
    pub fn from_aliased<M: Model>(alias: &str) -> QuarryResult<Self> {
        Self::from_aliased_in::<M>(registry(), alias)
    }
}

impl<'r> Select<'r> {
    /// Starts a SELECT over a model registered in `registry`.
    ///
    /// # Errors
    ///
    /// Returns `NotAnnotated` if `M` was never registered.
    pub fn from_in<M: Model>(registry: &'r Registry) -> QuarryResult<Self> {
        let table = registry.lookup::<M>()?;
        Self::seeded(registry, Source::Table { table, alias: None })
    }

    /// Starts an aliased SELECT over a model registered in `registry`.
    ///
    /// # Errors
    ///
    /// Returns `NotAnnotated` if `M` was never registered.
    pub fn from_aliased_in<M: Model>(registry: &'r Registry, alias: &str) -> QuarryResult<Self> {
        let table = registry.lookup::<M>()?;
        Self::seeded(
            registry,
            Source::Table {
                table,
                alias: Some(alias.to_string()),
            },
        )
    }

    /// Starts a SELECT over a nested SELECT used as a derived table.
    ///
    /// The derived table is named after the inner table plus the configured
    /// suffix (`_SUBQUERY` by default) and exposes the inner projection's
    /// output names as fields. Without an alias it is referenced by that
    /// synthetic name.
    ///
    /// # Errors
    ///
    /// Propagates resolution errors for the default projection.
    pub fn from_query(inner: Select<'r>, alias: Option<&str>) -> QuarryResult<Self> {
        let registry = inner.registry;
        let inner = inner.build();
        let name = format!(
            "{}{}",
            inner.table().table_name(),
            SETTINGS.get().subquery_suffix
        );
        let table = Arc::new(TableDescriptor::synthetic(name.clone(), inner.output_names()));
        let alias = alias.map_or(name, str::to_string);
        Self::seeded(
            registry,
            Source::Derived {
                query: Box::new(inner),
                table,
                alias,
            },
        )
    }

    fn seeded(registry: &'r Registry, source: Source) -> QuarryResult<Self> {
        let mut resolver = Resolver::new(Arc::clone(source.table()));
        if let Some(alias) = source.alias() {
            resolver = resolver.with_alias(alias);
        }
        let mut query = Query::with_source(StatementKind::Select, source);
        query.columns = common::default_columns(&resolver)?;
        Ok(Self {
            registry,
            query,
            resolver,
            custom_columns: false,
        })
    }

    /// Returns the resolver for the selected table.
    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Returns a resolver for another registered model, for referencing a
    /// joined table from later clauses.
    ///
    /// # Errors
    ///
    /// Returns `NotAnnotated` if `J` was never registered.
    pub fn joined<J: Model>(&self, alias: Option<&str>) -> QuarryResult<Resolver> {
        let resolver = Resolver::new(self.registry.lookup::<J>()?);
        Ok(match alias {
            Some(alias) => resolver.with_alias(alias),
            None => resolver,
        })
    }

    /// Returns the query built so far.
    pub fn query(&self) -> &Query {
        &self.query
    }

    // ── WHERE / HAVING ──────────────────────────────────────────────

    /// Appends a WHERE predicate built from the table's resolver.
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

    /// Appends a HAVING predicate.
    ///
    /// # Errors
    ///
    /// Propagates any error from the callback.
    pub fn having<F>(mut self, predicate: F) -> QuarryResult<Self>
    where
        F: FnOnce(&Resolver) -> QuarryResult<Expr>,
    {
        let expr = predicate(&self.resolver)?;
        self.query.having.push(expr.unaliased());
        Ok(self)
    }

    // ── Projection ──────────────────────────────────────────────────

    fn push_columns(&mut self, columns: Vec<Expr>) {
        if self.custom_columns {
            self.query.columns.extend(columns);
        } else {
            self.query.columns = columns;
            self.custom_columns = true;
        }
    }

    /// Projects the named fields.
    ///
    /// The first projection call replaces the default columns; later calls
    /// append.
    ///
    /// # Errors
    ///
    /// Returns `UnknownField` or `VirtualField`.
    pub fn columns<I, S>(mut self, names: I) -> QuarryResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let columns = common::named_columns(&self.resolver, names)?;
        self.push_columns(columns);
        Ok(self)
    }

    /// Projects the expressions returned by the callback.
    ///
    /// # Errors
    ///
    /// Propagates any error from the callback.
    pub fn columns_with<F>(mut self, columns: F) -> QuarryResult<Self>
    where
        F: FnOnce(&Resolver) -> QuarryResult<Vec<Expr>>,
    {
        let columns = columns(&self.resolver)?;
        self.push_columns(columns);
        Ok(self)
    }

    /// SELECT DISTINCT.
    #[must_use]
    pub fn distinct(mut self) -> Self {
        self.query.distinct = true;
        self
    }

    // ── GROUP BY / ORDER BY ─────────────────────────────────────────

    /// Groups by field names or 1-based ordinals.
    ///
    /// # Errors
    ///
    /// Returns `UnknownField` or `VirtualField`.
    pub fn group_by<I, T>(mut self, targets: I) -> QuarryResult<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<OrderTarget>,
    {
        let exprs = common::group_targets(&self.resolver, targets)?;
        self.query.group_by.extend(exprs);
        Ok(self)
    }

    /// Groups by the expressions returned by the callback.
    ///
    /// # Errors
    ///
    /// Propagates any error from the callback.
    pub fn group_by_with<F>(mut self, exprs: F) -> QuarryResult<Self>
    where
        F: FnOnce(&Resolver) -> QuarryResult<Vec<Expr>>,
    {
        let exprs = exprs(&self.resolver)?;
        self.query.group_by.extend(exprs.into_iter().map(Expr::unaliased));
        Ok(self)
    }

    /// Orders by names, expressions, or ordinals (`asc`, `desc`, and plain
    /// names all convert into an [`OrderTerm`]).
    ///
    /// # Errors
    ///
    /// Returns `UnknownField` or `VirtualField` for named terms.
    pub fn order_by<I, T>(mut self, terms: I) -> QuarryResult<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<OrderTerm>,
    {
        let terms = common::order_terms(&self.resolver, terms)?;
        self.query.order_by.extend(terms);
        Ok(self)
    }

    /// Orders by the terms returned by the callback.
    ///
    /// # Errors
    ///
    /// Propagates any error from the callback.
    pub fn order_by_with<F>(mut self, terms: F) -> QuarryResult<Self>
    where
        F: FnOnce(&Resolver) -> QuarryResult<Vec<OrderTerm>>,
    {
        let terms = terms(&self.resolver)?;
        let terms = common::order_terms(&self.resolver, terms)?;
        self.query.order_by.extend(terms);
        Ok(self)
    }

    // ── JOIN ────────────────────────────────────────────────────────

    fn join_as<J, F>(mut self, kind: JoinKind, alias: Option<&str>, on: F) -> QuarryResult<Self>
    where
        J: Model,
        F: FnOnce(&Resolver, &Resolver) -> QuarryResult<Expr>,
    {
        let joined = self.joined::<J>(alias)?;
        let on = on(&self.resolver, &joined)?.unaliased();
        tracing::trace!(
            kind = kind.sql_keyword(),
            table = joined.table().table_name(),
            "adding join"
        );
        self.query.joins.push(Join {
            kind,
            table: Arc::clone(joined.table()),
            alias: alias.map(str::to_string),
            on,
        });
        Ok(self)
    }

    /// INNER JOIN. The condition receives the outer and joined resolvers.
    ///
    /// # Errors
    ///
    /// Returns `NotAnnotated` if `J` was never registered, or any error from
    /// the callback.
    pub fn join<J, F>(self, alias: Option<&str>, on: F) -> QuarryResult<Self>
    where
        J: Model,
        F: FnOnce(&Resolver, &Resolver) -> QuarryResult<Expr>,
    {
        self.join_as::<J, F>(JoinKind::Inner, alias, on)
    }

    /// LEFT JOIN.
    ///
    /// # Errors
    ///
    /// As for [`join`](Self::join).
    pub fn join_left<J, F>(self, alias: Option<&str>, on: F) -> QuarryResult<Self>
    where
        J: Model,
        F: FnOnce(&Resolver, &Resolver) -> QuarryResult<Expr>,
    {
        self.join_as::<J, F>(JoinKind::Left, alias, on)
    }

    /// RIGHT JOIN.
    ///
    /// # Errors
    ///
    /// As for [`join`](Self::join).
    pub fn join_right<J, F>(self, alias: Option<&str>, on: F) -> QuarryResult<Self>
    where
        J: Model,
        F: FnOnce(&Resolver, &Resolver) -> QuarryResult<Expr>,
    {
        self.join_as::<J, F>(JoinKind::Right, alias, on)
    }

    /// FULL OUTER JOIN.
    ///
    /// # Errors
    ///
    /// As for [`join`](Self::join).
    pub fn join_full<J, F>(self, alias: Option<&str>, on: F) -> QuarryResult<Self>
    where
        J: Model,
        F: FnOnce(&Resolver, &Resolver) -> QuarryResult<Expr>,
    {
        self.join_as::<J, F>(JoinKind::Full, alias, on)
    }

    // ── Set operators ───────────────────────────────────────────────

    fn set_operation(mut self, op: SetOperator, distinct: bool, other: Select<'_>) -> Self {
        self.query.set_operations.push(SetOperation {
            op,
            distinct,
            query: Box::new(other.build()),
        });
        self
    }

    /// Appends `UNION [DISTINCT] other`.
    #[must_use]
    pub fn union(self, distinct: bool, other: Select<'_>) -> Self {
        self.set_operation(SetOperator::Union, distinct, other)
    }

    /// Appends `INTERSECT [DISTINCT] other`.
    #[must_use]
    pub fn intersect(self, distinct: bool, other: Select<'_>) -> Self {
        self.set_operation(SetOperator::Intersect, distinct, other)
    }

    /// Appends `EXCEPT [DISTINCT] other`.
    #[must_use]
    pub fn except(self, distinct: bool, other: Select<'_>) -> Self {
        self.set_operation(SetOperator::Except, distinct, other)
    }

    // ── Paging and locking ──────────────────────────────────────────

    /// LIMIT.
    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.query.limit = Some(limit);
        self
    }

    /// OFFSET.
    #[must_use]
    pub fn offset(mut self, offset: u64) -> Self {
        self.query.offset = Some(offset);
        self
    }

    /// Adds a row-locking clause.
    #[must_use]
    pub fn lock(mut self, mode: LockMode) -> Self {
        self.query.lock = Some(mode);
        self
    }

    /// `FOR UPDATE`.
    #[must_use]
    pub fn for_update(self) -> Self {
        self.lock(LockMode::Update)
    }

    // ── Finishing ───────────────────────────────────────────────────

    /// Wraps this SELECT as a scalar subquery expression.
    ///
    /// # Errors
    ///
    /// Returns `ScalarProjection` unless exactly one column is projected.
    pub fn as_scalar(self) -> QuarryResult<Expr> {
        let count = self.query.columns.len();
        if count != 1 {
            return Err(QuarryError::ScalarProjection(count));
        }
        Ok(Expr::Subquery(Box::new(self.build())))
    }

    /// Returns the finished query tree.
    pub fn build(self) -> Query {
        common::log_built(&self.query);
        self.query
    }
}

impl From<Select<'_>> for Query {
    fn from(select: Select<'_>) -> Self {
        select.build()
    }
}

impl IntoExpr for Select<'_> {
    fn into_expr(self) -> Expr {
        Expr::Subquery(Box::new(self.build()))
    }
}
