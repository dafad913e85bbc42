//! The query tree.
//!
//! A [`Query`] is the backend-agnostic representation of one statement. The
//! builders in [`builders`](crate::query::builders) accumulate clauses into
//! it in call order; the external compiler renders it in tree order.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use super::expressions::{and, Expr, OrderTerm};
use crate::model::TableDescriptor;

/// The kind of statement a query represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    /// SELECT.
    Select,
    /// INSERT.
    Insert,
    /// INSERT ... ON CONFLICT.
    Upsert,
    /// UPDATE.
    Update,
    /// DELETE.
    Delete,
}

impl StatementKind {
    /// Returns the lower-case name, as used in log fields.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Select => "select",
            Self::Insert => "insert",
            Self::Upsert => "upsert",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a statement reads from or writes to.
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    /// A registered table, optionally aliased.
    Table {
        /// The table metadata.
        table: Arc<TableDescriptor>,
        /// The alias the table is referenced under.
        alias: Option<String>,
    },
    /// A nested SELECT used as a derived table.
    Derived {
        /// The inner query.
        query: Box<Query>,
        /// Synthetic metadata exposing the inner projection's names.
        table: Arc<TableDescriptor>,
        /// The alias the derived table is referenced under.
        alias: String,
    },
}

impl Source {
    /// Returns the table metadata (synthetic for derived tables).
    pub fn table(&self) -> &Arc<TableDescriptor> {
        match self {
            Self::Table { table, .. } | Self::Derived { table, .. } => table,
        }
    }

    /// Returns the alias, if any.
    pub fn alias(&self) -> Option<&str> {
        match self {
            Self::Table { alias, .. } => alias.as_deref(),
            Self::Derived { alias, .. } => Some(alias),
        }
    }

    /// Returns the name columns of this source are qualified with.
    pub fn qualifier(&self) -> &str {
        self.alias().unwrap_or_else(|| self.table().table_name())
    }
}

/// The type of a SQL JOIN.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    /// INNER JOIN.
    Inner,
    /// LEFT JOIN.
    Left,
    /// RIGHT JOIN.
    Right,
    /// FULL OUTER JOIN.
    Full,
}

impl JoinKind {
    /// Returns the SQL keyword for this join kind.
    pub const fn sql_keyword(self) -> &'static str {
        match self {
            Self::Inner => "INNER",
            Self::Left => "LEFT",
            Self::Right => "RIGHT",
            Self::Full => "FULL OUTER",
        }
    }
}

/// A JOIN clause.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    /// The join type.
    pub kind: JoinKind,
    /// The joined table.
    pub table: Arc<TableDescriptor>,
    /// The alias the joined table is referenced under.
    pub alias: Option<String>,
    /// The ON condition.
    pub on: Expr,
}

/// A set operator combining two SELECTs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOperator {
    /// UNION.
    Union,
    /// INTERSECT.
    Intersect,
    /// EXCEPT.
    Except,
}

impl SetOperator {
    /// Returns the SQL keyword.
    pub const fn sql_keyword(self) -> &'static str {
        match self {
            Self::Union => "UNION",
            Self::Intersect => "INTERSECT",
            Self::Except => "EXCEPT",
        }
    }
}

/// One set-operator entry, appended in call order.
#[derive(Debug, Clone, PartialEq)]
pub struct SetOperation {
    /// The operator.
    pub op: SetOperator,
    /// Whether DISTINCT was requested.
    pub distinct: bool,
    /// The right-hand SELECT, captured as is.
    pub query: Box<Query>,
}

/// What an upsert does when the conflict target matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConflictAction {
    /// DO UPDATE SET the inserted values.
    #[default]
    Update,
    /// DO NOTHING.
    Nothing,
}

/// The ON CONFLICT clause of an upsert.
#[derive(Debug, Clone, PartialEq)]
pub struct ConflictSpec {
    /// The conflict target columns.
    pub columns: Vec<String>,
    /// The partial-index predicate, if the target index has one.
    pub condition: Option<Expr>,
    /// The conflict action.
    pub action: ConflictAction,
}

/// Row-locking clause of a SELECT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    /// FOR UPDATE.
    Update,
    /// FOR NO KEY UPDATE.
    NoKeyUpdate,
    /// FOR SHARE.
    Share,
    /// FOR KEY SHARE.
    KeyShare,
}

impl LockMode {
    /// Returns the SQL clause.
    pub const fn sql_clause(self) -> &'static str {
        match self {
            Self::Update => "FOR UPDATE",
            Self::NoKeyUpdate => "FOR NO KEY UPDATE",
            Self::Share => "FOR SHARE",
            Self::KeyShare => "FOR KEY SHARE",
        }
    }
}

/// One statement's query tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// The statement kind.
    pub kind: StatementKind,
    /// The target table or derived table.
    pub source: Source,
    /// The projection (SELECT) or returned columns (DML).
    pub columns: Vec<Expr>,
    /// SELECT DISTINCT.
    pub distinct: bool,
    /// JOIN clauses, in call order.
    pub joins: Vec<Join>,
    /// WHERE predicates; conjunctive, in call order.
    pub predicates: Vec<Expr>,
    /// GROUP BY expressions.
    pub group_by: Vec<Expr>,
    /// HAVING predicates; conjunctive, in call order.
    pub having: Vec<Expr>,
    /// ORDER BY terms.
    pub order_by: Vec<OrderTerm>,
    /// LIMIT.
    pub limit: Option<u64>,
    /// OFFSET.
    pub offset: Option<u64>,
    /// Row locking.
    pub lock: Option<LockMode>,
    /// ON CONFLICT clause (upsert only).
    pub conflict: Option<ConflictSpec>,
    /// Column assignments (insert, upsert, update), keyed by column name.
    pub values: IndexMap<String, Expr>,
    /// Set operators, in call order.
    pub set_operations: Vec<SetOperation>,
}

impl Query {
    /// Creates an empty query over a table.
    pub fn new(kind: StatementKind, table: Arc<TableDescriptor>) -> Self {
        Self::with_source(kind, Source::Table { table, alias: None })
    }

    /// Creates an empty query over any source.
    pub fn with_source(kind: StatementKind, source: Source) -> Self {
        Self {
            kind,
            source,
            columns: Vec::new(),
            distinct: false,
            joins: Vec::new(),
            predicates: Vec::new(),
            group_by: Vec::new(),
            having: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
            lock: None,
            conflict: None,
            values: IndexMap::new(),
            set_operations: Vec::new(),
        }
    }

    /// Returns the table metadata of the source.
    pub fn table(&self) -> &Arc<TableDescriptor> {
        self.source.table()
    }

    /// Returns the WHERE clause as a single conjunction.
    pub fn predicate(&self) -> Option<Expr> {
        (!self.predicates.is_empty()).then(|| and(self.predicates.iter().cloned()))
    }

    /// Returns the HAVING clause as a single conjunction.
    pub fn having_predicate(&self) -> Option<Expr> {
        (!self.having.is_empty()).then(|| and(self.having.iter().cloned()))
    }

    /// Returns the names the projection exposes: aliases, or column names
    /// for plain columns. Unnamed expressions are skipped.
    pub fn output_names(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter_map(Expr::output_name)
            .map(str::to_string)
            .collect()
    }
}
