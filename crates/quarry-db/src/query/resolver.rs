//! The field resolver.
//!
//! A [`Resolver`] turns model property names into column expressions for
//! one table under one qualifier. Builders hand a resolver to every
//! callback, so callback code names properties and the library substitutes
//! the correctly qualified columns:
//!
//! ```
//! use std::sync::Arc;
//! use quarry_db::fields::FieldDescriptor;
//! use quarry_db::model::TableBuilder;
//! use quarry_db::query::expressions::Expr;
//! use quarry_db::query::resolver::Resolver;
//!
//! let person = Arc::new(
//!     TableBuilder::new()
//!         .field("id", FieldDescriptor::new().primary_key())
//!         .field("age", FieldDescriptor::new())
//!         .build("person")
//!         .unwrap(),
//! );
//! let p = Resolver::new(Arc::clone(&person)).with_alias("p");
//! assert_eq!(p.field("age").unwrap(), Expr::column(Some("p"), "age"));
//! assert!(p.field("salary").is_err());
//! ```
//!
//! A new resolver is created per alias, since qualification depends on it.

use std::sync::Arc;

use quarry_core::{QuarryError, QuarryResult};

use super::expressions::Expr;
use super::tree::{Query, StatementKind};
use crate::fields::FieldDescriptor;
use crate::model::TableDescriptor;

/// Alias-aware property lookup for one table.
#[derive(Debug, Clone)]
pub struct Resolver {
    table: Arc<TableDescriptor>,
    alias: Option<String>,
    qualify: bool,
}

impl Resolver {
    /// Creates a resolver qualifying columns with the table name.
    pub fn new(table: Arc<TableDescriptor>) -> Self {
        Self {
            table,
            alias: None,
            qualify: true,
        }
    }

    /// Qualifies columns with `alias` instead of the table name.
    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Leaves plain columns unqualified.
    ///
    /// Virtual fields still correlate on the qualified primary key.
    #[must_use]
    pub fn unqualified(mut self) -> Self {
        self.qualify = false;
        self
    }

    /// Returns the table metadata.
    pub fn table(&self) -> &Arc<TableDescriptor> {
        &self.table
    }

    /// Returns the name this table is referenced under.
    pub fn qualifier(&self) -> &str {
        self.alias.as_deref().unwrap_or_else(|| self.table.table_name())
    }

    fn column_ref(&self, field: &FieldDescriptor) -> Expr {
        let table = self.qualify.then(|| self.qualifier());
        Expr::column(table, field.column_name.clone())
    }

    /// Resolves a property into an expression.
    ///
    /// Plain columns come back qualified and piped through the field kind's
    /// `read_query`. Related fields become a correlated subquery over the
    /// related table; subquery-backed fields invoke their builder with the
    /// owning primary key.
    ///
    /// # Errors
    ///
    /// Returns `UnknownField` for unregistered names, `InvalidQuery` when a
    /// virtual field is resolved on a table without a single-column primary
    /// key, or any error from a subquery builder.
    pub fn field(&self, name: &str) -> QuarryResult<Expr> {
        let field = self.table.require_field(name)?;

        if let Some(related) = &field.related_to {
            let pk = self.primary_key_for(name)?;
            let related_table = Arc::new(TableDescriptor::empty(related.table_name.clone()));
            let mut query = Query::new(StatementKind::Select, related_table);
            query.columns = vec![Expr::column(
                Some(related.table_name.as_str()),
                field.column_name.clone(),
            )];
            query.predicates = vec![
                Expr::column(Some(related.table_name.as_str()), related.key_field.clone()).eq(pk),
            ];
            return Ok(Expr::Subquery(Box::new(query)));
        }

        if let Some(builder) = &field.subquery_builder {
            let pk = self.primary_key_for(name)?;
            return Ok(Expr::Subquery(Box::new(builder(pk)?)));
        }

        let column = self.column_ref(field);
        match &field.kind {
            Some(kind) => {
                let read = kind.read_query(column.clone());
                if read == column {
                    Ok(column)
                } else {
                    Ok(read.alias(field.column_name.clone()))
                }
            }
            None => Ok(column),
        }
    }

    /// Resolves a property into a bare column reference, without read
    /// transforms. Used for grouping and ordering by name.
    ///
    /// # Errors
    ///
    /// Returns `UnknownField` for unregistered names and `VirtualField` for
    /// filter-only fields.
    pub fn column(&self, name: &str) -> QuarryResult<Expr> {
        let field = self.real_field(name)?;
        Ok(self.column_ref(field))
    }

    /// Returns a registered, non-virtual field.
    ///
    /// # Errors
    ///
    /// Returns `UnknownField` or `VirtualField`.
    pub fn real_field(&self, name: &str) -> QuarryResult<&FieldDescriptor> {
        let field = self.table.require_field(name)?;
        if field.is_virtual() {
            return Err(QuarryError::VirtualField {
                table: self.table.table_name().to_string(),
                field: name.to_string(),
            });
        }
        Ok(field)
    }

    /// Returns the single primary-key column, qualified.
    ///
    /// # Errors
    ///
    /// Returns `InvalidQuery` if the table has no single-column primary key.
    pub fn primary_key(&self) -> QuarryResult<Expr> {
        self.primary_key_for("<primary key>")
    }

    fn primary_key_for(&self, requested_by: &str) -> QuarryResult<Expr> {
        let pk = self
            .table
            .primary_key_field()
            .and_then(|name| self.table.field(name))
            .ok_or_else(|| {
                QuarryError::InvalidQuery(format!(
                    "field '{requested_by}' on table '{}' requires a single-column primary key",
                    self.table.table_name()
                ))
            })?;
        Ok(Expr::column(Some(self.qualifier()), pk.column_name.clone()))
    }
}
