//! Clause helpers shared by every statement builder.
//!
//! The builders differ in which clauses they expose, but resolve names,
//! assign values, and log the finished statement the same way.

use quarry_core::logging::statement_span;
use quarry_core::{QuarryError, QuarryResult, VirtualValuesPolicy, SETTINGS};

use crate::model::{Model, TableDescriptor};
use crate::query::expressions::{and, Expr, IntoExpr, OrderTarget, OrderTerm};
use crate::query::resolver::Resolver;
use crate::query::tree::Query;
use crate::value::Value;

/// How a builder treats the values it is given.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ValuesMode {
    pub policy: VirtualValuesPolicy,
    pub reject_read_only: bool,
}

impl ValuesMode {
    pub(crate) fn insert() -> Self {
        Self {
            policy: SETTINGS.get().virtual_values,
            reject_read_only: false,
        }
    }

    pub(crate) fn update() -> Self {
        Self {
            reject_read_only: true,
            ..Self::insert()
        }
    }
}

/// The readable columns of a table: every non-virtual field, resolved with
/// its read transform.
pub(crate) fn default_columns(resolver: &Resolver) -> QuarryResult<Vec<Expr>> {
    let table = resolver.table();
    table
        .column_fields()
        .map(|(name, _)| resolver.field(name))
        .collect()
}

/// ANDs `field = value` for every pair.
pub(crate) fn equality_predicate<I, K, V>(resolver: &Resolver, pairs: I) -> QuarryResult<Expr>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: IntoExpr,
{
    let terms = pairs
        .into_iter()
        .map(|(name, value)| Ok(resolver.field(name.as_ref())?.eq(value)))
        .collect::<QuarryResult<Vec<_>>>()?;
    Ok(and(terms))
}

/// Resolves projection names; virtual fields cannot be projected.
pub(crate) fn named_columns<I, S>(resolver: &Resolver, names: I) -> QuarryResult<Vec<Expr>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .map(|name| {
            let name = name.as_ref();
            resolver.real_field(name)?;
            resolver.field(name)
        })
        .collect()
}

/// Resolves grouping targets: names become bare columns, ordinals stay
/// positional.
pub(crate) fn group_targets<I, T>(resolver: &Resolver, targets: I) -> QuarryResult<Vec<Expr>>
where
    I: IntoIterator<Item = T>,
    T: Into<OrderTarget>,
{
    targets
        .into_iter()
        .map(|target| match target.into() {
            OrderTarget::Field(name) => resolver.column(&name),
            OrderTarget::Ordinal(n) => Ok(Expr::Constant(Value::Int(ordinal(n)?))),
            OrderTarget::Expr(expr) => Ok(expr),
        })
        .collect()
}

/// Resolves `Field` targets of ordering terms into bare columns and checks
/// ordinals.
pub(crate) fn order_terms<I, T>(resolver: &Resolver, terms: I) -> QuarryResult<Vec<OrderTerm>>
where
    I: IntoIterator<Item = T>,
    T: Into<OrderTerm>,
{
    terms
        .into_iter()
        .map(|term| {
            let mut term = term.into();
            match &term.target {
                OrderTarget::Field(name) => {
                    term.target = OrderTarget::Expr(resolver.column(name)?);
                }
                OrderTarget::Ordinal(n) => {
                    ordinal(*n)?;
                }
                OrderTarget::Expr(_) => {}
            }
            Ok(term)
        })
        .collect()
}

/// Ordinals are 1-based.
fn ordinal(n: usize) -> QuarryResult<i64> {
    if n == 0 {
        return Err(QuarryError::InvalidQuery("ordinals start at 1".to_string()));
    }
    i64::try_from(n).map_err(|_| QuarryError::InvalidQuery(format!("ordinal {n} is out of range")))
}

/// Assigns column values.
///
/// Bound parameters go through the field's `writer` and `write_query`;
/// any other expression is assigned with its display alias stripped. Assignments are keyed by column
/// name, so a repeated property overwrites its earlier value.
pub(crate) fn assign_values<I, K, V>(
    resolver: &Resolver,
    query: &mut Query,
    mode: ValuesMode,
    pairs: I,
) -> QuarryResult<()>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: IntoExpr,
{
    let table = resolver.table();
    for (name, value) in pairs {
        let name = name.as_ref();
        let field = table.require_field(name)?;

        if field.is_virtual() {
            match mode.policy {
                VirtualValuesPolicy::Reject => {
                    return Err(QuarryError::VirtualField {
                        table: table.table_name().to_string(),
                        field: name.to_string(),
                    });
                }
                VirtualValuesPolicy::Skip => {
                    tracing::warn!(
                        table = table.table_name(),
                        field = name,
                        "skipping value for filter-only field"
                    );
                    continue;
                }
            }
        }

        if mode.reject_read_only && field.is_read_only {
            return Err(QuarryError::ReadOnlyField {
                table: table.table_name().to_string(),
                field: name.to_string(),
            });
        }

        let expr = match value.into_expr() {
            Expr::Param(raw) => field.write_value(raw)?,
            other => other.unaliased(),
        };
        query.values.insert(field.column_name.clone(), expr);
    }
    Ok(())
}

/// The assignable cells of a model instance.
///
/// Auto-increment fields holding NULL are left to the database.
pub(crate) fn model_values<M: Model>(table: &TableDescriptor, model: &M) -> Vec<(String, Value)> {
    model
        .to_record()
        .into_iter()
        .filter(|(name, value)| {
            !(value.is_null() && table.field(name).is_some_and(|f| f.is_auto_increment))
        })
        .collect()
}

/// Logs a finished statement inside its span.
pub(crate) fn log_built(query: &Query) {
    let span = statement_span(query.kind.as_str(), query.table().table_name());
    let _guard = span.enter();
    tracing::debug!(
        columns = query.columns.len(),
        predicates = query.predicates.len(),
        values = query.values.len(),
        "built statement"
    );
}
