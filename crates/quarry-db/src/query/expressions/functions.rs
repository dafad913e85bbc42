//! Free functions composing expressions.
//!
//! Boolean combinators ([`and`], [`or`], [`not`]), CASE construction,
//! resolver-free column references ([`of`]), parameters, and `COUNT(*)`.

use quarry_core::{QuarryError, QuarryResult};

use super::core::{operand, Expr, IntoExpr, NaryOp, UnaryOp, When};
use crate::model::TableDescriptor;
use crate::value::Value;

fn combine<I>(op: NaryOp, operands: I) -> Expr
where
    I: IntoIterator,
    I::Item: IntoExpr,
{
    let mut flat = Vec::new();
    for expr in operands.into_iter().map(operand) {
        match expr {
            Expr::Nary { op: inner, operands } if inner == op => flat.extend(operands),
            other => flat.push(other),
        }
    }
    match flat.len() {
        0 => Expr::Constant(Value::Bool(op == NaryOp::And)),
        1 => flat.remove(0),
        _ => Expr::Nary { op, operands: flat },
    }
}

/// Boolean conjunction of all operands, in order.
///
/// Nested conjunctions are flattened, a single operand is returned as is,
/// and an empty input yields the constant `TRUE`.
///
/// ```
/// use quarry_db::query::expressions::{and, Expr, NaryOp};
///
/// let a = Expr::column(None, "a").eq(1);
/// let b = Expr::column(None, "b").eq(2);
/// let c = Expr::column(None, "c").eq(3);
/// let both = and([and([a.clone(), b.clone()]), c.clone()]);
/// assert_eq!(both, Expr::Nary { op: NaryOp::And, operands: vec![a, b, c] });
/// ```
pub fn and<I>(operands: I) -> Expr
where
    I: IntoIterator,
    I::Item: IntoExpr,
{
    combine(NaryOp::And, operands)
}

/// Boolean disjunction of all operands; an empty input yields `FALSE`.
pub fn or<I>(operands: I) -> Expr
where
    I: IntoIterator,
    I::Item: IntoExpr,
{
    combine(NaryOp::Or, operands)
}

/// Boolean negation.
pub fn not(condition: impl IntoExpr) -> Expr {
    Expr::Unary {
        op: UnaryOp::Not,
        operand: Box::new(operand(condition)),
    }
}

/// One arm of a CASE expression.
#[derive(Debug, Clone, PartialEq)]
pub enum CaseArm {
    /// `WHEN condition THEN then`.
    When {
        /// The branch condition.
        condition: Expr,
        /// The branch value.
        then: Expr,
    },
    /// `ELSE value`.
    Else(Expr),
}

/// Builds a `WHEN condition THEN then` arm.
pub fn when(condition: impl IntoExpr, then: impl IntoExpr) -> CaseArm {
    CaseArm::When {
        condition: operand(condition),
        then: operand(then),
    }
}

/// Builds an `ELSE value` arm.
pub fn otherwise(value: impl IntoExpr) -> CaseArm {
    CaseArm::Else(operand(value))
}

/// Builds a CASE expression.
///
/// # Errors
///
/// Returns `MalformedCase` if more than one ELSE arm is given, or if the
/// ELSE arm is not last.
///
/// ```
/// use quarry_db::query::expressions::{case_, otherwise, when, Expr};
///
/// let age = Expr::column(Some("person"), "age");
/// assert!(case_(vec![when(age.clone().lt(18), "minor"), otherwise("adult")]).is_ok());
/// assert!(case_(vec![otherwise("adult"), when(age.lt(18), "minor")]).is_err());
/// ```
pub fn case_(arms: Vec<CaseArm>) -> QuarryResult<Expr> {
    let else_count = arms.iter().filter(|a| matches!(a, CaseArm::Else(_))).count();
    if else_count > 1 {
        return Err(QuarryError::MalformedCase(format!(
            "only one ELSE arm is allowed, found {else_count}"
        )));
    }
    if else_count == 1 && !matches!(arms.last(), Some(CaseArm::Else(_))) {
        return Err(QuarryError::MalformedCase("ELSE must be the last arm".to_string()));
    }

    let mut whens = Vec::with_capacity(arms.len());
    let mut fallback = None;
    for arm in arms {
        match arm {
            CaseArm::When { condition, then } => whens.push(When { condition, then }),
            CaseArm::Else(value) => fallback = Some(Box::new(value)),
        }
    }
    Ok(Expr::Case {
        whens,
        otherwise: fallback,
    })
}

/// References a column without a live resolver.
///
/// With a table, `field` must be registered on it and the reference is
/// qualified with the table name. Without one, `field` names a previously
/// projected alias and the reference is unqualified.
///
/// # Errors
///
/// Returns `UnknownField` if `table` is given and has no such field.
pub fn of(table: Option<&TableDescriptor>, field: &str) -> QuarryResult<Expr> {
    match table {
        None => Ok(Expr::column(None, field)),
        Some(table) => {
            let descriptor = table.require_field(field)?;
            Ok(Expr::column(Some(table.table_name()), descriptor.column_name.clone()))
        }
    }
}

/// Like [`of`], but qualifies the column with `alias` instead of the table
/// name, for joined or derived tables referenced under an alias.
///
/// # Errors
///
/// Returns `UnknownField` if `table` has no such field.
pub fn of_alias(alias: &str, table: &TableDescriptor, field: &str) -> QuarryResult<Expr> {
    let descriptor = table.require_field(field)?;
    Ok(Expr::column(Some(alias), descriptor.column_name.clone()))
}

/// An unnamed bound parameter.
pub fn param(value: impl Into<Value>) -> Expr {
    Expr::Param(value.into())
}

/// A named bound parameter, optionally carrying its value.
pub fn named_param(name: impl Into<String>, value: Option<Value>) -> Expr {
    Expr::NamedParam {
        name: name.into(),
        value,
    }
}

/// A literal rendered inline rather than bound.
pub fn constant(value: impl Into<Value>) -> Expr {
    Expr::Constant(value.into())
}

/// `COUNT(*)`.
pub fn count_all() -> Expr {
    Expr::func("COUNT", vec![Expr::Star])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::FieldDescriptor;
    use crate::model::TableBuilder;
    use pretty_assertions::assert_eq;

    fn col(name: &str) -> Expr {
        Expr::column(Some("t"), name)
    }

    #[test]
    fn test_and_single_operand_unwrapped() {
        let a = col("a").eq(1);
        assert_eq!(and([a.clone()]), a);
    }

    #[test]
    fn test_and_empty_is_true() {
        assert_eq!(and(Vec::<Expr>::new()), Expr::Constant(Value::Bool(true)));
        assert_eq!(or(Vec::<Expr>::new()), Expr::Constant(Value::Bool(false)));
    }

    #[test]
    fn test_or_does_not_flatten_and() {
        let inner = and([col("a").eq(1), col("b").eq(2)]);
        let expr = or([inner.clone(), col("c").eq(3)]);
        match expr {
            Expr::Nary { op, operands } => {
                assert_eq!(op, NaryOp::Or);
                assert_eq!(operands[0], inner);
            }
            other => panic!("expected OR, got {other:?}"),
        }
    }

    #[test]
    fn test_not() {
        let expr = not(col("a").eq(1));
        assert!(matches!(expr, Expr::Unary { op: UnaryOp::Not, .. }));
        assert_eq!(!col("a").eq(1), expr);
    }

    #[test]
    fn test_case_single_else_last_succeeds() {
        let expr = case_(vec![when(col("a").eq(1), "one"), otherwise("many")]).unwrap();
        match expr {
            Expr::Case { whens, otherwise } => {
                assert_eq!(whens.len(), 1);
                assert_eq!(otherwise, Some(Box::new(Expr::Param(Value::from("many")))));
            }
            other => panic!("expected CASE, got {other:?}"),
        }
    }

    #[test]
    fn test_case_two_else_fails() {
        let err = case_(vec![when(true, 1), otherwise(2), otherwise(3)]).unwrap_err();
        assert!(matches!(err, QuarryError::MalformedCase(_)));
    }

    #[test]
    fn test_case_else_not_last_fails() {
        let err = case_(vec![otherwise(2), when(true, 1)]).unwrap_err();
        assert!(err.to_string().contains("last"));
    }

    #[test]
    fn test_case_without_else() {
        let expr = case_(vec![when(true, 1)]).unwrap();
        assert!(matches!(expr, Expr::Case { otherwise: None, .. }));
    }

    #[test]
    fn test_of_with_and_without_table() {
        let table = TableBuilder::new()
            .field("email", FieldDescriptor::new().column("email_address"))
            .build("person")
            .unwrap();
        assert_eq!(
            of(Some(&table), "email").unwrap(),
            Expr::column(Some("person"), "email_address")
        );
        assert!(of(Some(&table), "missing").is_err());
        assert_eq!(of(None, "total").unwrap(), Expr::column(None, "total"));
    }

    #[test]
    fn test_of_alias_qualifies_with_alias() {
        let table = TableBuilder::new()
            .field("email", FieldDescriptor::new().column("email_address"))
            .build("person")
            .unwrap();
        assert_eq!(
            of_alias("author", &table, "email").unwrap(),
            Expr::column(Some("author"), "email_address")
        );
        assert!(matches!(
            of_alias("author", &table, "missing"),
            Err(QuarryError::UnknownField { .. })
        ));
    }

    #[test]
    fn test_parameters() {
        assert_eq!(param(5), Expr::Param(Value::Int(5)));
        assert_eq!(constant(Value::Null), Expr::Constant(Value::Null));
        assert_eq!(
            named_param("min_age", None),
            Expr::NamedParam { name: "min_age".into(), value: None }
        );
        assert_eq!(count_all(), Expr::func("COUNT", vec![Expr::Star]));
    }
}
