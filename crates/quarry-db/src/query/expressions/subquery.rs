//! Quantified subqueries: `ALL`, `ANY`, and `EXISTS`.
//!
//! Plain subqueries need no wrapper: any [`Query`] (or finished
//! [`Select`](crate::query::builders::Select)) is itself an operand, so
//! `age.in_(select)` and `name.eq(select.as_scalar()?)` work directly.
//!
//! # Examples
//!
//! ```
//! use quarry_db::query::expressions::{exists, Expr, Quantifier};
//! use quarry_db::query::tree::{Query, StatementKind};
//! use quarry_db::model::TableDescriptor;
//! use std::sync::Arc;
//!
//! let inner = Query::new(StatementKind::Select, Arc::new(TableDescriptor::empty("comment")));
//! let expr = exists(inner);
//! assert!(matches!(expr, Expr::Quantified { quantifier: Quantifier::Exists, .. }));
//! ```

use super::core::{Expr, Quantifier};
use crate::query::tree::Query;

fn quantified(quantifier: Quantifier, query: impl Into<Query>) -> Expr {
    Expr::Quantified {
        quantifier,
        query: Box::new(query.into()),
    }
}

/// `ALL (subquery)`, for comparisons such as `x > ALL (...)`.
pub fn all(query: impl Into<Query>) -> Expr {
    quantified(Quantifier::All, query)
}

/// `ANY (subquery)`.
pub fn any(query: impl Into<Query>) -> Expr {
    quantified(Quantifier::Any, query)
}

/// `EXISTS (subquery)`.
pub fn exists(query: impl Into<Query>) -> Expr {
    quantified(Quantifier::Exists, query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TableDescriptor;
    use crate::query::expressions::BinaryOp;
    use crate::query::tree::StatementKind;
    use std::sync::Arc;

    fn inner() -> Query {
        Query::new(StatementKind::Select, Arc::new(TableDescriptor::empty("salary")))
    }

    #[test]
    fn test_quantifiers() {
        for (expr, q) in [
            (all(inner()), Quantifier::All),
            (any(inner()), Quantifier::Any),
            (exists(inner()), Quantifier::Exists),
        ] {
            match expr {
                Expr::Quantified { quantifier, query } => {
                    assert_eq!(quantifier, q);
                    assert_eq!(query.source.table().table_name(), "salary");
                }
                other => panic!("expected quantified subquery, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_compare_with_all() {
        let expr = Expr::column(Some("person"), "salary").gt(all(inner()));
        match expr {
            Expr::Binary { op, right, .. } => {
                assert_eq!(op, BinaryOp::Gt);
                assert!(matches!(*right, Expr::Quantified { quantifier: Quantifier::All, .. }));
            }
            other => panic!("expected comparison, got {other:?}"),
        }
    }

    #[test]
    fn test_query_is_an_operand() {
        let expr = Expr::column(Some("person"), "id").in_(inner());
        assert!(matches!(expr, Expr::Binary { op: BinaryOp::In, ref right, .. } if matches!(**right, Expr::Subquery(_))));
    }
}
