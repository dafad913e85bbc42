//! ORDER BY terms.
//!
//! An [`OrderTerm`] pairs a target (an expression, a property name still to
//! be resolved, or a 1-based projection ordinal) with an optional direction
//! and NULLS placement. Builders resolve [`OrderTarget::Field`] targets
//! before storing terms, so a finished query only ever holds expressions
//! and ordinals.

use super::core::Expr;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// ASC.
    Asc,
    /// DESC.
    Desc,
}

impl Direction {
    /// Returns the SQL keyword.
    pub const fn sql_keyword(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// NULLS placement hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullsOrder {
    /// NULLS FIRST.
    First,
    /// NULLS LAST.
    Last,
}

impl NullsOrder {
    /// Returns the SQL clause.
    pub const fn sql_keyword(self) -> &'static str {
        match self {
            Self::First => "NULLS FIRST",
            Self::Last => "NULLS LAST",
        }
    }
}

/// What an ORDER BY term sorts on.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderTarget {
    /// A resolved expression.
    Expr(Expr),
    /// A property name, resolved by the builder.
    Field(String),
    /// A 1-based position in the projection.
    Ordinal(usize),
}

impl From<Expr> for OrderTarget {
    fn from(expr: Expr) -> Self {
        Self::Expr(expr.unaliased())
    }
}

impl From<&str> for OrderTarget {
    fn from(name: &str) -> Self {
        Self::Field(name.to_string())
    }
}

impl From<String> for OrderTarget {
    fn from(name: String) -> Self {
        Self::Field(name)
    }
}

impl From<usize> for OrderTarget {
    fn from(ordinal: usize) -> Self {
        Self::Ordinal(ordinal)
    }
}

/// A single ORDER BY term.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderTerm {
    /// The sort target.
    pub target: OrderTarget,
    /// The direction; `None` leaves it to the database default.
    pub direction: Option<Direction>,
    /// The NULLS placement.
    pub nulls: Option<NullsOrder>,
}

impl OrderTerm {
    /// Creates a term without direction.
    pub fn new(target: impl Into<OrderTarget>) -> Self {
        Self {
            target: target.into(),
            direction: None,
            nulls: None,
        }
    }

    /// Places NULLs first.
    #[must_use]
    pub const fn nulls_first(mut self) -> Self {
        self.nulls = Some(NullsOrder::First);
        self
    }

    /// Places NULLs last.
    #[must_use]
    pub const fn nulls_last(mut self) -> Self {
        self.nulls = Some(NullsOrder::Last);
        self
    }
}

macro_rules! order_term_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for OrderTerm {
                fn from(target: $ty) -> Self {
                    Self::new(target)
                }
            }
        )*
    };
}

order_term_from!(Expr, &str, String, usize);

/// Ascending order on an expression, property name, or ordinal.
///
/// ```
/// use quarry_db::query::expressions::{asc, Direction, OrderTarget};
///
/// let term = asc("name").nulls_last();
/// assert_eq!(term.target, OrderTarget::Field("name".into()));
/// assert_eq!(term.direction, Some(Direction::Asc));
/// ```
pub fn asc(target: impl Into<OrderTarget>) -> OrderTerm {
    OrderTerm {
        direction: Some(Direction::Asc),
        ..OrderTerm::new(target)
    }
}

/// Descending order on an expression, property name, or ordinal.
pub fn desc(target: impl Into<OrderTarget>) -> OrderTerm {
    OrderTerm {
        direction: Some(Direction::Desc),
        ..OrderTerm::new(target)
    }
}

impl Expr {
    /// Ascending order on this expression.
    pub fn asc(self) -> OrderTerm {
        asc(self)
    }

    /// Descending order on this expression.
    pub fn desc(self) -> OrderTerm {
        desc(self)
    }

    /// Ascending order on the `n`-th projected column (1-based).
    pub fn asc_ordinal(n: usize) -> OrderTerm {
        asc(n)
    }

    /// Descending order on the `n`-th projected column (1-based).
    pub fn desc_ordinal(n: usize) -> OrderTerm {
        desc(n)
    }

    /// This expression in its natural order with NULLs first.
    pub fn nulls_first(self) -> OrderTerm {
        OrderTerm::new(self).nulls_first()
    }

    /// This expression in its natural order with NULLs last.
    pub fn nulls_last(self) -> OrderTerm {
        OrderTerm::new(self).nulls_last()
    }
}
