//! The expression tree and its operator vocabulary.
//!
//! [`Expr`] is a closed enum covering every node the compiler has to
//! understand. Expressions are built from resolved columns (see
//! [`Resolver`](crate::query::resolver::Resolver)) and combined with the
//! methods defined here, which accept any operand implementing
//! [`IntoExpr`]: other expressions, [`Value`]s, Rust primitives, `Option`s,
//! lists, and subqueries.
//!
//! # Examples
//!
//! ```
//! use quarry_db::query::expressions::{BinaryOp, Expr};
//! use quarry_db::value::Value;
//!
//! let age = Expr::column(Some("person"), "age");
//! let adult = age.clone().gte(18);
//! assert!(matches!(adult, Expr::Binary { op: BinaryOp::Gte, .. }));
//!
//! // NULL comparisons never use `=`.
//! let missing = age.eq(Option::<i64>::None);
//! assert!(matches!(missing, Expr::Binary { op: BinaryOp::Is, .. }));
//! ```

use std::ops;

use quarry_core::{QuarryError, QuarryResult};

use super::window::{WindowCall, WindowDescriptor, WindowFunction};
use crate::query::tree::Query;
use crate::value::Value;

/// A reference to a column, optionally qualified by a table name or alias.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    /// The qualifying table name or alias; `None` for unqualified columns.
    pub table: Option<String>,
    /// The column name.
    pub name: String,
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Boolean NOT.
    Not,
    /// Arithmetic negation.
    Neg,
}

impl UnaryOp {
    /// Returns the SQL operator.
    pub const fn sql_operator(self) -> &'static str {
        match self {
            Self::Not => "NOT",
            Self::Neg => "-",
        }
    }
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `=`.
    Eq,
    /// `<>`.
    Neq,
    /// `IS`, only ever paired with NULL.
    Is,
    /// `IS NOT`, only ever paired with NULL.
    IsNot,
    /// `>`.
    Gt,
    /// `>=`.
    Gte,
    /// `<`.
    Lt,
    /// `<=`.
    Lte,
    /// `IN`.
    In,
    /// `NOT IN`.
    NotIn,
    /// `LIKE`.
    Like,
    /// `NOT LIKE`.
    NotLike,
    /// `+`.
    Add,
    /// `-`.
    Sub,
    /// `*`.
    Mul,
    /// `/`.
    Div,
    /// `%`.
    Mod,
    /// Bitwise `&`.
    BitAnd,
    /// Bitwise `|`.
    BitOr,
    /// Bitwise `^`.
    BitXor,
}

impl BinaryOp {
    /// Returns the SQL operator.
    pub const fn sql_operator(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Neq => "<>",
            Self::Is => "IS",
            Self::IsNot => "IS NOT",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::In => "IN",
            Self::NotIn => "NOT IN",
            Self::Like => "LIKE",
            Self::NotLike => "NOT LIKE",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::BitAnd => "&",
            Self::BitOr => "|",
            Self::BitXor => "^",
        }
    }

    /// Returns `true` for operators yielding a boolean.
    pub const fn is_comparison(self) -> bool {
        !matches!(
            self,
            Self::Add | Self::Sub | Self::Mul | Self::Div | Self::Mod | Self::BitAnd | Self::BitOr | Self::BitXor
        )
    }
}

/// Ternary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TernaryOp {
    /// `a BETWEEN b AND c`.
    Between,
}

/// Operators joining any number of boolean operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NaryOp {
    /// Conjunction.
    And,
    /// Disjunction.
    Or,
}

impl NaryOp {
    /// Returns the SQL keyword.
    pub const fn sql_keyword(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

/// Subquery quantifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantifier {
    /// `ALL (subquery)`.
    All,
    /// `ANY (subquery)`.
    Any,
    /// `EXISTS (subquery)`.
    Exists,
}

/// A single WHEN/THEN branch of a CASE expression.
#[derive(Debug, Clone, PartialEq)]
pub struct When {
    /// The branch condition.
    pub condition: Expr,
    /// The value when the condition holds.
    pub then: Expr,
}

/// A backend-agnostic expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A column reference.
    Column(ColumnRef),
    /// A literal rendered inline (e.g. `NULL`).
    Constant(Value),
    /// An unnamed bound parameter.
    Param(Value),
    /// A named bound parameter; the value may be supplied at execution time.
    NamedParam {
        /// The parameter name.
        name: String,
        /// The value, if already known.
        value: Option<Value>,
    },
    /// `*`, as in `COUNT(*)`.
    Star,
    /// A parenthesized list, as in `IN (1, 2, 3)`.
    List(Vec<Expr>),
    /// A unary operation.
    Unary {
        /// The operator.
        op: UnaryOp,
        /// The operand.
        operand: Box<Expr>,
    },
    /// A binary operation.
    Binary {
        /// The operator.
        op: BinaryOp,
        /// The left operand.
        left: Box<Expr>,
        /// The right operand.
        right: Box<Expr>,
    },
    /// A ternary operation.
    Ternary {
        /// The operator.
        op: TernaryOp,
        /// The tested operand.
        first: Box<Expr>,
        /// The lower bound.
        second: Box<Expr>,
        /// The upper bound.
        third: Box<Expr>,
    },
    /// A boolean combination of any number of operands.
    Nary {
        /// The operator.
        op: NaryOp,
        /// The operands, in call order.
        operands: Vec<Expr>,
    },
    /// A function or aggregate call.
    Function {
        /// Function name (e.g. `"MAX"`).
        name: String,
        /// Arguments.
        args: Vec<Expr>,
        /// Whether `DISTINCT` precedes the arguments.
        distinct: bool,
    },
    /// `CAST(expr AS type)`.
    Cast {
        /// The expression to cast.
        expr: Box<Expr>,
        /// The target type name.
        type_name: String,
    },
    /// `CASE WHEN ... THEN ... ELSE ... END`.
    Case {
        /// The WHEN/THEN branches.
        whens: Vec<When>,
        /// The ELSE value.
        otherwise: Option<Box<Expr>>,
    },
    /// A window function call.
    Window(Box<WindowCall>),
    /// A display-name wrapper.
    Alias {
        /// The wrapped expression.
        expr: Box<Expr>,
        /// The display name.
        alias: String,
    },
    /// A subquery used as an expression.
    Subquery(Box<Query>),
    /// A quantified subquery.
    Quantified {
        /// The quantifier.
        quantifier: Quantifier,
        /// The subquery.
        query: Box<Query>,
    },
}

impl Expr {
    /// Creates a column reference.
    pub fn column(table: Option<&str>, name: impl Into<String>) -> Self {
        Self::Column(ColumnRef {
            table: table.map(str::to_string),
            name: name.into(),
        })
    }

    /// Creates a function call.
    pub fn func(name: impl Into<String>, args: Vec<Self>) -> Self {
        Self::Function {
            name: name.into(),
            args,
            distinct: false,
        }
    }

    /// Strips any alias wrappers.
    pub fn unaliased(self) -> Self {
        let mut expr = self;
        while let Self::Alias { expr: inner, .. } = expr {
            expr = *inner;
        }
        expr
    }

    /// Returns the name this expression is projected under: the alias, or
    /// the column name for plain columns.
    pub fn output_name(&self) -> Option<&str> {
        match self {
            Self::Alias { alias, .. } => Some(alias),
            Self::Column(col) => Some(&col.name),
            _ => None,
        }
    }

    /// Returns `true` for the NULL literal in either of its forms.
    pub const fn is_null_literal(&self) -> bool {
        matches!(self, Self::Constant(Value::Null) | Self::Param(Value::Null))
    }

    fn binary(self, op: BinaryOp, rhs: impl IntoExpr) -> Self {
        Self::Binary {
            op,
            left: Box::new(self.unaliased()),
            right: Box::new(operand(rhs)),
        }
    }

    fn unary(self, op: UnaryOp) -> Self {
        Self::Unary {
            op,
            operand: Box::new(self.unaliased()),
        }
    }

    fn aggregate(self, name: &str, distinct: bool) -> Self {
        Self::Function {
            name: name.to_string(),
            args: vec![self.unaliased()],
            distinct,
        }
    }

    // ── Comparison ──────────────────────────────────────────────────

    /// `self = rhs`, or `self IS NULL` when `rhs` is null.
    #[allow(clippy::should_implement_trait)]
    pub fn eq(self, rhs: impl IntoExpr) -> Self {
        let rhs = operand(rhs);
        if rhs.is_null_literal() {
            self.binary(BinaryOp::Is, Self::Constant(Value::Null))
        } else {
            self.binary(BinaryOp::Eq, rhs)
        }
    }

    /// `self <> rhs`, or `self IS NOT NULL` when `rhs` is null.
    pub fn neq(self, rhs: impl IntoExpr) -> Self {
        let rhs = operand(rhs);
        if rhs.is_null_literal() {
            self.binary(BinaryOp::IsNot, Self::Constant(Value::Null))
        } else {
            self.binary(BinaryOp::Neq, rhs)
        }
    }

    /// `self > rhs`.
    pub fn gt(self, rhs: impl IntoExpr) -> Self {
        self.binary(BinaryOp::Gt, rhs)
    }

    /// `self >= rhs`.
    pub fn gte(self, rhs: impl IntoExpr) -> Self {
        self.binary(BinaryOp::Gte, rhs)
    }

    /// `self < rhs`.
    pub fn lt(self, rhs: impl IntoExpr) -> Self {
        self.binary(BinaryOp::Lt, rhs)
    }

    /// `self <= rhs`.
    pub fn lte(self, rhs: impl IntoExpr) -> Self {
        self.binary(BinaryOp::Lte, rhs)
    }

    /// `self BETWEEN low AND high`.
    pub fn between(self, low: impl IntoExpr, high: impl IntoExpr) -> Self {
        Self::Ternary {
            op: TernaryOp::Between,
            first: Box::new(self.unaliased()),
            second: Box::new(operand(low)),
            third: Box::new(operand(high)),
        }
    }

    /// `self IN rhs`, where `rhs` is a list or a subquery.
    pub fn in_(self, rhs: impl IntoExpr) -> Self {
        self.binary(BinaryOp::In, rhs)
    }

    /// `self NOT IN rhs`.
    pub fn not_in(self, rhs: impl IntoExpr) -> Self {
        self.binary(BinaryOp::NotIn, rhs)
    }

    /// `value IN self`: the mirror of [`in_`](Self::in_) for collections.
    pub fn has(self, value: impl IntoExpr) -> Self {
        operand(value).in_(self)
    }

    /// `self LIKE pattern`.
    pub fn like(self, pattern: impl IntoExpr) -> Self {
        self.binary(BinaryOp::Like, pattern)
    }

    /// `self NOT LIKE pattern`.
    pub fn not_like(self, pattern: impl IntoExpr) -> Self {
        self.binary(BinaryOp::NotLike, pattern)
    }

    /// `self IS NULL`.
    pub fn is_null(self) -> Self {
        self.binary(BinaryOp::Is, Self::Constant(Value::Null))
    }

    /// `self IS NOT NULL`.
    pub fn is_not_null(self) -> Self {
        self.binary(BinaryOp::IsNot, Self::Constant(Value::Null))
    }

    // ── Arithmetic and bitwise ──────────────────────────────────────

    /// `-self`.
    #[allow(clippy::should_implement_trait)]
    pub fn neg(self) -> Self {
        self.unary(UnaryOp::Neg)
    }

    /// `self + rhs`.
    #[allow(clippy::should_implement_trait)]
    pub fn add(self, rhs: impl IntoExpr) -> Self {
        self.binary(BinaryOp::Add, rhs)
    }

    /// `self - rhs`.
    #[allow(clippy::should_implement_trait)]
    pub fn sub(self, rhs: impl IntoExpr) -> Self {
        self.binary(BinaryOp::Sub, rhs)
    }

    /// `self * rhs`.
    #[allow(clippy::should_implement_trait)]
    pub fn mul(self, rhs: impl IntoExpr) -> Self {
        self.binary(BinaryOp::Mul, rhs)
    }

    /// `self / rhs`.
    #[allow(clippy::should_implement_trait)]
    pub fn div(self, rhs: impl IntoExpr) -> Self {
        self.binary(BinaryOp::Div, rhs)
    }

    /// `self % rhs`.
    pub fn modulo(self, rhs: impl IntoExpr) -> Self {
        self.binary(BinaryOp::Mod, rhs)
    }

    /// `self & rhs`. Bitwise; see [`and`](super::functions::and) for the boolean form.
    pub fn bit_and(self, rhs: impl IntoExpr) -> Self {
        self.binary(BinaryOp::BitAnd, rhs)
    }

    /// `self | rhs`.
    pub fn bit_or(self, rhs: impl IntoExpr) -> Self {
        self.binary(BinaryOp::BitOr, rhs)
    }

    /// `self ^ rhs`.
    pub fn bit_xor(self, rhs: impl IntoExpr) -> Self {
        self.binary(BinaryOp::BitXor, rhs)
    }

    // ── Aggregates and functions ────────────────────────────────────

    /// `AVG(self)`.
    pub fn avg(self) -> Self {
        self.aggregate("AVG", false)
    }

    /// `SUM(self)`.
    pub fn sum(self) -> Self {
        self.aggregate("SUM", false)
    }

    /// `COUNT(self)` or `COUNT(DISTINCT self)`.
    pub fn count(self, distinct: bool) -> Self {
        self.aggregate("COUNT", distinct)
    }

    /// `MAX(self)`.
    pub fn max(self) -> Self {
        self.aggregate("MAX", false)
    }

    /// `MIN(self)`.
    pub fn min(self) -> Self {
        self.aggregate("MIN", false)
    }

    /// `CAST(self AS type_name)`.
    pub fn cast(self, type_name: impl Into<String>) -> Self {
        Self::Cast {
            expr: Box::new(self.unaliased()),
            type_name: type_name.into(),
        }
    }

    /// Turns an aggregate call into a window call over `window`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidQuery` unless `self` is a function call.
    pub fn over(self, window: &WindowDescriptor) -> QuarryResult<Self> {
        match self.unaliased() {
            Self::Function {
                name,
                args,
                distinct,
            } => Ok(Self::Window(Box::new(WindowCall {
                function: WindowFunction::Aggregate { name, distinct },
                args,
                filter: None,
                window: window.clone(),
            }))),
            other => Err(QuarryError::InvalidQuery(format!(
                "only function calls can be used with OVER, got {other:?}"
            ))),
        }
    }

    /// Wraps this expression under a display name.
    pub fn alias(self, name: impl Into<String>) -> Self {
        Self::Alias {
            expr: Box::new(self),
            alias: name.into(),
        }
    }
}

/// Converts an operand into an [`Expr`], unwrapping aliases.
pub(crate) fn operand(value: impl IntoExpr) -> Expr {
    value.into_expr().unaliased()
}

/// Anything usable as an expression operand.
///
/// Literal values become unnamed parameters; `Vec`s become lists.
pub trait IntoExpr {
    /// Performs the conversion.
    fn into_expr(self) -> Expr;
}

impl IntoExpr for Expr {
    fn into_expr(self) -> Expr {
        self
    }
}

impl IntoExpr for &Expr {
    fn into_expr(self) -> Expr {
        self.clone()
    }
}

impl IntoExpr for Value {
    fn into_expr(self) -> Expr {
        Expr::Param(self)
    }
}

impl IntoExpr for Query {
    fn into_expr(self) -> Expr {
        Expr::Subquery(Box::new(self))
    }
}

macro_rules! into_param {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoExpr for $ty {
                fn into_expr(self) -> Expr {
                    Expr::Param(Value::from(self))
                }
            }
        )*
    };
}

into_param!(
    bool,
    i16,
    i32,
    i64,
    f32,
    f64,
    String,
    &str,
    chrono::NaiveDate,
    chrono::NaiveDateTime,
    chrono::NaiveTime,
    chrono::DateTime<chrono::Utc>,
    uuid::Uuid,
    serde_json::Value,
);

impl<T: Into<Value>> IntoExpr for Option<T> {
    fn into_expr(self) -> Expr {
        Expr::Param(Value::from(self))
    }
}

impl<T: IntoExpr> IntoExpr for Vec<T> {
    fn into_expr(self) -> Expr {
        Expr::List(self.into_iter().map(operand).collect())
    }
}

impl<T: IntoExpr> ops::Add<T> for Expr {
    type Output = Self;
    fn add(self, rhs: T) -> Self {
        Self::add(self, rhs)
    }
}

impl<T: IntoExpr> ops::Sub<T> for Expr {
    type Output = Self;
    fn sub(self, rhs: T) -> Self {
        Self::sub(self, rhs)
    }
}

impl<T: IntoExpr> ops::Mul<T> for Expr {
    type Output = Self;
    fn mul(self, rhs: T) -> Self {
        Self::mul(self, rhs)
    }
}

impl<T: IntoExpr> ops::Div<T> for Expr {
    type Output = Self;
    fn div(self, rhs: T) -> Self {
        Self::div(self, rhs)
    }
}

impl<T: IntoExpr> ops::Rem<T> for Expr {
    type Output = Self;
    fn rem(self, rhs: T) -> Self {
        self.modulo(rhs)
    }
}

impl<T: IntoExpr> ops::BitAnd<T> for Expr {
    type Output = Self;
    fn bitand(self, rhs: T) -> Self {
        self.bit_and(rhs)
    }
}

impl<T: IntoExpr> ops::BitOr<T> for Expr {
    type Output = Self;
    fn bitor(self, rhs: T) -> Self {
        self.bit_or(rhs)
    }
}

impl<T: IntoExpr> ops::BitXor<T> for Expr {
    type Output = Self;
    fn bitxor(self, rhs: T) -> Self {
        self.bit_xor(rhs)
    }
}

impl ops::Neg for Expr {
    type Output = Self;
    fn neg(self) -> Self {
        Self::neg(self)
    }
}

impl ops::Not for Expr {
    type Output = Self;
    fn not(self) -> Self {
        super::functions::not(self)
    }
}
