//! The expression algebra.
//!
//! # Submodules
//!
//! - [`core`] - The [`Expr`] tree, operators, and the [`IntoExpr`] operand trait
//! - [`functions`] - Boolean combinators, CASE, `of`, parameters
//! - [`ordering`] - ORDER BY terms (`asc`, `desc`, ordinals, NULLS placement)
//! - [`subquery`] - `ALL`, `ANY`, and `EXISTS`
//! - [`window`] - Window descriptors and window functions

pub mod core;
pub mod functions;
pub mod ordering;
pub mod subquery;
pub mod window;

pub use self::core::{
    BinaryOp, ColumnRef, Expr, IntoExpr, NaryOp, Quantifier, TernaryOp, UnaryOp, When,
};
pub use self::functions::{
    and, case_, constant, count_all, named_param, not, of, of_alias, or, otherwise, param, when,
    CaseArm,
};
pub use self::ordering::{asc, desc, Direction, NullsOrder, OrderTarget, OrderTerm};
pub use self::subquery::{all, any, exists};
pub use self::window::{
    cume_dist, dense_rank, first_value, lag, last_value, lead, nth_value, percent_rank, rank,
    row_number, FrameBound, FrameExclusion, FrameMode, WindowCall, WindowDescriptor,
    WindowFunction,
};
