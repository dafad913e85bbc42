//! Window definitions and window function calls.
//!
//! A [`WindowDescriptor`] is the plain-data snapshot of an `OVER (...)`
//! clause. It is normally produced by the
//! [`Window`](crate::query::builders::Window) builder, which resolves
//! property names against a model. A descriptor may extend another one,
//! forming a singly linked chain; [`WindowDescriptor::flattened`] merges
//! the chain for compilers that cannot render named window inheritance.
//!
//! # Examples
//!
//! ```
//! use quarry_db::query::expressions::window::*;
//! use quarry_db::query::expressions::Expr;
//!
//! // ROW_NUMBER() OVER (PARTITION BY dept ROWS BETWEEN UNBOUNDED PRECEDING AND CURRENT ROW)
//! let over = WindowDescriptor {
//!     partition_by: vec![Expr::column(Some("employee"), "dept")],
//!     frame_mode: Some(FrameMode::Rows),
//!     frame_start: Some(FrameBound::UnboundedPreceding),
//!     frame_end: Some(FrameBound::CurrentRow),
//!     ..WindowDescriptor::default()
//! };
//! let call = row_number(&over, None);
//! assert!(matches!(call, Expr::Window(_)));
//! ```

use super::core::{operand, Expr, IntoExpr};
use super::ordering::OrderTerm;
use crate::value::Value;

/// The unit a window frame is measured in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameMode {
    /// ROWS: physical row offsets.
    Rows,
    /// RANGE: logical value ranges.
    Range,
    /// GROUPS: peer groups.
    Groups,
}

impl FrameMode {
    /// Returns the SQL keyword.
    pub const fn sql_keyword(self) -> &'static str {
        match self {
            Self::Rows => "ROWS",
            Self::Range => "RANGE",
            Self::Groups => "GROUPS",
        }
    }
}

/// A window frame boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameBound {
    /// UNBOUNDED PRECEDING.
    UnboundedPreceding,
    /// N PRECEDING.
    Preceding(u64),
    /// CURRENT ROW.
    CurrentRow,
    /// N FOLLOWING.
    Following(u64),
    /// UNBOUNDED FOLLOWING.
    UnboundedFollowing,
}

impl FrameBound {
    /// Returns the SQL representation of this bound.
    pub fn to_sql(self) -> String {
        match self {
            Self::UnboundedPreceding => "UNBOUNDED PRECEDING".to_string(),
            Self::Preceding(n) => format!("{n} PRECEDING"),
            Self::CurrentRow => "CURRENT ROW".to_string(),
            Self::Following(n) => format!("{n} FOLLOWING"),
            Self::UnboundedFollowing => "UNBOUNDED FOLLOWING".to_string(),
        }
    }
}

/// The EXCLUDE clause of a window frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameExclusion {
    /// EXCLUDE CURRENT ROW.
    CurrentRow,
    /// EXCLUDE GROUP.
    Group,
    /// EXCLUDE TIES.
    Ties,
    /// EXCLUDE NO OTHERS.
    NoOthers,
}

impl FrameExclusion {
    /// Returns the SQL keyword following `EXCLUDE`.
    pub const fn sql_keyword(self) -> &'static str {
        match self {
            Self::CurrentRow => "CURRENT ROW",
            Self::Group => "GROUP",
            Self::Ties => "TIES",
            Self::NoOthers => "NO OTHERS",
        }
    }
}

/// A snapshot of a window definition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindowDescriptor {
    /// The window this one extends.
    pub extends: Option<Box<WindowDescriptor>>,
    /// PARTITION BY expressions.
    pub partition_by: Vec<Expr>,
    /// ORDER BY terms.
    pub order_by: Vec<OrderTerm>,
    /// Frame unit.
    pub frame_mode: Option<FrameMode>,
    /// Frame start bound.
    pub frame_start: Option<FrameBound>,
    /// Frame end bound.
    pub frame_end: Option<FrameBound>,
    /// Frame exclusion.
    pub frame_exclusion: Option<FrameExclusion>,
}

impl WindowDescriptor {
    /// Merges the inheritance chain into a single descriptor.
    ///
    /// Values set on a child override inherited ones; unset values are
    /// taken from the nearest ancestor that sets them.
    pub fn flattened(&self) -> Self {
        let base = self
            .extends
            .as_deref()
            .map(Self::flattened)
            .unwrap_or_default();
        Self {
            extends: None,
            partition_by: if self.partition_by.is_empty() {
                base.partition_by
            } else {
                self.partition_by.clone()
            },
            order_by: if self.order_by.is_empty() {
                base.order_by
            } else {
                self.order_by.clone()
            },
            frame_mode: self.frame_mode.or(base.frame_mode),
            frame_start: self.frame_start.or(base.frame_start),
            frame_end: self.frame_end.or(base.frame_end),
            frame_exclusion: self.frame_exclusion.or(base.frame_exclusion),
        }
    }

    /// Returns the length of the inheritance chain, counting `self`.
    pub fn depth(&self) -> usize {
        1 + self.extends.as_deref().map_or(0, Self::depth)
    }
}

/// A window function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowFunction {
    /// ROW_NUMBER().
    RowNumber,
    /// RANK().
    Rank,
    /// DENSE_RANK().
    DenseRank,
    /// PERCENT_RANK().
    PercentRank,
    /// CUME_DIST().
    CumeDist,
    /// FIRST_VALUE(expr).
    FirstValue,
    /// LAST_VALUE(expr).
    LastValue,
    /// NTH_VALUE(expr, n).
    NthValue,
    /// LAG(expr, offset, default).
    Lag,
    /// LEAD(expr, offset, default).
    Lead,
    /// An aggregate used as a window function (e.g. `SUM(x) OVER (...)`).
    Aggregate {
        /// The aggregate name.
        name: String,
        /// Whether DISTINCT applies to the arguments.
        distinct: bool,
    },
}

impl WindowFunction {
    /// Returns the SQL function name.
    pub fn sql_name(&self) -> &str {
        match self {
            Self::RowNumber => "ROW_NUMBER",
            Self::Rank => "RANK",
            Self::DenseRank => "DENSE_RANK",
            Self::PercentRank => "PERCENT_RANK",
            Self::CumeDist => "CUME_DIST",
            Self::FirstValue => "FIRST_VALUE",
            Self::LastValue => "LAST_VALUE",
            Self::NthValue => "NTH_VALUE",
            Self::Lag => "LAG",
            Self::Lead => "LEAD",
            Self::Aggregate { name, .. } => name,
        }
    }
}

/// A complete window call: function, arguments, FILTER and OVER clauses.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowCall {
    /// The function.
    pub function: WindowFunction,
    /// The function arguments.
    pub args: Vec<Expr>,
    /// Optional `FILTER (WHERE ...)` predicate.
    pub filter: Option<Expr>,
    /// The window the call runs over.
    pub window: WindowDescriptor,
}

fn call(function: WindowFunction, args: Vec<Expr>, over: &WindowDescriptor, filter: Option<Expr>) -> Expr {
    Expr::Window(Box::new(WindowCall {
        function,
        args,
        filter: filter.map(Expr::unaliased),
        window: over.clone(),
    }))
}

/// `ROW_NUMBER() OVER (...)`.
pub fn row_number(over: &WindowDescriptor, filter: Option<Expr>) -> Expr {
    call(WindowFunction::RowNumber, Vec::new(), over, filter)
}

/// `RANK() OVER (...)`.
pub fn rank(over: &WindowDescriptor, filter: Option<Expr>) -> Expr {
    call(WindowFunction::Rank, Vec::new(), over, filter)
}

/// `DENSE_RANK() OVER (...)`.
pub fn dense_rank(over: &WindowDescriptor, filter: Option<Expr>) -> Expr {
    call(WindowFunction::DenseRank, Vec::new(), over, filter)
}

/// `PERCENT_RANK() OVER (...)`.
pub fn percent_rank(over: &WindowDescriptor, filter: Option<Expr>) -> Expr {
    call(WindowFunction::PercentRank, Vec::new(), over, filter)
}

/// `CUME_DIST() OVER (...)`.
pub fn cume_dist(over: &WindowDescriptor, filter: Option<Expr>) -> Expr {
    call(WindowFunction::CumeDist, Vec::new(), over, filter)
}

/// `FIRST_VALUE(value) OVER (...)`.
pub fn first_value(value: impl IntoExpr, over: &WindowDescriptor, filter: Option<Expr>) -> Expr {
    call(WindowFunction::FirstValue, vec![operand(value)], over, filter)
}

/// `LAST_VALUE(value) OVER (...)`.
pub fn last_value(value: impl IntoExpr, over: &WindowDescriptor, filter: Option<Expr>) -> Expr {
    call(WindowFunction::LastValue, vec![operand(value)], over, filter)
}

/// `NTH_VALUE(value, n) OVER (...)`.
pub fn nth_value(value: impl IntoExpr, n: i64, over: &WindowDescriptor, filter: Option<Expr>) -> Expr {
    call(
        WindowFunction::NthValue,
        vec![operand(value), Expr::Param(Value::Int(n))],
        over,
        filter,
    )
}

/// `LAG(value, offset, default) OVER (...)`.
pub fn lag(
    value: impl IntoExpr,
    offset: i64,
    default: impl IntoExpr,
    over: &WindowDescriptor,
    filter: Option<Expr>,
) -> Expr {
    call(
        WindowFunction::Lag,
        vec![operand(value), Expr::Param(Value::Int(offset)), operand(default)],
        over,
        filter,
    )
}

/// `LEAD(value, offset, default) OVER (...)`.
pub fn lead(
    value: impl IntoExpr,
    offset: i64,
    default: impl IntoExpr,
    over: &WindowDescriptor,
    filter: Option<Expr>,
) -> Expr {
    call(
        WindowFunction::Lead,
        vec![operand(value), Expr::Param(Value::Int(offset)), operand(default)],
        over,
        filter,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn salary() -> Expr {
        Expr::column(Some("employee"), "salary")
    }

    fn dept() -> Expr {
        Expr::column(Some("employee"), "dept")
    }

    fn unwrap_call(expr: Expr) -> WindowCall {
        match expr {
            Expr::Window(call) => *call,
            other => panic!("expected window call, got {other:?}"),
        }
    }

    #[test]
    fn test_window_function_sql_names() {
        assert_eq!(WindowFunction::RowNumber.sql_name(), "ROW_NUMBER");
        assert_eq!(WindowFunction::DenseRank.sql_name(), "DENSE_RANK");
        assert_eq!(WindowFunction::CumeDist.sql_name(), "CUME_DIST");
        let agg = WindowFunction::Aggregate { name: "SUM".into(), distinct: false };
        assert_eq!(agg.sql_name(), "SUM");
    }

    #[test]
    fn test_frame_bound_sql() {
        assert_eq!(FrameBound::UnboundedPreceding.to_sql(), "UNBOUNDED PRECEDING");
        assert_eq!(FrameBound::Preceding(3).to_sql(), "3 PRECEDING");
        assert_eq!(FrameBound::CurrentRow.to_sql(), "CURRENT ROW");
        assert_eq!(FrameBound::Following(2).to_sql(), "2 FOLLOWING");
        assert_eq!(FrameBound::UnboundedFollowing.to_sql(), "UNBOUNDED FOLLOWING");
        assert_eq!(FrameMode::Groups.sql_keyword(), "GROUPS");
        assert_eq!(FrameExclusion::NoOthers.sql_keyword(), "NO OTHERS");
    }

    #[test]
    fn test_ranking_functions_have_no_args() {
        let over = WindowDescriptor::default();
        for expr in [
            row_number(&over, None),
            rank(&over, None),
            dense_rank(&over, None),
            percent_rank(&over, None),
            cume_dist(&over, None),
        ] {
            let call = unwrap_call(expr);
            assert!(call.args.is_empty());
            assert!(call.filter.is_none());
        }
    }

    #[test]
    fn test_lag_arguments() {
        let over = WindowDescriptor::default();
        let call = unwrap_call(lag(salary(), 2, Value::Null, &over, None));
        assert_eq!(call.function, WindowFunction::Lag);
        assert_eq!(
            call.args,
            vec![salary(), Expr::Param(Value::Int(2)), Expr::Param(Value::Null)]
        );
    }

    #[test]
    fn test_filter_is_kept() {
        let over = WindowDescriptor::default();
        let filter = salary().gt(1000);
        let call = unwrap_call(nth_value(salary(), 2, &over, Some(filter.clone())));
        assert_eq!(call.filter, Some(filter));
        assert_eq!(call.args.len(), 2);
    }

    #[test]
    fn test_flatten_inherits_unset_values() {
        let parent = WindowDescriptor {
            partition_by: vec![dept()],
            order_by: vec![salary().desc()],
            frame_mode: Some(FrameMode::Rows),
            frame_start: Some(FrameBound::UnboundedPreceding),
            ..WindowDescriptor::default()
        };
        let child = WindowDescriptor {
            extends: Some(Box::new(parent)),
            frame_mode: Some(FrameMode::Range),
            frame_end: Some(FrameBound::CurrentRow),
            ..WindowDescriptor::default()
        };
        assert_eq!(child.depth(), 2);

        let flat = child.flattened();
        assert_eq!(flat.extends, None);
        assert_eq!(flat.partition_by, vec![dept()]);
        assert_eq!(flat.order_by, vec![salary().desc()]);
        assert_eq!(flat.frame_mode, Some(FrameMode::Range));
        assert_eq!(flat.frame_start, Some(FrameBound::UnboundedPreceding));
        assert_eq!(flat.frame_end, Some(FrameBound::CurrentRow));
        assert_eq!(flat.frame_exclusion, None);
    }

    #[test]
    fn test_flatten_child_partition_overrides() {
        let parent = WindowDescriptor {
            partition_by: vec![dept()],
            ..WindowDescriptor::default()
        };
        let child = WindowDescriptor {
            extends: Some(Box::new(parent)),
            partition_by: vec![salary()],
            ..WindowDescriptor::default()
        };
        assert_eq!(child.flattened().partition_by, vec![salary()]);
    }
}
