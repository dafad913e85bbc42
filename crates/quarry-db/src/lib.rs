//! # quarry-db
//!
//! Typed query construction. Models register table metadata once; calling
//! code then builds SELECT, INSERT, upsert, UPDATE, and DELETE statements
//! through fluent builders whose callbacks name model properties while the
//! library substitutes correctly qualified columns.
//!
//! ## Architecture
//!
//! Nothing here produces SQL text. Builders produce a backend-agnostic
//! [`Query`](query::Query) tree; an external [`Compiler`](executor::Compiler)
//! renders it and an external [`Driver`](executor::Driver) runs it. Raw rows
//! come back through the [`reader`] module, which maps them onto models.
//!
//! ## Module Overview
//!
//! - [`model`] - The [`Model`](model::Model) trait, table and index metadata
//! - [`registry`] - The write-once model registry
//! - [`fields`] - Field descriptors and storage transforms (field kinds)
//! - [`value`] - The backend-agnostic [`Value`](value::Value) enum
//! - [`row`] - Raw rows and hydrated records
//! - [`query`] - Expressions, the resolver, builders, and the query tree
//! - [`reader`] - Result hydration
//! - [`executor`] - Compiler and driver traits and round-trip helpers

// These clippy lints are intentionally allowed for the query crate:
// - struct_excessive_bools: FieldDescriptor carries one flag per column trait
// - too_many_lines: expression and builder test modules are long
// - cast_precision_loss: f64 bounds checks in scalar reads
// - result_large_err: QuarryError is the crate error type and is used consistently
// - doc_markdown: backtick requirements for documentation items are too strict
// - needless_pass_by_value: builder callbacks and operands take ownership by design of the API
// - return_self_not_must_use: builder pattern methods are self-documenting
// - use_self: explicit type names are clearer in some contexts
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::result_large_err)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::use_self)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::match_same_arms)]
// should_implement_trait: `Select::from` and `Delete::from` mirror SQL, not `From`
#![allow(clippy::should_implement_trait)]

pub mod executor;
pub mod fields;
pub mod model;
pub mod query;
pub mod reader;
pub mod registry;
pub mod row;
pub mod value;

// Re-export the most commonly used types at the crate root.
pub use executor::{Compiler, Driver};
pub use fields::{FieldDescriptor, FieldKind, KindRegistry};
pub use model::{IndexDescriptor, Model, TableBuilder, TableDescriptor};
pub use query::{Delete, Insert, Query, Resolver, Select, Update, Upsert, Window};
pub use reader::Hydrator;
pub use registry::{registry, Registry};
pub use row::{FromValue, Record, Row};
pub use value::Value;

/// Everything needed to declare models and build statements.
pub mod prelude {
    pub use crate::fields::{
        BoolKind, FieldDescriptor, FieldKind, GeometryKind, JsonKind, KindRegistry, TimestampKind,
    };
    pub use crate::model::{IndexDescriptor, Model, TableBuilder, TableDescriptor};
    pub use crate::query::builders::{Delete, Frame, Insert, Select, Update, Upsert, Window};
    pub use crate::query::expressions::{
        all, and, any, asc, case_, constant, count_all, cume_dist, dense_rank, desc, exists,
        first_value, lag, last_value, lead, named_param, not, nth_value, of, of_alias, or,
        otherwise, param, percent_rank, rank, row_number, when, Expr, FrameBound, FrameExclusion, FrameMode,
        IntoExpr, OrderTarget, OrderTerm, WindowDescriptor,
    };
    pub use crate::query::resolver::Resolver;
    pub use crate::query::tree::{LockMode, Query, StatementKind};
    pub use crate::reader::Hydrator;
    pub use crate::registry::{registry, Registry};
    pub use crate::row::{Record, Row};
    pub use crate::value::Value;
    pub use quarry_core::{QuarryError, QuarryResult};
}
