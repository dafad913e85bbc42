//! Query construction.
//!
//! - [`expressions`] - The expression algebra
//! - [`resolver`] - Property-name to column resolution
//! - [`builders`] - Statement builders
//! - [`tree`] - The finished, backend-agnostic query tree

pub mod builders;
pub mod expressions;
pub mod resolver;
pub mod tree;

pub use builders::{Delete, Frame, Insert, Select, Update, Upsert, Window};
pub use resolver::Resolver;
pub use tree::{
    ConflictAction, ConflictSpec, Join, JoinKind, LockMode, Query, SetOperation, SetOperator,
    Source, StatementKind,
};
