//! Statement builders.
//!
//! Each builder is seeded with its statement kind, the target table, and the
//! table's readable columns, then accumulates clauses in call order.
//! `build()` hands back the finished [`Query`](crate::query::tree::Query).
//!
//! - [`Select`] - projection, joins, grouping, ordering, set operators
//! - [`Insert`] / [`Upsert`] - value assignment and conflict targets
//! - [`Update`] / [`Delete`] - filtered writes
//! - [`Window`] - named window definitions

mod common;
pub mod delete;
pub mod insert;
pub mod select;
pub mod update;
pub mod window;

pub use delete::Delete;
pub use insert::{Insert, Upsert};
pub use select::Select;
pub use update::Update;
pub use window::{Frame, Window};
