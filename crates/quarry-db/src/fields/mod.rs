//! Field metadata.
//!
//! This module provides the [`FieldDescriptor`] that describes how a model
//! property maps onto a column (or, for virtual filter-only fields, onto
//! another table), and the [`FieldKind`] trait for pluggable storage
//! transforms.

pub mod descriptor;
pub mod kinds;

pub use descriptor::{FieldDescriptor, RelatedTo, SubqueryBuilder};
pub use kinds::{BoolKind, FieldKind, GeometryKind, JsonKind, KindRegistry, TimestampKind};
