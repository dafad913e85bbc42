//! Core error types for quarry.
//!
//! [`QuarryError`] covers every failure the query layer can report. All of
//! them are local and synchronous: metadata errors (unregistered models,
//! unknown fields), shape errors (malformed CASE, bad scalar projections,
//! unresolvable upsert conflicts), hydration errors, and the ambient
//! configuration and I/O failures.

use thiserror::Error;

/// The primary error type for quarry.
///
/// Metadata and shape errors are programming errors and should never be
/// retried. [`QuarryError::NotFound`] is kept separate from
/// [`QuarryError::Hydration`] so callers can tell "no rows" apart from
/// "malformed rows".
#[derive(Error, Debug)]
pub enum QuarryError {
    // ── Metadata errors ─────────────────────────────────────────────

    /// The model type was never registered.
    #[error("Model '{0}' is not annotated with table metadata")]
    NotAnnotated(String),

    /// The model type was registered twice.
    #[error("Model '{0}' is already registered")]
    AlreadyRegistered(String),

    /// A field name is not registered on the table.
    #[error("Unknown field '{field}' on table '{table}'")]
    UnknownField {
        /// The table the field was looked up on.
        table: String,
        /// The offending field name.
        field: String,
    },

    /// A virtual (filter-only) field was used where a real column is required.
    #[error("Field '{field}' on table '{table}' is filter-only and has no column")]
    VirtualField {
        /// The table the field belongs to.
        table: String,
        /// The offending field name.
        field: String,
    },

    /// A read-only field was assigned in an UPDATE.
    #[error("Field '{field}' on table '{table}' is read-only")]
    ReadOnlyField {
        /// The table the field belongs to.
        table: String,
        /// The offending field name.
        field: String,
    },

    /// A field kind was referenced by a name nobody registered.
    #[error("Unknown field kind '{0}'")]
    UnknownKind(String),

    // ── Shape errors ────────────────────────────────────────────────

    /// A CASE expression has more than one ELSE arm or a non-trailing ELSE.
    #[error("Malformed CASE expression: {0}")]
    MalformedCase(String),

    /// A scalar subquery was requested on a projection that is not exactly one column.
    #[error("Scalar subquery requires exactly one projected column, found {0}")]
    ScalarProjection(usize),

    /// An upsert conflict target could not be resolved.
    #[error("Cannot resolve conflict target on table '{table}': {reason}")]
    ConflictTarget {
        /// The table the upsert targets.
        table: String,
        /// Why no conflict target could be derived.
        reason: String,
    },

    /// Any other structurally invalid statement.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    // ── Hydration errors ────────────────────────────────────────────

    /// A raw value could not be converted into the expected shape.
    #[error("Hydration error: {0}")]
    Hydration(String),

    /// A "read one or fail" variant found no matching rows.
    #[error("No rows found: {0}")]
    NotFound(String),

    // ── Ambient errors ──────────────────────────────────────────────

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The external driver or compiler reported a failure.
    #[error("Driver error: {0}")]
    Driver(String),

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl QuarryError {
    /// Builds an [`QuarryError::UnknownField`] for the given table and field.
    pub fn unknown_field(table: impl Into<String>, field: impl Into<String>) -> Self {
        Self::UnknownField {
            table: table.into(),
            field: field.into(),
        }
    }

    /// Returns `true` for errors caused by wrong metadata usage.
    pub const fn is_metadata_error(&self) -> bool {
        matches!(
            self,
            Self::NotAnnotated(_)
                | Self::AlreadyRegistered(_)
                | Self::UnknownField { .. }
                | Self::VirtualField { .. }
                | Self::ReadOnlyField { .. }
                | Self::UnknownKind(_)
        )
    }

    /// Returns `true` for the distinct "no rows" condition.
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// A convenience type alias for `Result<T, QuarryError>`.
pub type QuarryResult<T> = Result<T, QuarryError>;
