//! # quarry-core
//!
//! Core types shared by every quarry crate: the error enum, settings, and
//! tracing-based logging setup. This crate has no dependency on the query
//! layer.
//!
//! ## Modules
//!
//! - [`error`] - Error types and result aliases
//! - [`settings`] - Library settings and the process-wide settings slot
//! - [`settings_loader`] - Loading settings from TOML, JSON, and environment
//! - [`logging`] - Tracing subscriber setup and statement spans

pub mod error;
pub mod logging;
pub mod settings;
pub mod settings_loader;

// Re-export the most commonly used types at the crate root.
pub use error::{QuarryError, QuarryResult};
pub use settings::{Settings, VirtualValuesPolicy, SETTINGS};
