//! Settings for quarry.
//!
//! [`Settings`] holds the library-wide knobs and [`LazySettings`] is a
//! process-wide, write-once slot for them. Unlike a framework settings object,
//! an unconfigured slot is not an error: the query layer simply falls back to
//! [`Settings::default`].

use std::collections::HashMap;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::error::{QuarryError, QuarryResult};

/// What `values()` does with a virtual (filter-only) field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VirtualValuesPolicy {
    /// Fail with a `VirtualField` error.
    #[default]
    Reject,
    /// Drop the field and log a warning.
    Skip,
}

/// Library settings.
///
/// Missing keys deserialize to their defaults, so a config file only needs
/// the knobs it changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // ── Logging ──────────────────────────────────────────────────────

    /// Enables the human-readable log format.
    pub debug: bool,
    /// `EnvFilter` directive, e.g. `"info"` or `"quarry_db=debug"`.
    pub log_level: String,

    // ── Query building ───────────────────────────────────────────────

    /// Policy for virtual fields passed to `values()`.
    pub virtual_values: VirtualValuesPolicy,
    /// Suffix appended to the inner table name of a derived table.
    pub subquery_suffix: String,

    // ── Hydration ────────────────────────────────────────────────────

    /// Default for `include_sensitive` in the executor helpers.
    pub include_sensitive: bool,

    // ── Escape hatch ─────────────────────────────────────────────────

    /// Arbitrary extra settings for downstream crates.
    pub extra: HashMap<String, serde_json::Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: false,
            log_level: "info".to_string(),
            virtual_values: VirtualValuesPolicy::Reject,
            subquery_suffix: "_SUBQUERY".to_string(),
            include_sensitive: false,
            extra: HashMap::new(),
        }
    }
}

/// A write-once settings slot.
///
/// Call [`configure`](LazySettings::configure) once at startup; every read
/// before that sees [`Settings::default`] and freezes it.
pub struct LazySettings {
    inner: OnceLock<Settings>,
}

impl Default for LazySettings {
    fn default() -> Self {
        Self::new()
    }
}

impl LazySettings {
    /// Creates an empty slot.
    pub const fn new() -> Self {
        Self {
            inner: OnceLock::new(),
        }
    }

    /// Stores the settings.
    ///
    /// # Errors
    ///
    /// Returns a `Configuration` error if the slot was already configured or
    /// already read.
    pub fn configure(&self, settings: Settings) -> QuarryResult<()> {
        self.inner.set(settings).map_err(|_| {
            QuarryError::Configuration("settings have already been configured".to_string())
        })
    }

    /// Returns the configured settings, or the defaults.
    pub fn get(&self) -> &Settings {
        self.inner.get_or_init(Settings::default)
    }

    /// Returns `true` if the slot holds a value.
    pub fn is_configured(&self) -> bool {
        self.inner.get().is_some()
    }
}

/// The process-wide settings slot.
pub static SETTINGS: LazySettings = LazySettings::new();

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert!(!s.debug);
        assert_eq!(s.log_level, "info");
        assert_eq!(s.virtual_values, VirtualValuesPolicy::Reject);
        assert_eq!(s.subquery_suffix, "_SUBQUERY");
        assert!(!s.include_sensitive);
    }

    #[test]
    fn test_lazy_settings_configure_once() {
        let slot = LazySettings::new();
        assert!(!slot.is_configured());
        let custom = Settings {
            virtual_values: VirtualValuesPolicy::Skip,
            ..Settings::default()
        };
        slot.configure(custom).unwrap();
        assert!(slot.is_configured());
        assert_eq!(slot.get().virtual_values, VirtualValuesPolicy::Skip);
        assert!(slot.configure(Settings::default()).is_err());
    }

    #[test]
    fn test_lazy_settings_falls_back_to_defaults() {
        let slot = LazySettings::new();
        assert_eq!(slot.get().subquery_suffix, "_SUBQUERY");
        // Reading freezes the defaults.
        assert!(slot.configure(Settings::default()).is_err());
    }

    #[test]
    fn test_policy_serde_names() {
        let json = serde_json::to_string(&VirtualValuesPolicy::Skip).unwrap();
        assert_eq!(json, "\"skip\"");
    }
}
