//! Loading [`Settings`] from files and the environment.
//!
//! A file (TOML or JSON) is read first. Keys it omits keep their defaults.
//! `QUARRY_*` environment variables are applied last and win:
//!
//! | Env Var | Setting |
//! |---|---|
//! | `QUARRY_DEBUG` | `debug` |
//! | `QUARRY_LOG_LEVEL` | `log_level` |
//! | `QUARRY_VIRTUAL_VALUES` | `virtual_values` (`reject` / `skip`) |
//! | `QUARRY_SUBQUERY_SUFFIX` | `subquery_suffix` |
//! | `QUARRY_INCLUDE_SENSITIVE` | `include_sensitive` |
//!
//! ```rust,no_run
//! use quarry_core::settings_loader;
//!
//! let settings = settings_loader::from_toml_file_with_env("config/quarry.toml").unwrap();
//! quarry_core::SETTINGS.configure(settings).unwrap();
//! ```

use std::path::Path;

use crate::error::{QuarryError, QuarryResult};
use crate::settings::{Settings, VirtualValuesPolicy};

type Override = fn(&mut Settings, &str);

/// Env var name and how its text lands on [`Settings`]. Values that do not
/// parse leave the setting untouched.
const ENV_OVERRIDES: &[(&str, Override)] = &[
    ("QUARRY_DEBUG", |s, v| s.debug = is_truthy(v)),
    ("QUARRY_LOG_LEVEL", |s, v| s.log_level = v.to_string()),
    ("QUARRY_VIRTUAL_VALUES", |s, v| {
        if let Some(policy) = policy_named(v) {
            s.virtual_values = policy;
        }
    }),
    ("QUARRY_SUBQUERY_SUFFIX", |s, v| s.subquery_suffix = v.to_string()),
    ("QUARRY_INCLUDE_SENSITIVE", |s, v| s.include_sensitive = is_truthy(v)),
];

/// Parses settings from TOML text.
///
/// # Errors
///
/// Returns a `Configuration` error for malformed TOML or values of the wrong
/// shape, such as an unknown `virtual_values` policy.
pub fn from_toml_str(text: &str) -> QuarryResult<Settings> {
    toml::from_str(text).map_err(|e| invalid("TOML", e))
}

/// Reads and parses a TOML settings file.
///
/// # Errors
///
/// Returns a `Configuration` error if the file is unreadable or invalid.
pub fn from_toml_file(path: impl AsRef<Path>) -> QuarryResult<Settings> {
    from_toml_str(&read(path.as_ref(), "TOML")?)
}

/// Reads a TOML settings file, then applies `QUARRY_*` overrides.
///
/// # Errors
///
/// Returns a `Configuration` error if the file is unreadable or invalid.
pub fn from_toml_file_with_env(path: impl AsRef<Path>) -> QuarryResult<Settings> {
    let mut settings = from_toml_file(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Parses settings from JSON text.
///
/// # Errors
///
/// Returns a `Configuration` error for malformed JSON or mistyped values.
pub fn from_json_str(text: &str) -> QuarryResult<Settings> {
    serde_json::from_str(text).map_err(|e| invalid("JSON", e))
}

/// Reads and parses a JSON settings file.
///
/// # Errors
///
/// Returns a `Configuration` error if the file is unreadable or invalid.
pub fn from_json_file(path: impl AsRef<Path>) -> QuarryResult<Settings> {
    from_json_str(&read(path.as_ref(), "JSON")?)
}

/// Defaults with `QUARRY_*` overrides applied.
pub fn from_env() -> Settings {
    let mut settings = Settings::default();
    apply_env_overrides(&mut settings);
    settings
}

/// Applies every `QUARRY_*` variable present in the process environment.
pub fn apply_env_overrides(settings: &mut Settings) {
    apply_overrides_from(settings, |name| std::env::var(name).ok());
}

fn apply_overrides_from(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    for (name, apply) in ENV_OVERRIDES {
        if let Some(raw) = lookup(name) {
            tracing::debug!(var = name, "settings override from environment");
            apply(settings, raw.trim());
        }
    }
}

fn read(path: &Path, format: &str) -> QuarryResult<String> {
    std::fs::read_to_string(path).map_err(|e| {
        QuarryError::Configuration(format!(
            "cannot read {format} settings file '{}': {e}",
            path.display()
        ))
    })
}

fn invalid(format: &str, err: impl std::fmt::Display) -> QuarryError {
    QuarryError::Configuration(format!("invalid {format} settings: {err}"))
}

fn is_truthy(raw: &str) -> bool {
    ["1", "true", "yes", "on"]
        .iter()
        .any(|t| raw.eq_ignore_ascii_case(t))
}

fn policy_named(raw: &str) -> Option<VirtualValuesPolicy> {
    if raw.eq_ignore_ascii_case("reject") {
        Some(VirtualValuesPolicy::Reject)
    } else if raw.eq_ignore_ascii_case("skip") {
        Some(VirtualValuesPolicy::Skip)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_toml_keeps_defaults_for_missing_keys() {
        let settings = from_toml_str(r#"virtual_values = "skip""#).unwrap();
        assert_eq!(settings.virtual_values, VirtualValuesPolicy::Skip);
        assert_eq!(settings.subquery_suffix, "_SUBQUERY");
        assert!(!settings.include_sensitive);
    }

    #[test]
    fn test_toml_empty_is_default() {
        let settings = from_toml_str("").unwrap();
        assert_eq!(settings.log_level, "info");
        assert_eq!(settings.virtual_values, VirtualValuesPolicy::Reject);
    }

    #[test]
    fn test_toml_extra_table() {
        let settings = from_toml_str("[extra]\nschema = \"reporting\"\nshards = 4").unwrap();
        assert_eq!(settings.extra["schema"], serde_json::json!("reporting"));
        assert_eq!(settings.extra["shards"], serde_json::json!(4));
    }

    #[test]
    fn test_unknown_policy_is_a_configuration_error() {
        let err = from_toml_str(r#"virtual_values = "explode""#).unwrap_err();
        assert!(matches!(err, QuarryError::Configuration(_)));
        assert!(err.to_string().contains("invalid TOML settings"));
    }

    #[test]
    fn test_json_settings() {
        let settings =
            from_json_str(r#"{"include_sensitive": true, "subquery_suffix": "_dt"}"#).unwrap();
        assert!(settings.include_sensitive);
        assert_eq!(settings.subquery_suffix, "_dt");
        assert!(from_json_str("{not json").is_err());
    }

    #[test]
    fn test_missing_file_names_the_path() {
        let err = from_json_file("/nonexistent/quarry.json").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/quarry.json"));
    }

    #[test]
    fn test_env_overrides_win_over_file() {
        let mut settings = from_toml_str("debug = false\nsubquery_suffix = \"_file\"").unwrap();
        apply_overrides_from(
            &mut settings,
            env(&[
                ("QUARRY_DEBUG", "Yes"),
                ("QUARRY_SUBQUERY_SUFFIX", "_env"),
                ("QUARRY_VIRTUAL_VALUES", " SKIP "),
            ]),
        );
        assert!(settings.debug);
        assert_eq!(settings.subquery_suffix, "_env");
        assert_eq!(settings.virtual_values, VirtualValuesPolicy::Skip);
    }

    #[test]
    fn test_unparseable_policy_override_is_ignored() {
        let mut settings = Settings {
            virtual_values: VirtualValuesPolicy::Skip,
            ..Settings::default()
        };
        apply_overrides_from(&mut settings, env(&[("QUARRY_VIRTUAL_VALUES", "maybe")]));
        assert_eq!(settings.virtual_values, VirtualValuesPolicy::Skip);
    }

    #[test]
    fn test_truthy_values() {
        assert!(is_truthy("ON"));
        assert!(is_truthy("1"));
        assert!(!is_truthy("off"));
        assert!(!is_truthy(""));
    }
}
