//! `tracing` setup and the span every built or executed statement runs in.

use tracing_subscriber::fmt::Subscriber;
use tracing_subscriber::EnvFilter;

use crate::settings::Settings;

/// Installs the global subscriber described by `settings`.
///
/// `log_level` is an `EnvFilter` directive; an unparseable one falls back to
/// `info`. Debug mode logs pretty multi-line events with source locations,
/// otherwise events are one JSON object per line.
///
/// Returns `false` when a global subscriber was already installed, in which
/// case nothing changes.
pub fn setup_logging(settings: &Settings) -> bool {
    let filter = filter_for(&settings.log_level);
    let installed = if settings.debug {
        Subscriber::builder()
            .with_env_filter(filter)
            .with_file(true)
            .with_line_number(true)
            .pretty()
            .try_init()
    } else {
        Subscriber::builder()
            .with_env_filter(filter)
            .json()
            .with_current_span(true)
            .try_init()
    };
    installed.is_ok()
}

fn filter_for(directive: &str) -> EnvFilter {
    EnvFilter::try_new(directive).unwrap_or_else(|e| {
        eprintln!("quarry: ignoring log_level {directive:?}: {e}");
        EnvFilter::new("info")
    })
}

/// Span for one statement, tagged with its kind and target table.
///
/// ```
/// use quarry_core::logging::statement_span;
///
/// let _entered = statement_span("select", "person").entered();
/// tracing::debug!("building statement");
/// ```
pub fn statement_span(kind: &str, table: &str) -> tracing::Span {
    tracing::debug_span!("statement", kind, table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_install_is_a_no_op() {
        let settings = Settings::default();
        setup_logging(&settings);
        assert!(!setup_logging(&settings));
    }

    #[test]
    fn test_bad_directive_falls_back() {
        assert_eq!(filter_for("quarry=loud").to_string(), "info");
        assert_eq!(filter_for("quarry_db=trace").to_string(), "quarry_db=trace");
    }

    #[test]
    fn test_statement_span_enters() {
        let _entered = statement_span("delete", "person").entered();
        tracing::debug!("inside span");
    }
}
