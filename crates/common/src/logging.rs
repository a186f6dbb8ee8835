//! Tracing setup for the mixer.
//!
//! A bare level such as `debug` applies to the colmix crates only. GStreamer
//! bindings and other dependencies stay at `warn`. A full directive (anything
//! with `=` or `,`) is passed through untouched.

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;

/// Environment variable checked before `RUST_LOG`.
pub const LOG_ENV: &str = "COLMIX_LOG";

/// Targets that a bare level applies to.
const COLMIX_TARGETS: &[&str] = &[
    "colmix_common",
    "colmix_frame",
    "colmix_media_source",
    "colmix_compositor",
    "colmix_engine",
    "colmix",
];

/// Level for every target outside [`COLMIX_TARGETS`].
const DEPENDENCY_LEVEL: &str = "warn";

/// Expand a configured level into a filter directive.
pub fn filter_directive(level: &str) -> String {
    let level = level.trim();
    if level.is_empty() {
        return filter_directive("info");
    }
    if level.contains('=') || level.contains(',') {
        return level.to_string();
    }
    let mut directive = String::from(DEPENDENCY_LEVEL);
    for target in COLMIX_TARGETS {
        directive.push(',');
        directive.push_str(target);
        directive.push('=');
        directive.push_str(level);
    }
    directive
}

/// Pick the directive to use: `COLMIX_LOG`, then `RUST_LOG`, then the
/// configured level. Empty variables are ignored.
fn resolve_directive(
    colmix_log: Option<String>,
    rust_log: Option<String>,
    config: &LoggingConfig,
) -> String {
    [colmix_log, rust_log]
        .into_iter()
        .flatten()
        .find(|value| !value.trim().is_empty())
        .map(|value| filter_directive(&value))
        .unwrap_or_else(|| filter_directive(&config.level))
}

fn build_filter(directive: &str) -> EnvFilter {
    EnvFilter::try_new(directive).unwrap_or_else(|e| {
        eprintln!("Invalid log filter {directive:?} ({e}); using info");
        EnvFilter::new(filter_directive("info"))
    })
}

/// Install the global subscriber. Later calls are ignored.
pub fn init_logging(config: &LoggingConfig) {
    let directive = resolve_directive(
        std::env::var(LOG_ENV).ok(),
        std::env::var(EnvFilter::DEFAULT_ENV).ok(),
        config,
    );
    let env_filter = build_filter(&directive);

    let installed = if config.json {
        let subscriber = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .json()
            .finish();
        tracing::subscriber::set_global_default(subscriber).is_ok()
    } else {
        let subscriber = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_names(true)
            .with_file(false)
            .with_line_number(false)
            .finish();
        tracing::subscriber::set_global_default(subscriber).is_ok()
    };

    if installed {
        tracing::debug!(filter = %directive, json = config.json, "Logging initialized");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(level: &str) -> LoggingConfig {
        LoggingConfig {
            level: level.to_string(),
            json: false,
        }
    }

    #[test]
    fn test_bare_level_is_scoped_to_colmix_crates() {
        let directive = filter_directive("debug");
        assert!(directive.starts_with("warn,"));
        assert!(directive.contains("colmix_engine=debug"));
        assert!(directive.contains("colmix_media_source=debug"));
        assert!(directive.ends_with(",colmix=debug"));
        assert!(EnvFilter::try_new(&directive).is_ok());
    }

    #[test]
    fn test_full_directive_passes_through() {
        assert_eq!(filter_directive("gstreamer=info"), "gstreamer=info");
        assert_eq!(filter_directive("trace,image=off"), "trace,image=off");
    }

    #[test]
    fn test_blank_level_falls_back_to_info() {
        assert_eq!(filter_directive("  "), filter_directive("info"));
    }

    #[test]
    fn test_colmix_log_wins_over_rust_log_and_config() {
        let directive = resolve_directive(
            Some("trace".to_string()),
            Some("error".to_string()),
            &config("info"),
        );
        assert_eq!(directive, filter_directive("trace"));

        let directive = resolve_directive(None, Some("error".to_string()), &config("info"));
        assert_eq!(directive, filter_directive("error"));

        let directive = resolve_directive(Some(String::new()), None, &config("debug"));
        assert_eq!(directive, filter_directive("debug"));
    }

    #[test]
    fn test_invalid_directive_still_builds_a_filter() {
        let filter = build_filter("colmix_engine=notalevel");
        assert!(filter
            .to_string()
            .to_lowercase()
            .contains("colmix_engine=info"));
    }
}
