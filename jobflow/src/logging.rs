//! Logging setup using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the filter:
//! 1. `JOBFLOW_LOG` environment variable (any `EnvFilter` directive)
//! 2. `RUST_LOG`
//! 3. default to `info`
//!
//! `JOBFLOW_LOG_FORMAT=json` switches to one JSON object per line. Logs go to
//! stderr so stdout stays free for the metrics dump.

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter.
pub const LOG_ENV_VAR: &str = "JOBFLOW_LOG";

/// Environment variable selecting the log format.
pub const LOG_FORMAT_ENV_VAR: &str = "JOBFLOW_LOG_FORMAT";

/// Output format of the global subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// Newline-delimited JSON.
    Json,
}

impl LogFormat {
    /// Parses a format name; anything but `json` is [`LogFormat::Pretty`].
    #[must_use]
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Pretty
        }
    }
}

/// Initialise the global logging subscriber from the environment.
///
/// Call once at startup.
pub fn init_logging() -> Result<()> {
    let directives = std::env::var(LOG_ENV_VAR)
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_default();
    let format = std::env::var(LOG_FORMAT_ENV_VAR)
        .map(|v| LogFormat::parse(&v))
        .unwrap_or_default();
    init_with(&directives, format)
}

/// Initialise the global logging subscriber with explicit settings.
pub fn init_with(directives: &str, format: LogFormat) -> Result<()> {
    let filter = build_filter(directives)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false);

    let result = match format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    result.map_err(|e| anyhow!("failed to install tracing subscriber: {e}"))
}

fn build_filter(directives: &str) -> Result<EnvFilter> {
    if directives.trim().is_empty() {
        return Ok(EnvFilter::new("info"));
    }
    EnvFilter::try_new(directives).map_err(|e| anyhow!("invalid log filter '{directives}': {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_format() {
        assert_eq!(LogFormat::parse("json"), LogFormat::Json);
        assert_eq!(LogFormat::parse(" JSON "), LogFormat::Json);
        assert_eq!(LogFormat::parse("pretty"), LogFormat::Pretty);
        assert_eq!(LogFormat::parse(""), LogFormat::Pretty);
    }

    #[test]
    fn test_filter_defaults_to_info() {
        let filter = build_filter("  ").unwrap();
        assert_eq!(filter.to_string(), "info");
    }

    #[test]
    fn test_filter_accepts_directives() {
        let filter = build_filter("jobflow=debug,warn").unwrap();
        assert!(filter.to_string().contains("jobflow=debug"));
    }

    #[test]
    fn test_filter_rejects_garbage() {
        assert!(build_filter("jobflow=notalevel").is_err());
    }
}
