//! Configuration sources.
//!
//! Precedence: an explicit file path, then the `CONFIG_JSON` environment
//! variable, then [`RunConfig::example`].

use super::model::RunConfig;
use crate::errors::ConfigError;
use std::fmt;
use std::path::{Path, PathBuf};

/// Environment variable holding an inline JSON configuration.
pub const CONFIG_ENV_VAR: &str = "CONFIG_JSON";

/// Where a configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// A file on disk.
    File(PathBuf),
    /// The `CONFIG_JSON` environment variable.
    Env,
    /// The built-in example.
    Example,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "file {}", path.display()),
            Self::Env => write!(f, "${CONFIG_ENV_VAR}"),
            Self::Example => f.write_str("built-in example"),
        }
    }
}

/// Parses a JSON configuration. Missing fields take their defaults.
pub fn from_json_str(json: &str) -> Result<RunConfig, ConfigError> {
    Ok(serde_json::from_str(json)?)
}

/// Reads and parses a JSON configuration file.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RunConfig, ConfigError> {
    let contents = std::fs::read_to_string(path.as_ref())?;
    from_json_str(&contents)
}

/// Resolves the configuration from the process environment.
pub fn load(path: Option<&Path>) -> Result<(RunConfig, ConfigSource), ConfigError> {
    resolve(path, std::env::var(CONFIG_ENV_VAR).ok())
}

/// Resolves the configuration given an optional path and inline JSON.
///
/// Empty inline JSON counts as absent.
pub fn resolve(
    path: Option<&Path>,
    inline_json: Option<String>,
) -> Result<(RunConfig, ConfigSource), ConfigError> {
    if let Some(path) = path {
        return Ok((load_from_path(path)?, ConfigSource::File(path.to_path_buf())));
    }
    match inline_json.filter(|json| !json.trim().is_empty()) {
        Some(json) => Ok((from_json_str(&json)?, ConfigSource::Env)),
        None => Ok((RunConfig::example(), ConfigSource::Example)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_file_takes_precedence() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"max_concurrency": 7}}"#).unwrap();

        let (config, source) = resolve(
            Some(file.path()),
            Some(r#"{"max_concurrency": 1}"#.to_string()),
        )
        .unwrap();

        assert_eq!(config.max_concurrency, 7);
        assert_eq!(source, ConfigSource::File(file.path().to_path_buf()));
    }

    #[test]
    fn test_inline_json() {
        let (config, source) =
            resolve(None, Some(r#"{"max_retries": 5}"#.to_string())).unwrap();
        assert_eq!(config.max_retries, 5);
        assert_eq!(source, ConfigSource::Env);
    }

    #[test]
    fn test_falls_back_to_example() {
        let (config, source) = resolve(None, Some("  ".to_string())).unwrap();
        assert_eq!(config, RunConfig::example());
        assert_eq!(source, ConfigSource::Example);

        let (_, source) = resolve(None, None).unwrap();
        assert_eq!(source, ConfigSource::Example);
    }

    #[test]
    fn test_parse_error() {
        let err = resolve(None, Some("{not json".to_string())).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_from_path(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
