//! Optional config file
//!
//! Read from `<config_dir>/ekslogs/config.toml` unless `--config` names another
//! file. Every key is optional; command-line flags take precedence.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use ekslogs_output::{ColorMode, OutputFormat};

/// Errors that can occur when loading the config file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for '{field}': {message}")]
    InvalidValue {
        field: &'static str,
        message: &'static str,
    },
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub region: Option<String>,
    pub color: Option<ColorMode>,
    /// Tail polling interval, e.g. "2s" or "500ms"
    #[serde(with = "humantime_serde")]
    pub interval: Option<Duration>,
    pub message_only: Option<bool>,
    pub output: Option<OutputFormat>,
    /// Per-tick limit in follow mode
    pub tail_limit: Option<usize>,
}

impl Config {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("ekslogs").join("config.toml"))
    }

    /// Load an explicit file, or the default file if it exists
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Some(path) if path.is_file() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        contents.parse()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.interval.is_some_and(|interval| interval.is_zero()) {
            return Err(ConfigError::InvalidValue {
                field: "interval",
                message: "must be greater than zero",
            });
        }
        if self.tail_limit == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "tail_limit",
                message: "must be at least 1",
            });
        }
        Ok(())
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let config: Config = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_config() {
        let config: Config = "".parse().unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_full_config() {
        let config: Config = r#"
            region = "eu-west-1"
            color = "never"
            interval = "1500ms"
            message_only = true
            output = "json"
            tail_limit = 250
        "#
        .parse()
        .unwrap();

        assert_eq!(config.region.as_deref(), Some("eu-west-1"));
        assert_eq!(config.color, Some(ColorMode::Never));
        assert_eq!(config.interval, Some(Duration::from_millis(1500)));
        assert_eq!(config.message_only, Some(true));
        assert_eq!(config.output, Some(OutputFormat::Json));
        assert_eq!(config.tail_limit, Some(250));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = "colour = \"never\"".parse::<Config>().unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_bad_enum_value_rejected() {
        assert!("output = \"yaml\"".parse::<Config>().is_err());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let err = "interval = \"0s\"".parse::<Config>().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { field: "interval", .. }));
    }

    #[test]
    fn test_interval_duration_strings() {
        let config: Config = "interval = \"1m\"".parse().unwrap();
        assert_eq!(config.interval, Some(Duration::from_secs(60)));
        assert!(matches!(
            "interval = \"fast\"".parse::<Config>().unwrap_err(),
            ConfigError::Parse(_)
        ));
    }

    #[test]
    fn test_load_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "region = \"ap-northeast-1\"").unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.region.as_deref(), Some("ap-northeast-1"));
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(Some(&dir.path().join("missing.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
