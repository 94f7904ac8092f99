//! Configuration file support.
//!
//! ```yaml
//! port: /dev/ttyUSB0
//! log_filter: info
//! append_sequence: false
//! ```
//!
//! Every key is optional. Command-line flags take precedence.

use std::path::{Path, PathBuf};

use fleetsync_protocol::EncoderConfig;
use serde::Deserialize;

use crate::error::CliResult;

/// Default log filter when neither the flag, the file nor `RUST_LOG` set one.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Settings read from the YAML configuration file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Serial device (or file) frames are written to.
    pub port: Option<PathBuf>,
    /// `tracing` filter directive.
    pub log_filter: Option<String>,
    /// Encoder settings.
    #[serde(flatten)]
    pub encoder: EncoderConfig,
}

impl Config {
    /// Load a configuration file.
    pub fn load(path: &Path) -> CliResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    /// Parse configuration from YAML text. An empty document is the default
    /// configuration.
    pub fn from_yaml(text: &str) -> CliResult<Self> {
        if text.trim().is_empty() {
            return Ok(Config::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Log filter to use, preferring `flag` over the file.
    pub fn log_filter(&self, flag: Option<&str>) -> String {
        flag.or(self.log_filter.as_deref())
            .unwrap_or(DEFAULT_LOG_FILTER)
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_config() {
        let config = Config::from_yaml(
            "port: /dev/ttyUSB0\nlog_filter: debug\nappend_sequence: true\n",
        )
        .unwrap();
        assert_eq!(config.port, Some(PathBuf::from("/dev/ttyUSB0")));
        assert_eq!(config.log_filter.as_deref(), Some("debug"));
        assert!(config.encoder.append_sequence);
    }

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(Config::from_yaml("").unwrap(), Config::default());
        let config = Config::from_yaml("port: COM3\n").unwrap();
        assert!(!config.encoder.append_sequence);
        assert_eq!(config.log_filter(None), DEFAULT_LOG_FILTER);
    }

    #[test]
    fn test_flag_overrides_log_filter() {
        let config = Config::from_yaml("log_filter: warn\n").unwrap();
        assert_eq!(config.log_filter(None), "warn");
        assert_eq!(config.log_filter(Some("trace")), "trace");
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(Config::from_yaml("append_sequence: [not, a, bool]").is_err());
    }
}
