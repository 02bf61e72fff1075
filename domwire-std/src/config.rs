//! Framework configuration.
//!
//! [`Config`] is plain data deserialized with `serde`; every key is optional
//! and falls back to its default. Hosts either build it in code or load it
//! from whatever format their configuration lives in:
//!
//! ```rust,ignore
//! let config = Config::from_value(serde_json::json!({
//!     "debug": true,
//!     "decode_utf8": true,
//!     "encoding": "ISO-8859-1",
//! }))?;
//! ```

use domwire_core::{ConfigError, Separator};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The default character encoding.
pub const DEFAULT_ENCODING: &str = "UTF-8";

/// Framework configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Separator used in client-side class names.
    pub separator: Separator,
    /// Report errors and debug messages with `dbg` commands.
    pub debug: bool,
    /// Run the upload plugin before the winning plugin.
    pub upload_enabled: bool,
    /// Re-encode decoded strings from UTF-8 into [`Config::encoding`].
    pub decode_utf8: bool,
    /// The application character encoding.
    pub encoding: String,
    /// Discard stray output captured during a request.
    pub clean_buffer: bool,
    /// Report errors with `al` even in debug mode.
    pub error_as_alert: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            separator: Separator::Dot,
            debug: false,
            upload_enabled: false,
            decode_utf8: false,
            encoding: DEFAULT_ENCODING.to_string(),
            clean_buffer: true,
            error_as_alert: false,
        }
    }
}

impl Config {
    /// Deserialize and validate a configuration value.
    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_value(value).map_err(|e| ConfigError::Invalid {
            key: "config".to_string(),
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check values serde cannot check.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.encoding.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "encoding".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let config = Config::from_value(json!({})).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.encoding, "UTF-8");
        assert!(config.clean_buffer);
    }

    #[test]
    fn test_partial_override() {
        let config = Config::from_value(json!({"separator": "_", "debug": true})).unwrap();
        assert_eq!(config.separator, Separator::Underscore);
        assert!(config.debug);
        assert!(!config.upload_enabled);
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(Config::from_value(json!({"separator": "/"})).is_err());
        assert!(Config::from_value(json!({"encoding": " "})).is_err());
        assert!(Config::from_value(json!({"unknown": 1})).is_err());
    }
}
