// model = "claude-opus-4-5"
// created = "2026-10-12"
// modified = "2026-10-15"
// driver = "Isaac Clayton"

//! Engine configuration.
//!
//! All fields have defaults, so an empty JSON object is a valid config:
//!
//! ```
//! use scribe::config::Config;
//!
//! let config = Config::from_json(r#"{ "gc_threshold": 64 }"#).unwrap();
//! assert_eq!(config.gc_threshold, Some(64));
//! assert_eq!(config.base, Config::default().base);
//! ```

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

/// Default number of digits available at each level of a position path.
pub const DEFAULT_BASE: u32 = 1 << 16;

/// Default maximum distance between an allocated digit and the bound it
/// is allocated from.
pub const DEFAULT_BOUNDARY: u32 = 16;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(&'static str),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Tombstone count that triggers automatic garbage collection.
    /// `None` disables automatic collection.
    pub gc_threshold: Option<usize>,
    /// Digits per path level. Must be at least 2.
    pub base: u32,
    /// Allocation window near the bound. Must be at least 1.
    pub boundary: u32,
}

impl Default for Config {
    fn default() -> Self {
        return Config {
            gc_threshold: None,
            base: DEFAULT_BASE,
            boundary: DEFAULT_BOUNDARY,
        };
    }
}

impl Config {
    /// Parse and validate a JSON config.
    pub fn from_json(json: &str) -> Result<Config, ConfigError> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        return Ok(config);
    }

    /// Builder-style setter for the collection threshold.
    pub fn with_gc_threshold(mut self, threshold: Option<usize>) -> Config {
        self.gc_threshold = threshold;
        return self;
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base < 2 {
            return Err(ConfigError::Invalid("base must be at least 2"));
        }
        if self.boundary == 0 {
            return Err(ConfigError::Invalid("boundary must be at least 1"));
        }
        return Ok(());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_is_default() {
        let config = Config::from_json("{}").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn partial_override() {
        let config = Config::from_json(r#"{ "boundary": 4, "gc_threshold": null }"#).unwrap();
        assert_eq!(config.boundary, 4);
        assert_eq!(config.gc_threshold, None);
        assert_eq!(config.base, DEFAULT_BASE);
    }

    #[test]
    fn rejects_degenerate_base() {
        let err = Config::from_json(r#"{ "base": 1 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_zero_boundary() {
        let err = Config::from_json(r#"{ "boundary": 0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_unknown_fields() {
        let err = Config::from_json(r#"{ "branching": 3 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn builder_sets_threshold() {
        let config = Config::default().with_gc_threshold(Some(3));
        assert_eq!(config.gc_threshold, Some(3));
    }
}
