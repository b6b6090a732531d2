// PDP configuration
//
// Loaded from JSON like the rest of the tree definitions; every field is
// optional and falls back to its default.

use crate::context::DEFAULT_MAX_REFERENCE_DEPTH;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur when loading a PdpConfig
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load config from file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("max_reference_depth must be at least 1")]
    InvalidReferenceDepth,
}

fn default_max_reference_depth() -> usize {
    DEFAULT_MAX_REFERENCE_DEPTH
}

/// Engine settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdpConfig {
    /// Collect trace events on every request context
    #[serde(default)]
    pub trace_enabled: bool,

    /// Bound on nested id-reference resolution
    #[serde(default = "default_max_reference_depth")]
    pub max_reference_depth: usize,
}

impl Default for PdpConfig {
    fn default() -> Self {
        Self {
            trace_enabled: false,
            max_reference_depth: DEFAULT_MAX_REFERENCE_DEPTH,
        }
    }
}

impl PdpConfig {
    /// Load PdpConfig from JSON string
    ///
    /// # Example
    ///
    /// ```
    /// use xacml_pdp_core::PdpConfig;
    ///
    /// let config = PdpConfig::from_json(r#"{"trace_enabled": true}"#).unwrap();
    /// assert!(config.trace_enabled);
    /// assert_eq!(config.max_reference_depth, 32);
    /// ```
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: PdpConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load PdpConfig from JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_reference_depth == 0 {
            return Err(ConfigError::InvalidReferenceDepth);
        }
        Ok(())
    }
}
