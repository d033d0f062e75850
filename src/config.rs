//! Editor Configuration
//!
//! Stored as JSON next to the draft database, like the sync settings of
//! the desktop app. Every field has a default, so a partial file is valid.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::identity::DEFAULT_PREFIX;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Upper bound on concurrent persistence calls within one save phase
    pub max_in_flight: usize,
    /// Check field rules before issuing create/update calls
    pub validate_before_save: bool,
    /// Namespace prefix of temporary identities
    pub temp_id_prefix: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_in_flight: 8,
            validate_before_save: true,
            temp_id_prefix: DEFAULT_PREFIX.to_string(),
        }
    }
}

impl EditorConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: EditorConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, falling back to defaults when the file does not exist
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::info!("No editor config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_in_flight == 0 {
            return Err(ConfigError::Invalid("max_in_flight must be at least 1".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = EditorConfig::from_json_str(r#"{"max_in_flight": 2}"#).unwrap();
        assert_eq!(config.max_in_flight, 2);
        assert!(config.validate_before_save);
        assert_eq!(config.temp_id_prefix, "tmp");
    }

    #[test]
    fn test_zero_in_flight_rejected() {
        let err = EditorConfig::from_json_str(r#"{"max_in_flight": 0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("editor.json");

        assert_eq!(EditorConfig::load(&path).unwrap(), EditorConfig::default());

        let config = EditorConfig {
            max_in_flight: 3,
            validate_before_save: false,
            temp_id_prefix: "draft".to_string(),
        };
        config.save(&path).unwrap();
        assert_eq!(EditorConfig::load(&path).unwrap(), config);
    }
}
