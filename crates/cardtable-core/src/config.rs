//! Table configuration.
//!
//! Loaded from a JSON file; every field has a default so a partial file (or
//! `{}`) is valid.

use crate::cards::DEFAULT_OPENING_HAND;
use crate::decklist::DEFAULT_IMAGE_URL_TEMPLATE;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Settings for a table session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Address the peer endpoint listens on.
    pub listen_addr: String,
    /// Cards dealt on initialize and mulligan.
    pub opening_hand: usize,
    /// Size of a card played onto the table.
    pub card_width: f64,
    pub card_height: f64,
    /// Font size applied to edited text shapes.
    pub text_font_size: f64,
    /// Card image URL with a `{name}` placeholder.
    pub image_url_template: String,
    /// Inline deck list; the built-in deck is used when absent.
    pub deck: Option<String>,
    /// Shuffle seed for reproducible games.
    pub seed: Option<u64>,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:0".to_string(),
            opening_hand: DEFAULT_OPENING_HAND,
            card_width: 100.0,
            card_height: 100.0,
            text_font_size: 40.0,
            image_url_template: DEFAULT_IMAGE_URL_TEMPLATE.to_string(),
            deck: None,
            seed: None,
        }
    }
}

impl TableConfig {
    /// Parse from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_object_uses_defaults() {
        let config = TableConfig::from_json("{}").unwrap();
        assert_eq!(config, TableConfig::default());
        assert_eq!(config.opening_hand, 7);
        assert!(config.image_url_template.contains("{name}"));
    }

    #[test]
    fn test_partial_override() {
        let config = TableConfig::from_json(r#"{"opening_hand": 5, "seed": 12}"#).unwrap();
        assert_eq!(config.opening_hand, 5);
        assert_eq!(config.seed, Some(12));
        assert_eq!(config.listen_addr, "127.0.0.1:0");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"listen_addr": "0.0.0.0:9000", "deck": "4 Plains"}}"#).unwrap();

        let config = TableConfig::load(file.path()).unwrap();
        assert_eq!(config.listen_addr, "0.0.0.0:9000");
        assert_eq!(config.deck.as_deref(), Some("4 Plains"));
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(TableConfig::load(&missing), Err(ConfigError::Io(_))));
        assert!(matches!(
            TableConfig::from_json("{not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_json_roundtrip() {
        let config = TableConfig {
            seed: Some(3),
            ..Default::default()
        };
        let json = config.to_json().unwrap();
        assert_eq!(TableConfig::from_json(&json).unwrap(), config);
    }
}
