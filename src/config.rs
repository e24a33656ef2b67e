//! Configuration for the view engine.
//!
//! Knobs that depend on the inspected library build rather than on the
//! container family itself: how map keys are compared, where the legacy
//! string header sits, and how far a node chain may run before it is
//! declared corrupt.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::inspect::TypeCode;

/// Errors loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Master configuration for the registry and its views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Upper bound on nodes followed in a chained traversal.
    pub max_chain_nodes: usize,
    /// Distance, in machine words, from a legacy string's data pointer back
    /// to its length header.
    pub legacy_header_words: u64,
    /// Map key comparison.
    pub keys: KeyMatchConfig,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            max_chain_nodes: 1_000_000,
            legacy_header_words: 3,
            keys: KeyMatchConfig::default(),
        }
    }
}

impl ViewerConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: ViewerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_chain_nodes == 0 {
            return Err(ConfigError::Invalid(
                "max_chain_nodes must be positive".to_string(),
            ));
        }
        if self.legacy_header_words == 0 {
            return Err(ConfigError::Invalid(
                "legacy_header_words must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// How a textual key argument is compared with the keys of a map.
///
/// Keys are compared by the semantic kind of the map's key type: integers
/// numerically, modeled string types by decoded content, and everything
/// else by the backend's rendering against a quoted literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyMatchConfig {
    /// Key type codes compared as integers.
    pub integer_codes: Vec<TypeCode>,
    /// Compare keys of a modeled string type by their decoded content.
    pub decode_string_keys: bool,
    /// Quote wrapped around the key for the rendered-literal comparison.
    pub literal_quote: String,
}

impl Default for KeyMatchConfig {
    fn default() -> Self {
        Self {
            integer_codes: vec![TypeCode::Int, TypeCode::Char, TypeCode::Bool, TypeCode::Enum],
            decode_string_keys: true,
            literal_quote: "\"".to_string(),
        }
    }
}
