//! Conjunction Triage configuration loading and validation.
//!
//! This crate provides:
//! - Typed Rust structs for the YAML configuration file
//! - Config resolution (CLI → env → XDG → defaults)
//! - Semantic validation, fail-fast at startup
//!
//! Every `ConfigurationError` is raised here before any event is processed;
//! threshold or transform misconfiguration is never deferred to per-event
//! processing.

pub mod model;
pub mod resolve;
pub mod risk;
pub mod validate;

pub use model::ModelConfig;
pub use resolve::{load_resolved, resolve_config_path, ConfigSource, ResolvedConfig};
pub use risk::RiskPolicy;
pub use validate::{validate, ValidationError, ValidationResult};

use serde::{Deserialize, Serialize};

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";

/// Complete configuration: model shape plus risk policy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub risk: RiskPolicy,
}

impl Config {
    /// Parse from YAML text. Syntactic errors only; call [`validate`] for
    /// semantic checks.
    pub fn from_yaml(text: &str) -> Result<Self, ValidationError> {
        serde_yaml::from_str(text).map_err(|e| ValidationError::ParseError(e.to_string()))
    }

    /// Load and semantically validate a YAML config file.
    pub fn load(path: &std::path::Path) -> Result<Self, ValidationError> {
        let text =
            std::fs::read_to_string(path).map_err(|e| ValidationError::IoError(e.to_string()))?;
        let config = Self::from_yaml(&text)?;
        validate(&config)?;
        Ok(config)
    }
}
