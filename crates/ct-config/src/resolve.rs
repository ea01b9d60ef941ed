//! Configuration path resolution.
//!
//! Resolution order: CLI argument → environment variable → XDG config
//! directory → built-in defaults.

use crate::{validate, Config, ValidationError};
use std::path::{Path, PathBuf};

/// Where the active configuration came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicitly provided via CLI argument.
    CliArgument,

    /// Set via the CT_CONFIG environment variable.
    Environment,

    /// Found in the XDG config directory.
    XdgConfig,

    /// Using built-in defaults.
    #[default]
    BuiltinDefault,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::CliArgument => write!(f, "CLI argument"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::XdgConfig => write!(f, "XDG config"),
            ConfigSource::BuiltinDefault => write!(f, "builtin default"),
        }
    }
}

/// A loaded configuration plus provenance for diagnostics.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub config: Config,
    pub source: ConfigSource,
    pub path: Option<PathBuf>,
}

/// Environment variable naming a config file.
const ENV_CONFIG_PATH: &str = "CT_CONFIG";

/// Standard config file name.
const CONFIG_FILENAME: &str = "config.yaml";

/// Application name for XDG directories.
const APP_NAME: &str = "conjunction-triage";

/// Locate the config file using the standard resolution order. Returns
/// `None` when no file exists anywhere and defaults apply.
pub fn resolve_config_path(cli_path: Option<&Path>) -> (Option<PathBuf>, ConfigSource) {
    if let Some(path) = cli_path {
        return (Some(path.to_path_buf()), ConfigSource::CliArgument);
    }

    if let Ok(env_path) = std::env::var(ENV_CONFIG_PATH) {
        if !env_path.is_empty() {
            return (Some(PathBuf::from(env_path)), ConfigSource::Environment);
        }
    }

    if let Some(config_dir) = dirs::config_dir() {
        let candidate = config_dir.join(APP_NAME).join(CONFIG_FILENAME);
        if candidate.exists() {
            return (Some(candidate), ConfigSource::XdgConfig);
        }
    }

    (None, ConfigSource::BuiltinDefault)
}

/// Resolve, load, and validate configuration.
///
/// A CLI- or env-specified path that does not exist is an error; a missing
/// XDG file silently falls back to defaults.
pub fn load_resolved(cli_path: Option<&Path>) -> Result<ResolvedConfig, ValidationError> {
    let (path, source) = resolve_config_path(cli_path);
    let config = match &path {
        Some(p) => Config::load(p)?,
        None => {
            let config = Config::default();
            validate(&config)?;
            config
        }
    };
    Ok(ResolvedConfig {
        config,
        source,
        path,
    })
}
