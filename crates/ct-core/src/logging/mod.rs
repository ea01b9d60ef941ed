//! Structured logging foundation for ct-core.
//!
//! Dual-mode logging:
//! - Human-readable console output for interactive use
//! - Machine-parseable JSONL for agent workflows
//!
//! stdout is reserved for command payloads (reports, schemas); all log
//! output goes to stderr. Level resolution: CLI flag, then `CT_LOG`, then
//! `RUST_LOG`, then the default.

use serde::{Deserialize, Serialize};
use std::io::IsTerminal;
use tracing_subscriber::EnvFilter;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable console format (default).
    #[default]
    Human,
    /// Machine-parseable JSON lines.
    Jsonl,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" | "console" | "pretty" => Ok(LogFormat::Human),
            "jsonl" | "json" | "structured" | "machine" => Ok(LogFormat::Jsonl),
            _ => Err(format!("unknown log format: {}", s)),
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Human => write!(f, "human"),
            LogFormat::Jsonl => write!(f, "jsonl"),
        }
    }
}

/// Logging configuration resolved from CLI flags and environment.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Filter directive, e.g. "info" or "ct_core=debug".
    pub filter: String,
    pub format: LogFormat,
    /// Force-disable ANSI colors (also disabled when stderr is not a tty).
    pub no_color: bool,
}

impl LogConfig {
    /// Resolve from optional CLI overrides plus environment variables.
    pub fn from_env(cli_level: Option<&str>, cli_format: Option<LogFormat>) -> Self {
        let filter = cli_level
            .map(str::to_string)
            .or_else(|| std::env::var("CT_LOG").ok().filter(|v| !v.is_empty()))
            .or_else(|| std::env::var("RUST_LOG").ok().filter(|v| !v.is_empty()))
            .unwrap_or_else(|| "info".to_string());
        let format = cli_format
            .or_else(|| {
                std::env::var("CT_LOG_FORMAT")
                    .ok()
                    .and_then(|v| v.parse().ok())
            })
            .unwrap_or_default();
        LogConfig {
            filter,
            format,
            no_color: false,
        }
    }
}

/// Initialize the global tracing subscriber. Call once at startup; later
/// calls are ignored (the first subscriber wins).
pub fn init_logging(config: &LogConfig) {
    let filter = EnvFilter::try_new(&config.filter)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let ansi = !config.no_color && std::io::stderr().is_terminal();

    let result = match config.format {
        LogFormat::Human => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_ansi(ansi)
            .try_init(),
        LogFormat::Jsonl => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init(),
    };
    // Already-initialized is fine (tests, embedding callers).
    let _ = result;
}
