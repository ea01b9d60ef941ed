//! Error types for Conjunction Triage.
//!
//! This module provides structured error handling with:
//! - Stable error codes for machine parsing
//! - Category classification for error grouping
//! - Recoverability hints for automation
//! - Remediation suggestions for humans
//!
//! Per-event failures (sequence construction, forecast numerics) are carried
//! inside batch outcomes and never abort sibling events; only configuration
//! and I/O errors terminate a run.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for Conjunction Triage operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Configuration file errors (thresholds, transforms, weights).
    Config,
    /// Malformed or unidentifiable CDM records.
    DataQuality,
    /// Feature sequence construction errors.
    Sequence,
    /// Forecast model and numerical errors.
    Forecast,
    /// File I/O and serialization errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::DataQuality => write!(f, "data_quality"),
            ErrorCategory::Sequence => write!(f, "sequence"),
            ErrorCategory::Forecast => write!(f, "forecast"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Unified error type for Conjunction Triage.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid threshold configuration: {0}")]
    InvalidThresholds(String),

    #[error("transform mismatch: model trained with {trained}, configured {configured}")]
    TransformMismatch { trained: String, configured: String },

    #[error("invalid model weights: {0}")]
    InvalidWeights(String),

    // Data quality errors (20-29)
    #[error("malformed CDM record {message_id}: {reason}")]
    MalformedRecord { message_id: String, reason: String },

    // Sequence errors (30-39)
    #[error("sequence construction failed for event {key}: {reason}")]
    SequenceConstruction { key: String, reason: String },

    // Forecast errors (40-49)
    #[error("forecast failed for event {key}: {reason}")]
    Forecast { key: String, reason: String },

    #[error("non-finite forecast output for event {key}")]
    NonFiniteForecast { key: String },

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the error code for this error type.
    ///
    /// Error codes are stable and grouped by category:
    /// - 10-19: Configuration errors
    /// - 20-29: Data quality errors
    /// - 30-39: Sequence errors
    /// - 40-49: Forecast errors
    /// - 60-69: I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::InvalidThresholds(_) => 11,
            Error::TransformMismatch { .. } => 12,
            Error::InvalidWeights(_) => 13,
            Error::MalformedRecord { .. } => 20,
            Error::SequenceConstruction { .. } => 30,
            Error::Forecast { .. } => 40,
            Error::NonFiniteForecast { .. } => 41,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_)
            | Error::InvalidThresholds(_)
            | Error::TransformMismatch { .. }
            | Error::InvalidWeights(_) => ErrorCategory::Config,

            Error::MalformedRecord { .. } => ErrorCategory::DataQuality,

            Error::SequenceConstruction { .. } => ErrorCategory::Sequence,

            Error::Forecast { .. } | Error::NonFiniteForecast { .. } => ErrorCategory::Forecast,

            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// Returns whether this error is potentially recoverable.
    pub fn is_recoverable(&self) -> bool {
        match self {
            // Config errors: recoverable by fixing config or weights files
            Error::Config(_) => true,
            Error::InvalidThresholds(_) => true,
            Error::TransformMismatch { .. } => true,
            Error::InvalidWeights(_) => true,

            // A malformed record stays malformed; skip it
            Error::MalformedRecord { .. } => false,

            // Sequence/forecast failures are per-event and final for that event
            Error::SequenceConstruction { .. } => false,
            Error::Forecast { .. } => false,
            Error::NonFiniteForecast { .. } => false,

            // I/O: often transient
            Error::Io(_) => true,
            Error::Json(_) => true,
        }
    }

    /// Returns a human-readable remediation hint.
    pub fn remediation(&self) -> &'static str {
        match self {
            Error::Config(_) => "Run 'ct-core check' to validate configuration.",
            Error::InvalidThresholds(_) => {
                "Ensure high_risk_pc > elevated_pc and both lie in (0, 1)."
            }
            Error::TransformMismatch { .. } => {
                "Set probability_transform in config to the transform named in the weights file metadata."
            }
            Error::InvalidWeights(_) => {
                "Check that the weights file matches the configured hidden size, layer count, and feature width."
            }
            Error::MalformedRecord { .. } => {
                "Fix or drop the offending record upstream; other records in the batch are unaffected."
            }
            Error::SequenceConstruction { .. } => {
                "The event carried no usable records. Check the upstream grouping input."
            }
            Error::Forecast { .. } | Error::NonFiniteForecast { .. } => {
                "The model produced unusable output for this event. Verify the weights file; no default probability is substituted."
            }
            Error::Io(_) => "Retry; if persistent, check paths and permissions.",
            Error::Json(_) => "Check that the input file is a JSON array of CDM records.",
        }
    }
}
