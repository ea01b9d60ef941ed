//! Semantic configuration validation.
//!
//! All checks here run once at startup. A configuration that passes
//! `validate` cannot later produce a threshold or transform error during
//! per-event processing.

use crate::Config;
use thiserror::Error;

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Configuration validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Semantic validation failed: {0}")]
    SemanticError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::IoError(_) => 60,
            ValidationError::ParseError(_) => 61,
            ValidationError::SemanticError(_) => 63,
            ValidationError::InvalidValue { .. } => 65,
        }
    }
}

/// Validate the full configuration semantically.
pub fn validate(config: &Config) -> ValidationResult<()> {
    validate_risk(config)?;
    validate_model(config)?;
    Ok(())
}

fn validate_risk(config: &Config) -> ValidationResult<()> {
    let risk = &config.risk;

    for (field, value) in [
        ("risk.high_risk_pc", risk.high_risk_pc),
        ("risk.elevated_pc", risk.elevated_pc),
    ] {
        if !value.is_finite() || value <= 0.0 || value >= 1.0 {
            return Err(ValidationError::InvalidValue {
                field: field.to_string(),
                message: format!("must lie in (0, 1), got {value}"),
            });
        }
    }

    // The two-threshold three-tier structure requires strict ordering.
    if risk.high_risk_pc <= risk.elevated_pc {
        return Err(ValidationError::SemanticError(format!(
            "high_risk_pc ({}) must exceed elevated_pc ({})",
            risk.high_risk_pc, risk.elevated_pc
        )));
    }

    if !risk.critical_miss_distance_m.is_finite() || risk.critical_miss_distance_m < 0.0 {
        return Err(ValidationError::InvalidValue {
            field: "risk.critical_miss_distance_m".to_string(),
            message: format!("must be non-negative, got {}", risk.critical_miss_distance_m),
        });
    }

    if !risk.reaction_time_hours.is_finite() || risk.reaction_time_hours < 0.0 {
        return Err(ValidationError::InvalidValue {
            field: "risk.reaction_time_hours".to_string(),
            message: format!("must be non-negative, got {}", risk.reaction_time_hours),
        });
    }

    if !risk.trend_epsilon.is_finite() || risk.trend_epsilon < 0.0 {
        return Err(ValidationError::InvalidValue {
            field: "risk.trend_epsilon".to_string(),
            message: format!("must be non-negative, got {}", risk.trend_epsilon),
        });
    }

    if risk.tca_tolerance_secs <= 0 {
        return Err(ValidationError::InvalidValue {
            field: "risk.tca_tolerance_secs".to_string(),
            message: format!("must be positive, got {}", risk.tca_tolerance_secs),
        });
    }

    if !risk.certainty_decay.is_finite() || risk.certainty_decay <= 0.0 {
        return Err(ValidationError::InvalidValue {
            field: "risk.certainty_decay".to_string(),
            message: format!("must be positive, got {}", risk.certainty_decay),
        });
    }

    Ok(())
}

fn validate_model(config: &Config) -> ValidationResult<()> {
    let model = &config.model;

    if model.sequence_length == 0 {
        return Err(ValidationError::InvalidValue {
            field: "model.sequence_length".to_string(),
            message: "must be at least 1".to_string(),
        });
    }

    if model.hidden_size == 0 || model.num_layers == 0 {
        return Err(ValidationError::InvalidValue {
            field: "model.hidden_size/num_layers".to_string(),
            message: "must be at least 1".to_string(),
        });
    }

    if !model.dropout.is_finite() || !(0.0..1.0).contains(&model.dropout) {
        return Err(ValidationError::InvalidValue {
            field: "model.dropout".to_string(),
            message: format!("must lie in [0, 1), got {}", model.dropout),
        });
    }

    if model.mc_passes == 0 {
        return Err(ValidationError::InvalidValue {
            field: "model.mc_passes".to_string(),
            message: "must be at least 1".to_string(),
        });
    }

    Ok(())
}
