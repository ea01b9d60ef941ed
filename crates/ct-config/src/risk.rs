//! Risk policy thresholds.
//!
//! Two probability thresholds define the three-tier structure; the values
//! are configuration, the structure is not. These thresholds are consumed
//! exclusively by the risk interpreter — forecast and uncertainty stages
//! never see them.

use serde::{Deserialize, Serialize};

fn default_high_risk_pc() -> f64 {
    1e-4
}

fn default_elevated_pc() -> f64 {
    1e-5
}

fn default_critical_miss_distance_m() -> f64 {
    1000.0
}

fn default_reaction_time_hours() -> f64 {
    6.0
}

fn default_trend_epsilon() -> f64 {
    0.05
}

fn default_tca_tolerance_secs() -> i64 {
    3600
}

fn default_certainty_decay() -> f64 {
    100.0
}

/// Thresholds and allowances for interpreting forecasts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskPolicy {
    /// Collision probability at or above which an event is high risk.
    #[serde(default = "default_high_risk_pc")]
    pub high_risk_pc: f64,

    /// Collision probability at or above which an event is elevated.
    #[serde(default = "default_elevated_pc")]
    pub elevated_pc: f64,

    /// Miss distance in meters below which an event is high risk regardless
    /// of probability.
    #[serde(default = "default_critical_miss_distance_m")]
    pub critical_miss_distance_m: f64,

    /// Hours an operator needs to plan and execute an avoidance maneuver.
    #[serde(default = "default_reaction_time_hours")]
    pub reaction_time_hours: f64,

    /// Relative change below which consecutive observations count as a
    /// stable trend.
    #[serde(default = "default_trend_epsilon")]
    pub trend_epsilon: f64,

    /// Two records of the same pair whose TCAs differ by at most this many
    /// seconds describe the same encounter.
    #[serde(default = "default_tca_tolerance_secs")]
    pub tca_tolerance_secs: i64,

    /// Decay rate mapping forecast sample spread to certainty:
    /// certainty = 1 / (1 + decay * sigma).
    #[serde(default = "default_certainty_decay")]
    pub certainty_decay: f64,
}

impl Default for RiskPolicy {
    fn default() -> Self {
        RiskPolicy {
            high_risk_pc: default_high_risk_pc(),
            elevated_pc: default_elevated_pc(),
            critical_miss_distance_m: default_critical_miss_distance_m(),
            reaction_time_hours: default_reaction_time_hours(),
            trend_epsilon: default_trend_epsilon(),
            tca_tolerance_secs: default_tca_tolerance_secs(),
            certainty_decay: default_certainty_decay(),
        }
    }
}
