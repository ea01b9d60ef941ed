//! Risk interpretation: status, trend, and time of last opportunity.
//!
//! This is the single place thresholds are applied; the forecast and
//! uncertainty stages never embed threshold logic. All functions here are
//! pure decision logic over numeric inputs, with no learned parameters.

use chrono::{DateTime, Duration, Utc};
use ct_common::ConjunctionEvent;
use ct_config::RiskPolicy;
use crate::forecast::ForecastResult;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Absolute floor under the relative trend epsilon, so comparisons between
/// micro-probabilities still classify sensibly.
const TREND_EPSILON_FLOOR: f64 = 1e-12;

/// Overall direction of an event's risk narrative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskStatus {
    Stable,
    Escalating,
    Resolving,
}

impl std::fmt::Display for RiskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskStatus::Stable => write!(f, "STABLE"),
            RiskStatus::Escalating => write!(f, "ESCALATING"),
            RiskStatus::Resolving => write!(f, "RESOLVING"),
        }
    }
}

/// Direction of the two most recent observed probabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Trend::Increasing => write!(f, "INCREASING"),
            Trend::Decreasing => write!(f, "DECREASING"),
            Trend::Stable => write!(f, "STABLE"),
        }
    }
}

/// Probability tier under the two-threshold structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RiskTier {
    High,
    Elevated,
    Low,
}

/// Actionable signals derived for one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RiskAssessment {
    pub status: RiskStatus,
    pub trend: Trend,
    /// Hours until an operator must commit to a maneuver, floored at zero.
    pub hours_to_decision: f64,
    /// True when the reaction-time allowance already exceeds the time left
    /// before TCA; reported distinctly rather than clamped silently.
    pub past_deadline: bool,
    /// Signed decision margin in hours (negative once past deadline).
    pub decision_margin_hours: f64,
}

/// Classify the trend between the two most recent observed probabilities.
///
/// Strictly observation-vs-observation: comparing a forecast against an
/// observation would mix predicted and actual risk into one inconsistent
/// signal. `previous` is `None` when only one observation exists (or the
/// caller has no persisted prior), which reads as STABLE.
pub fn classify_trend(previous: Option<f64>, latest: f64, relative_epsilon: f64) -> Trend {
    let Some(previous) = previous else {
        return Trend::Stable;
    };
    let epsilon = (previous.abs() * relative_epsilon).max(TREND_EPSILON_FLOOR);
    if latest > previous + epsilon {
        Trend::Increasing
    } else if latest < previous - epsilon {
        Trend::Decreasing
    } else {
        Trend::Stable
    }
}

/// Hours of decision margin left at `as_of`, given the latest TCA estimate.
/// Negative means the reaction window has already closed.
pub fn decision_margin_hours(
    tca: DateTime<Utc>,
    reaction_time_hours: f64,
    as_of: DateTime<Utc>,
) -> f64 {
    let deadline = tca - Duration::milliseconds((reaction_time_hours * 3_600_000.0) as i64);
    (deadline - as_of).num_milliseconds() as f64 / 3_600_000.0
}

/// Derive the risk assessment for one event.
///
/// `as_of` is the caller's notion of "now" (wall clock, or the latest
/// record's creation time for retrospective runs). `prior_observed`
/// overrides the event-history prior probability when the caller persists
/// assessments across restarts; pass `None` to use the event's own history.
pub fn assess(
    event: &ConjunctionEvent,
    forecast: &ForecastResult,
    policy: &RiskPolicy,
    as_of: DateTime<Utc>,
    prior_observed: Option<f64>,
) -> RiskAssessment {
    let (history_prior, latest_observed) = event.observed_probability_pair();
    let previous = prior_observed.or(history_prior);
    let trend = classify_trend(previous, latest_observed, policy.trend_epsilon);

    // The tier considers both what was last reported and what the model
    // expects at TCA; trend never does.
    let risk_pc = forecast.forecast_probability.max(latest_observed);
    let miss = event.latest().miss_distance_m;
    let tier = if risk_pc >= policy.high_risk_pc || miss < policy.critical_miss_distance_m {
        RiskTier::High
    } else if risk_pc >= policy.elevated_pc {
        RiskTier::Elevated
    } else {
        RiskTier::Low
    };

    let status = match (tier, trend) {
        (RiskTier::High, _) => RiskStatus::Escalating,
        (RiskTier::Elevated, Trend::Increasing) => RiskStatus::Escalating,
        (RiskTier::Elevated, Trend::Decreasing) => RiskStatus::Resolving,
        (RiskTier::Elevated, Trend::Stable) => RiskStatus::Stable,
        (RiskTier::Low, Trend::Decreasing) => RiskStatus::Resolving,
        (RiskTier::Low, _) => RiskStatus::Stable,
    };

    let margin = decision_margin_hours(event.latest_tca(), policy.reaction_time_hours, as_of);

    RiskAssessment {
        status,
        trend,
        hours_to_decision: margin.max(0.0),
        past_deadline: margin < 0.0,
        decision_margin_hours: margin,
    }
}


#[cfg(test)]
mod properties {
    use super::*;
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    proptest! {
        /// A rise beyond the epsilon band always classifies INCREASING,
        /// never STABLE or DECREASING.
        #[test]
        fn trend_monotonic_on_rises(prev in 1e-9..0.5f64, factor in 1.2..100.0f64) {
            let latest = (prev * factor).min(1.0);
            prop_assume!(latest > prev + (prev * 0.05).max(1e-12));
            prop_assert_eq!(classify_trend(Some(prev), latest, 0.05), Trend::Increasing);
        }

        /// A drop below the prior never classifies INCREASING.
        #[test]
        fn drops_never_increase(prev in 1e-9..1.0f64, factor in 0.0..0.8f64) {
            let latest = prev * factor;
            prop_assert_ne!(classify_trend(Some(prev), latest, 0.05), Trend::Increasing);
        }

        /// past-deadline iff the reaction allowance consumes more time than
        /// remains before TCA.
        #[test]
        fn deadline_sign_matches_time_left(
            hours_to_tca in 0.0..200.0f64,
            reaction in 0.0..100.0f64,
        ) {
            // Keep clear of millisecond-truncation boundaries.
            prop_assume!((hours_to_tca - reaction).abs() > 1e-3);
            let as_of = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();
            let tca = as_of + Duration::milliseconds((hours_to_tca * 3_600_000.0) as i64);
            let margin = decision_margin_hours(tca, reaction, as_of);
            prop_assert_eq!(margin < 0.0, hours_to_tca < reaction);
        }
    }
}
