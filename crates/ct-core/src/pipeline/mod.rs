//! Batch orchestration: raw records through grouping, sequencing,
//! forecasting, and assessment.
//!
//! Events are processed independently; a failure in one event lands in that
//! event's outcome slot and never blocks siblings. The inference context
//! (model handle + config) is explicit and passed in, so callers and tests
//! control exactly which weights and thresholds apply.

use crate::assess::{assess, RiskAssessment, RiskStatus};
use crate::events::{event_names, Phase, ProgressEmitter, ProgressEvent};
use crate::forecast::{run_forecast, ForecastError, ForecastModel, ForecastResult};
use crate::grouping::{group_records, RejectedRecord};
use crate::sequence::build_sequence;
use chrono::{DateTime, Utc};
use ct_common::{CdmRecord, ConjunctionEvent, Error, EventKey, SCHEMA_VERSION};
use ct_config::Config;
use rand::rngs::StdRng;
use rand::SeedableRng;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Explicit inference context: model handle plus validated configuration,
/// threaded through every call rather than held in process-global state.
#[derive(Debug, Clone)]
pub struct InferenceContext {
    pub model: ForecastModel,
    pub config: Config,
}

impl InferenceContext {
    /// Build a context from configuration, loading weights from the
    /// configured path.
    pub fn from_config(config: Config) -> Result<Self, Error> {
        let Some(path) = config.model.weights_path.clone() else {
            return Err(Error::Config(
                "model.weights_path is required to run inference".to_string(),
            ));
        };
        let model = ForecastModel::from_weights_file(&path, &config.model)
            .map_err(load_error_to_common)?;
        Ok(InferenceContext { model, config })
    }

    /// Build a context around an already-constructed model (tests,
    /// embedded callers).
    pub fn with_model(model: ForecastModel, config: Config) -> Self {
        InferenceContext { model, config }
    }
}

fn load_error_to_common(e: ForecastError) -> Error {
    match e {
        ForecastError::WeightsIo(m) => Error::Config(m),
        ForecastError::InvalidWeights(m) => Error::InvalidWeights(m),
        ForecastError::TransformMismatch {
            trained,
            configured,
        } => Error::TransformMismatch {
            trained,
            configured,
        },
        ForecastError::NonFinite => {
            Error::InvalidWeights("weights produce non-finite output".to_string())
        }
    }
}

/// Caller-controlled knobs for one batch run.
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchOptions {
    /// The "now" used for hours-to-decision. `None` evaluates each event at
    /// its latest record's creation time (retrospective mode).
    pub as_of: Option<DateTime<Utc>>,
    /// Seed for Monte Carlo dropout; `None` draws from OS entropy.
    pub rng_seed: Option<u64>,
}

/// A fully assessed event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EventAssessment {
    pub key: EventKey,
    pub records_seen: usize,
    pub latest_observed_pc: f64,
    pub latest_miss_distance_m: f64,
    pub latest_tca: DateTime<Utc>,
    pub forecast: ForecastResult,
    pub assessment: RiskAssessment,
}

/// Per-event result: a complete assessment or an explicit error tag. There
/// is no silent best-guess fallback for numerical failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum EventOutcome {
    Assessed(EventAssessment),
    Failed {
        key: EventKey,
        error_code: u32,
        error: String,
    },
}

impl EventOutcome {
    pub fn key(&self) -> &EventKey {
        match self {
            EventOutcome::Assessed(a) => &a.key,
            EventOutcome::Failed { key, .. } => key,
        }
    }

    pub fn assessment(&self) -> Option<&EventAssessment> {
        match self {
            EventOutcome::Assessed(a) => Some(a),
            EventOutcome::Failed { .. } => None,
        }
    }
}

/// Batch-level aggregates for dashboards and quick status checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BatchSummary {
    pub schema_version: String,
    pub total_records: usize,
    pub rejected_records: usize,
    pub events_assessed: usize,
    pub events_failed: usize,
    pub escalating: usize,
    pub stable: usize,
    pub resolving: usize,
    pub past_deadline: usize,
    pub mean_certainty: f64,
}

/// Everything produced by one batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BatchReport {
    pub summary: BatchSummary,
    pub outcomes: Vec<EventOutcome>,
    pub rejected: Vec<RejectedRecord>,
}

/// Run the full pipeline over one batch of raw CDM records.
pub fn run_batch(
    records: &[CdmRecord],
    ctx: &InferenceContext,
    options: BatchOptions,
    emitter: Option<&dyn ProgressEmitter>,
) -> BatchReport {
    let emit = |event: ProgressEvent| {
        if let Some(e) = emitter {
            e.emit(event);
        }
    };

    emit(ProgressEvent::new(event_names::BATCH_STARTED, Phase::Batch)
        .with_progress(0, Some(records.len() as u64)));
    emit(ProgressEvent::new(
        event_names::GROUPING_STARTED,
        Phase::Group,
    ));

    let grouped = group_records(records, ctx.config.risk.tca_tolerance_secs);
    info!(
        events = grouped.events.len(),
        rejected = grouped.rejected.len(),
        "grouped CDM batch"
    );
    emit(
        ProgressEvent::new(event_names::GROUPING_COMPLETE, Phase::Group)
            .with_detail("events", grouped.events.len())
            .with_detail("rejected", grouped.rejected.len()),
    );

    let total = grouped.events.len() as u64;
    emit(ProgressEvent::new(event_names::FORECAST_STARTED, Phase::Forecast)
        .with_progress(0, Some(total)));

    let mut outcomes = Vec::with_capacity(grouped.events.len());
    for (i, event) in grouped.events.iter().enumerate() {
        outcomes.push(process_event(event, ctx, options, i as u64));
        emit(
            ProgressEvent::new(event_names::FORECAST_PROGRESS, Phase::Forecast)
                .with_progress(i as u64 + 1, Some(total)),
        );
    }
    emit(ProgressEvent::new(
        event_names::FORECAST_COMPLETE,
        Phase::Forecast,
    ));

    let summary = summarize(records.len(), &grouped.rejected, &outcomes);
    emit(
        ProgressEvent::new(event_names::ASSESS_COMPLETE, Phase::Assess)
            .with_detail("escalating", summary.escalating)
            .with_detail("past_deadline", summary.past_deadline),
    );
    emit(ProgressEvent::new(event_names::BATCH_COMPLETE, Phase::Batch));

    BatchReport {
        summary,
        outcomes,
        rejected: grouped.rejected,
    }
}

/// Assess one pre-grouped set of records sharing an event key. For callers
/// that group upstream; `prior_observed` carries a persisted prior
/// probability across process restarts.
pub fn assess_single(
    ctx: &InferenceContext,
    key: EventKey,
    records: Vec<CdmRecord>,
    options: BatchOptions,
    prior_observed: Option<f64>,
) -> Result<EventAssessment, Error> {
    let event = ConjunctionEvent::from_records(key.clone(), records).ok_or_else(|| {
        Error::SequenceConstruction {
            key: key.to_string(),
            reason: "event contains no records".to_string(),
        }
    })?;

    let sequence = build_sequence(
        &event,
        ctx.config.model.sequence_length,
        ctx.config.model.probability_transform,
    );
    let mut rng = make_rng(options.rng_seed, 0);
    let forecast = run_forecast(
        &ctx.model,
        &sequence,
        ctx.config.model.mc_passes,
        ctx.config.risk.certainty_decay,
        &mut rng,
    )
    .map_err(|e| run_error_to_common(e, &event))?;

    let as_of = options.as_of.unwrap_or_else(|| event.latest().created);
    let assessment = assess(&event, &forecast, &ctx.config.risk, as_of, prior_observed);
    Ok(build_assessment(&event, forecast, assessment))
}

fn process_event(
    event: &ConjunctionEvent,
    ctx: &InferenceContext,
    options: BatchOptions,
    index: u64,
) -> EventOutcome {
    let sequence = build_sequence(
        event,
        ctx.config.model.sequence_length,
        ctx.config.model.probability_transform,
    );
    debug!(
        key = %event.key(),
        records = event.len(),
        observed = sequence.observed_len(),
        mean_pc = sequence.mean_observed_probability(),
        "built feature sequence"
    );

    let mut rng = make_rng(options.rng_seed, index);
    match run_forecast(
        &ctx.model,
        &sequence,
        ctx.config.model.mc_passes,
        ctx.config.risk.certainty_decay,
        &mut rng,
    ) {
        Ok(forecast) => {
            let as_of = options.as_of.unwrap_or_else(|| event.latest().created);
            let assessment = assess(event, &forecast, &ctx.config.risk, as_of, None);
            EventOutcome::Assessed(build_assessment(event, forecast, assessment))
        }
        Err(e) => {
            let error = run_error_to_common(e, event);
            EventOutcome::Failed {
                key: event.key().clone(),
                error_code: error.code(),
                error: error.to_string(),
            }
        }
    }
}

fn build_assessment(
    event: &ConjunctionEvent,
    forecast: ForecastResult,
    assessment: RiskAssessment,
) -> EventAssessment {
    let latest = event.latest();
    EventAssessment {
        key: event.key().clone(),
        records_seen: event.len(),
        latest_observed_pc: latest.collision_probability,
        latest_miss_distance_m: latest.miss_distance_m,
        latest_tca: event.latest_tca(),
        forecast,
        assessment,
    }
}

fn run_error_to_common(e: ForecastError, event: &ConjunctionEvent) -> Error {
    let key = event.key().to_string();
    match e {
        ForecastError::NonFinite => Error::NonFiniteForecast { key },
        other => Error::Forecast {
            key,
            reason: other.to_string(),
        },
    }
}

fn make_rng(seed: Option<u64>, index: u64) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(index)),
        None => StdRng::from_os_rng(),
    }
}

fn summarize(
    total_records: usize,
    rejected: &[RejectedRecord],
    outcomes: &[EventOutcome],
) -> BatchSummary {
    let mut summary = BatchSummary {
        schema_version: SCHEMA_VERSION.to_string(),
        total_records,
        rejected_records: rejected.len(),
        events_assessed: 0,
        events_failed: 0,
        escalating: 0,
        stable: 0,
        resolving: 0,
        past_deadline: 0,
        mean_certainty: 0.0,
    };

    let mut certainties = Vec::new();
    for outcome in outcomes {
        match outcome {
            EventOutcome::Assessed(a) => {
                summary.events_assessed += 1;
                certainties.push(a.forecast.certainty);
                match a.assessment.status {
                    RiskStatus::Escalating => summary.escalating += 1,
                    RiskStatus::Stable => summary.stable += 1,
                    RiskStatus::Resolving => summary.resolving += 1,
                }
                if a.assessment.past_deadline {
                    summary.past_deadline += 1;
                }
            }
            EventOutcome::Failed { .. } => summary.events_failed += 1,
        }
    }
    summary.mean_certainty = ct_math::mean(&certainties);
    summary
}
