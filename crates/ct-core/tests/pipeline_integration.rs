//! End-to-end pipeline scenarios: raw CDM batches through grouping,
//! sequencing, forecasting, and assessment.

use chrono::{DateTime, TimeZone, Utc};
use ct_common::CdmRecord;
use ct_config::Config;
use ct_core::assess::{RiskStatus, Trend};
use ct_core::forecast::{ForecastModel, SkipLstmWeights};
use ct_core::pipeline::{run_batch, BatchOptions, EventOutcome, InferenceContext};
use ct_core::sequence::build_sequence;
use uuid::Uuid;

fn context() -> InferenceContext {
    let mut config = Config::default();
    config.model.hidden_size = 8;
    config.model.num_layers = 2;
    config.model.mc_passes = 8;
    let weights = SkipLstmWeights::seeded(
        config.model.hidden_size,
        config.model.num_layers,
        config.model.probability_transform,
        1234,
    );
    let model = ForecastModel::new(weights, &config.model).unwrap();
    InferenceContext::with_model(model, config)
}

fn record(
    primary: &str,
    secondary: &str,
    created: DateTime<Utc>,
    tca: DateTime<Utc>,
    pc: f64,
    miss_m: f64,
) -> CdmRecord {
    CdmRecord {
        message_id: Uuid::new_v4(),
        primary_id: primary.into(),
        secondary_id: secondary.into(),
        created,
        tca,
        miss_distance_m: miss_m,
        collision_probability: pc,
        primary: None,
        secondary: None,
    }
}

fn ts(day: u32, hour: u32, min: u32, sec: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 8, day, hour, min, sec).unwrap()
}

#[test]
fn ascending_event_escalates_with_four_hours_to_decide() {
    // Three updates rising to 5e-4, TCA 10 hours after the latest record,
    // reaction allowance 6h: INCREASING trend, ESCALATING status, 4 hours
    // to decide.
    let ctx = context();
    let tca = ts(2, 12, 0, 0);
    let batch = vec![
        record("25544", "48274", ts(1, 14, 0, 0), tca, 1e-6, 5000.0),
        record("25544", "48274", ts(1, 20, 0, 0), tca, 1e-5, 5000.0),
        record("25544", "48274", ts(2, 2, 0, 0), tca, 5e-4, 5000.0),
    ];
    let report = run_batch(
        &batch,
        &ctx,
        BatchOptions {
            rng_seed: Some(1),
            ..Default::default()
        },
        None,
    );

    assert_eq!(report.summary.events_assessed, 1);
    let assessed = report.outcomes[0].assessment().expect("assessed");
    assert_eq!(assessed.records_seen, 3);
    assert_eq!(assessed.assessment.trend, Trend::Increasing);
    assert_eq!(assessed.assessment.status, RiskStatus::Escalating);
    // as_of defaults to the latest record time (2026-08-02T02:00).
    assert!((assessed.assessment.hours_to_decision - 4.0).abs() < 1e-6);
    assert!(!assessed.assessment.past_deadline);
}

#[test]
fn single_record_event_is_padded_and_still_forecasts() {
    let ctx = context();
    let tca = ts(2, 12, 0, 0);
    let batch = vec![record("A", "B", ts(1, 0, 0, 0), tca, 1e-6, 5000.0)];
    let report = run_batch(
        &batch,
        &ctx,
        BatchOptions {
            rng_seed: Some(1),
            ..Default::default()
        },
        None,
    );

    assert_eq!(report.summary.events_assessed, 1);
    let assessed = report.outcomes[0].assessment().unwrap();
    assert_eq!(assessed.records_seen, 1);
    assert!((0.0..=1.0).contains(&assessed.forecast.forecast_probability));
    assert!((0.0..=1.0).contains(&assessed.forecast.certainty));
    // With no prior observation the trend reads stable.
    assert_eq!(assessed.assessment.trend, Trend::Stable);
}

#[test]
fn sequence_padding_mask_matches_record_count() {
    let ctx = context();
    let tca = ts(2, 12, 0, 0);
    let batch = vec![
        record("A", "B", ts(1, 0, 0, 0), tca, 1e-6, 5000.0),
        record("A", "B", ts(1, 6, 0, 0), tca, 2e-6, 5000.0),
    ];
    let report = run_batch(
        &batch,
        &ctx,
        BatchOptions {
            rng_seed: Some(1),
            ..Default::default()
        },
        None,
    );
    let assessed = report.outcomes[0].assessment().unwrap();
    assert_eq!(assessed.records_seen, 2);

    // Reconstruct the sequence the pipeline built: 5 long, 3 padded.
    let grouped = ct_core::grouping::group_records(&batch, 3600);
    let seq = build_sequence(
        &grouped.events[0],
        ctx.config.model.sequence_length,
        ctx.config.model.probability_transform,
    );
    assert_eq!(seq.len(), 5);
    assert_eq!(seq.observed_len(), 2);
    assert_eq!(seq.mask(), &[false, false, false, true, true]);
}

#[test]
fn tca_refinement_groups_but_distinct_encounters_split() {
    let ctx = context();
    let batch = vec![
        // Same encounter: TCA refined by 0.1s (sub-second drift lands in
        // the same second here; tolerance covers far larger drift).
        record("A", "B", ts(1, 0, 0, 0), ts(3, 12, 0, 0), 1e-6, 5000.0),
        record("A", "B", ts(1, 6, 0, 0), ts(3, 12, 0, 1), 2e-6, 5000.0),
        // Same pair, different encounter days later.
        record("A", "B", ts(1, 12, 0, 0), ts(9, 12, 0, 0), 1e-6, 5000.0),
    ];
    let report = run_batch(
        &batch,
        &ctx,
        BatchOptions {
            rng_seed: Some(1),
            ..Default::default()
        },
        None,
    );
    assert_eq!(report.summary.events_assessed, 2);
    let counts: Vec<usize> = report
        .outcomes
        .iter()
        .map(|o| o.assessment().unwrap().records_seen)
        .collect();
    assert!(counts.contains(&2) && counts.contains(&1));
}

#[test]
fn bad_records_do_not_block_good_events() {
    let ctx = context();
    let tca = ts(2, 12, 0, 0);
    let batch = vec![
        record("A", "B", ts(1, 0, 0, 0), tca, 1e-6, 5000.0),
        record("", "B", ts(1, 1, 0, 0), tca, 1e-6, 5000.0),
        record("C", "D", ts(1, 2, 0, 0), tca, 2.0, 5000.0),
        record("A", "B", ts(1, 6, 0, 0), tca, 2e-6, 5000.0),
    ];
    let report = run_batch(
        &batch,
        &ctx,
        BatchOptions {
            rng_seed: Some(1),
            ..Default::default()
        },
        None,
    );
    assert_eq!(report.summary.rejected_records, 2);
    assert_eq!(report.summary.events_assessed, 1);
    assert_eq!(report.rejected.len(), 2);
    assert!(report.rejected.iter().all(|r| !r.reason.is_empty()));
}

#[test]
fn past_deadline_event_is_flagged() {
    let ctx = context();
    // Latest record lands 2 hours before TCA; reaction time is 6 hours.
    let tca = ts(2, 12, 0, 0);
    let batch = vec![record("A", "B", ts(2, 10, 0, 0), tca, 1e-6, 5000.0)];
    let report = run_batch(
        &batch,
        &ctx,
        BatchOptions {
            rng_seed: Some(1),
            ..Default::default()
        },
        None,
    );
    let assessed = report.outcomes[0].assessment().unwrap();
    assert!(assessed.assessment.past_deadline);
    assert_eq!(assessed.assessment.hours_to_decision, 0.0);
    assert!(assessed.assessment.decision_margin_hours < 0.0);
    assert_eq!(report.summary.past_deadline, 1);
}

#[test]
fn explicit_as_of_overrides_record_time() {
    let ctx = context();
    let tca = ts(2, 12, 0, 0);
    let batch = vec![record("A", "B", ts(1, 0, 0, 0), tca, 1e-6, 5000.0)];
    // Evaluate 30 minutes before the maneuver deadline.
    let as_of = ts(2, 5, 30, 0);
    let report = run_batch(
        &batch,
        &ctx,
        BatchOptions {
            rng_seed: Some(1),
            as_of: Some(as_of),
        },
        None,
    );
    let assessed = report.outcomes[0].assessment().unwrap();
    assert!((assessed.assessment.hours_to_decision - 0.5).abs() < 1e-6);
}

#[test]
fn certainty_is_one_with_dropout_disabled() {
    let mut config = Config::default();
    config.model.hidden_size = 8;
    config.model.num_layers = 2;
    config.model.dropout = 0.0;
    config.model.mc_passes = 8;
    let weights = SkipLstmWeights::seeded(8, 2, config.model.probability_transform, 5);
    let ctx = InferenceContext::with_model(
        ForecastModel::new(weights, &config.model).unwrap(),
        config,
    );

    let tca = ts(2, 12, 0, 0);
    let batch = vec![record("A", "B", ts(1, 0, 0, 0), tca, 1e-5, 5000.0)];
    let report = run_batch(
        &batch,
        &ctx,
        BatchOptions {
            rng_seed: Some(1),
            ..Default::default()
        },
        None,
    );
    let assessed = report.outcomes[0].assessment().unwrap();
    assert_eq!(assessed.forecast.certainty, 1.0);
}

#[test]
fn report_serializes_with_stable_tags() {
    let ctx = context();
    let tca = ts(2, 12, 0, 0);
    let batch = vec![record("A", "B", ts(1, 0, 0, 0), tca, 5e-4, 500.0)];
    let report = run_batch(
        &batch,
        &ctx,
        BatchOptions {
            rng_seed: Some(1),
            ..Default::default()
        },
        None,
    );
    let json = serde_json::to_string(&report).unwrap();
    assert!(json.contains(r#""outcome":"assessed""#));
    assert!(json.contains(r#""status":"ESCALATING""#));
    assert!(json.contains(r#""schema_version":"1.0.0""#));

    let back: ct_core::pipeline::BatchReport = serde_json::from_str(&json).unwrap();
    assert_eq!(back, report);
    match &back.outcomes[0] {
        EventOutcome::Assessed(a) => assert_eq!(a.records_seen, 1),
        EventOutcome::Failed { .. } => panic!("expected assessed outcome"),
    }
}
