//! Feature sequence construction.
//!
//! One conjunction event becomes one fixed-length, right-aligned sequence of
//! feature vectors, most recent observation last. Events shorter than the
//! configured length are left-padded with sentinel rows; an explicit mask
//! records which positions are real so no downstream aggregation ever treats
//! padding as a genuine low-risk observation.

use ct_common::ConjunctionEvent;
use ct_math::{log_miss_distance, masked_mean, ProbabilityTransform};

/// Features per sequence step.
pub const FEATURES_PER_STEP: usize = 4;

/// Collision probability in the configured transform scale.
pub const FEATURE_PROBABILITY: usize = 0;
/// log10 miss distance in meters.
pub const FEATURE_MISS_DISTANCE: usize = 1;
/// Hours from record creation to TCA, clamped at zero once past.
pub const FEATURE_HOURS_TO_TCA: usize = 2;
/// 1.0 on sentinel (padded) rows, 0.0 on real observations.
pub const FEATURE_PADDING_FLAG: usize = 3;

/// A fixed-length feature matrix plus its padding mask.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSequence {
    rows: Vec<[f64; FEATURES_PER_STEP]>,
    /// true = real observation, false = padding. Right-aligned, so padding
    /// is always a (possibly empty) prefix.
    mask: Vec<bool>,
    transform: ProbabilityTransform,
}

impl FeatureSequence {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[[f64; FEATURES_PER_STEP]] {
        &self.rows
    }

    pub fn mask(&self) -> &[bool] {
        &self.mask
    }

    /// Transform the probability feature was built with. The model checks
    /// this against its trained scale before consuming the sequence.
    pub fn transform(&self) -> ProbabilityTransform {
        self.transform
    }

    /// Number of real (unpadded) observations.
    pub fn observed_len(&self) -> usize {
        self.mask.iter().filter(|m| **m).count()
    }

    /// The most recent real observation. Sequences are right-aligned and
    /// built from non-empty events, so this is the final row.
    pub fn latest_row(&self) -> &[f64; FEATURES_PER_STEP] {
        self.rows.last().expect("sequences are never zero-length")
    }

    /// Mean transformed probability over real observations only.
    pub fn mean_observed_probability(&self) -> f64 {
        let values: Vec<f64> = self.rows.iter().map(|r| r[FEATURE_PROBABILITY]).collect();
        masked_mean(&values, &self.mask)
    }
}

/// Build the feature sequence for one event.
///
/// Records are already creation-time ascending (event invariant). Keeps the
/// most recent `length` records, left-pads shorter histories, and applies
/// `transform` to the probability channel. The same transform must be used
/// at training and inference; callers validate that pairing at model load.
pub fn build_sequence(
    event: &ConjunctionEvent,
    length: usize,
    transform: ProbabilityTransform,
) -> FeatureSequence {
    let records = event.records();
    let take = records.len().min(length);
    let recent = &records[records.len() - take..];

    let mut rows = Vec::with_capacity(length);
    let mut mask = Vec::with_capacity(length);

    for _ in 0..length - take {
        let mut sentinel = [0.0; FEATURES_PER_STEP];
        sentinel[FEATURE_PADDING_FLAG] = 1.0;
        rows.push(sentinel);
        mask.push(false);
    }

    for record in recent {
        rows.push([
            transform.apply(record.collision_probability),
            log_miss_distance(record.miss_distance_m),
            record.hours_to_tca().max(0.0),
            0.0,
        ]);
        mask.push(true);
    }

    FeatureSequence {
        rows,
        mask,
        transform,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use ct_common::{CdmRecord, EventKey, ObjectPair};
    use uuid::Uuid;

    fn event(pcs: &[f64]) -> ConjunctionEvent {
        let tca = Utc.with_ymd_and_hms(2026, 5, 2, 12, 0, 0).unwrap();
        let records = pcs
            .iter()
            .enumerate()
            .map(|(i, pc)| CdmRecord {
                message_id: Uuid::new_v4(),
                primary_id: "25544".into(),
                secondary_id: "48274".into(),
                created: Utc.with_ymd_and_hms(2026, 5, 1, i as u32, 0, 0).unwrap(),
                tca,
                miss_distance_m: 900.0,
                collision_probability: *pc,
                primary: None,
                secondary: None,
            })
            .collect();
        ConjunctionEvent::from_records(
            EventKey {
                pair: ObjectPair::new("25544", "48274"),
                reference_tca: tca,
            },
            records,
        )
        .unwrap()
    }

    #[test]
    fn short_event_left_pads_to_length() {
        let seq = build_sequence(&event(&[1e-6]), 5, ProbabilityTransform::Log10);
        assert_eq!(seq.len(), 5);
        assert_eq!(seq.mask(), &[false, false, false, false, true]);
        assert_eq!(seq.observed_len(), 1);
        for row in &seq.rows()[..4] {
            assert_eq!(row[FEATURE_PADDING_FLAG], 1.0);
            assert_eq!(row[FEATURE_PROBABILITY], 0.0);
        }
        assert_eq!(seq.rows()[4][FEATURE_PADDING_FLAG], 0.0);
    }

    #[test]
    fn long_event_keeps_most_recent() {
        let seq = build_sequence(
            &event(&[1e-8, 1e-7, 1e-6, 1e-5, 1e-4, 1e-3]),
            5,
            ProbabilityTransform::Log10,
        );
        assert_eq!(seq.len(), 5);
        assert_eq!(seq.observed_len(), 5);
        // Oldest record dropped; newest is last.
        assert!((seq.rows()[0][FEATURE_PROBABILITY] - (-7.0)).abs() < 1e-12);
        assert!((seq.latest_row()[FEATURE_PROBABILITY] - (-3.0)).abs() < 1e-12);
    }

    #[test]
    fn hours_to_tca_descend_and_clamp() {
        let seq = build_sequence(&event(&[1e-6, 1e-6, 1e-6]), 3, ProbabilityTransform::Log10);
        let hours: Vec<f64> = seq
            .rows()
            .iter()
            .map(|r| r[FEATURE_HOURS_TO_TCA])
            .collect();
        assert!(hours[0] > hours[1] && hours[1] > hours[2]);
        assert!(hours.iter().all(|h| *h >= 0.0));
    }

    #[test]
    fn raw_transform_passes_probability_through() {
        let seq = build_sequence(&event(&[3e-4]), 2, ProbabilityTransform::Raw);
        assert_eq!(seq.latest_row()[FEATURE_PROBABILITY], 3e-4);
        assert_eq!(seq.transform(), ProbabilityTransform::Raw);
    }

    #[test]
    fn mean_observed_probability_ignores_padding() {
        let seq = build_sequence(&event(&[1e-4]), 5, ProbabilityTransform::Log10);
        // One real observation at log10(1e-4) = -4; padded zeros must not
        // drag the mean toward zero.
        assert!((seq.mean_observed_probability() - (-4.0)).abs() < 1e-12);
    }

    #[test]
    fn padding_count_matches_history_length() {
        // length 5: an N-record event pads exactly 5 - min(N, 5) leading
        // positions.
        for n in 1..=10usize {
            let pcs = vec![1e-6; n];
            let seq = build_sequence(&event(&pcs), 5, ProbabilityTransform::Log10);
            assert_eq!(seq.len(), 5);
            assert_eq!(seq.observed_len(), n.min(5));
            let padded = seq.mask().iter().filter(|m| !**m).count();
            assert_eq!(padded, 5 - n.min(5));
            // Padding is strictly a prefix.
            assert!(seq.mask()[5 - n.min(5)..].iter().all(|m| *m));
        }
    }

    #[test]
    fn exact_length_event_has_no_padding() {
        let seq = build_sequence(&event(&[1e-6, 1e-5]), 2, ProbabilityTransform::Log10);
        assert_eq!(seq.observed_len(), 2);
        assert!(seq.mask().iter().all(|m| *m));
    }
}
