//! Event grouping: raw CDM records into conjunction events.
//!
//! Two records describe the same encounter when their canonical object pair
//! matches and their TCA estimates fall within the configured tolerance.
//! TCA estimates drift between updates for one real encounter, so equality
//! is single-linkage clustering on TCA gaps within a pair, not exact match.
//!
//! Grouping is a pure transform with partial-failure semantics: malformed
//! records are rejected individually with a reason and never abort the
//! batch.

use chrono::Duration;
use ct_common::{CdmRecord, ConjunctionEvent, EventKey, ObjectPair};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// A record excluded from grouping, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RejectedRecord {
    pub message_id: Uuid,
    /// Position of the record in the input batch.
    pub index: usize,
    pub reason: String,
}

impl RejectedRecord {
    /// The data-quality error for this rejection, for unified reporting.
    pub fn to_error(&self) -> ct_common::Error {
        ct_common::Error::MalformedRecord {
            message_id: self.message_id.to_string(),
            reason: self.reason.clone(),
        }
    }
}

/// Result of grouping one batch.
#[derive(Debug, Clone)]
pub struct GroupingOutcome {
    /// Events in deterministic order (by key).
    pub events: Vec<ConjunctionEvent>,
    /// Per-record rejections; good records still group.
    pub rejected: Vec<RejectedRecord>,
}

/// Group a batch of records into conjunction events.
///
/// `tca_tolerance_secs` bounds the TCA gap between consecutive updates of
/// one encounter. Each accepted record lands in exactly one event.
pub fn group_records(records: &[CdmRecord], tca_tolerance_secs: i64) -> GroupingOutcome {
    let tolerance = Duration::seconds(tca_tolerance_secs);
    let mut rejected = Vec::new();
    let mut by_pair: HashMap<ObjectPair, Vec<(usize, CdmRecord)>> = HashMap::new();

    for (index, record) in records.iter().enumerate() {
        if let Err(reason) = validate_record(record) {
            rejected.push(RejectedRecord {
                message_id: record.message_id,
                index,
                reason,
            });
            continue;
        }
        let pair = ObjectPair::new(record.primary_id.trim(), record.secondary_id.trim());
        by_pair.entry(pair).or_default().push((index, record.clone()));
    }

    let mut events = Vec::new();
    for (pair, mut members) in by_pair {
        // Cluster on TCA: sorted by (tca, ingestion index), a gap wider than
        // the tolerance between consecutive records starts a new encounter.
        members.sort_by_key(|(index, record)| (record.tca, *index));

        let mut cluster: Vec<(usize, CdmRecord)> = Vec::new();
        for (index, record) in members {
            let split = cluster
                .last()
                .map(|(_, prev)| record.tca - prev.tca > tolerance)
                .unwrap_or(false);
            if split {
                events.extend(finish_cluster(&pair, std::mem::take(&mut cluster)));
            }
            cluster.push((index, record));
        }
        events.extend(finish_cluster(&pair, cluster));
    }

    events.sort_by_key(|event| event.key().to_string());
    GroupingOutcome { events, rejected }
}

fn finish_cluster(
    pair: &ObjectPair,
    mut cluster: Vec<(usize, CdmRecord)>,
) -> Option<ConjunctionEvent> {
    if cluster.is_empty() {
        return None;
    }
    let reference_tca = cluster
        .iter()
        .map(|(_, r)| r.tca)
        .min()
        .expect("cluster is non-empty");
    // Restore ingestion order so the event's stable creation-time sort
    // breaks ties by arrival, never by TCA or probability.
    cluster.sort_by_key(|(index, _)| *index);
    let records = cluster.into_iter().map(|(_, r)| r).collect();
    ConjunctionEvent::from_records(
        EventKey {
            pair: pair.clone(),
            reference_tca,
        },
        records,
    )
}

fn validate_record(record: &CdmRecord) -> Result<(), String> {
    if record.primary_id.trim().is_empty() {
        return Err("missing primary object designator".to_string());
    }
    if record.secondary_id.trim().is_empty() {
        return Err("missing secondary object designator".to_string());
    }
    if record.primary_id.trim() == record.secondary_id.trim() {
        return Err(format!(
            "primary and secondary designators are identical ({})",
            record.primary_id.trim()
        ));
    }
    let pc = record.collision_probability;
    if !pc.is_finite() || !(0.0..=1.0).contains(&pc) {
        return Err(format!("collision probability {pc} outside [0, 1]"));
    }
    let miss = record.miss_distance_m;
    if !miss.is_finite() || miss < 0.0 {
        return Err(format!("miss distance {miss} m is not a valid distance"));
    }
    Ok(())
}
