//! CDM record and conjunction event identity types.
//!
//! A conjunction event is identified by (object pair, reference TCA). The
//! pair is canonically ordered so (A,B) and (B,A) name the same encounter,
//! and TCA equality is tolerance-based (handled by the grouper) because TCA
//! estimates legitimately drift between updates for the same encounter.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Radar cross-section class, when the data source reports one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RcsClass {
    Small,
    Medium,
    Large,
}

/// Optional physical attributes for one object in a conjunction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ObjectAttributes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mass_kg: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rcs_class: Option<RcsClass>,
}

/// One CDM snapshot update. Immutable once ingested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CdmRecord {
    /// Message identifier assigned at ingestion.
    pub message_id: Uuid,
    /// Catalog designator of the primary object.
    pub primary_id: String,
    /// Catalog designator of the secondary object.
    pub secondary_id: String,
    /// When this snapshot was issued.
    pub created: DateTime<Utc>,
    /// Predicted time of closest approach.
    pub tca: DateTime<Utc>,
    /// Predicted minimum separation at TCA, meters.
    pub miss_distance_m: f64,
    /// Estimated probability of collision at TCA, in [0, 1].
    pub collision_probability: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary: Option<ObjectAttributes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary: Option<ObjectAttributes>,
}

impl CdmRecord {
    /// Hours between this record's creation and its TCA. Negative when the
    /// record was issued after the predicted closest approach.
    pub fn hours_to_tca(&self) -> f64 {
        (self.tca - self.created).num_milliseconds() as f64 / 3_600_000.0
    }
}

/// Canonically ordered object pair: `ObjectPair::new("B", "A")` equals
/// `ObjectPair::new("A", "B")`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct ObjectPair {
    lower: String,
    higher: String,
}

impl ObjectPair {
    pub fn new(a: impl Into<String>, b: impl Into<String>) -> Self {
        let (a, b) = (a.into(), b.into());
        if a <= b {
            ObjectPair { lower: a, higher: b }
        } else {
            ObjectPair { lower: b, higher: a }
        }
    }

    pub fn lower(&self) -> &str {
        &self.lower
    }

    pub fn higher(&self) -> &str {
        &self.higher
    }
}

impl std::fmt::Display for ObjectPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}~{}", self.lower, self.higher)
    }
}

/// Identity of one predicted encounter: canonical pair plus the reference
/// TCA of the cluster (the earliest clustered record's TCA). Records whose
/// TCA drifts within the configured tolerance share this key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct EventKey {
    pub pair: ObjectPair,
    pub reference_tca: DateTime<Utc>,
}

impl std::fmt::Display for EventKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.pair, self.reference_tca.to_rfc3339())
    }
}

/// All snapshots describing one encounter, creation-time ascending.
///
/// Invariants: non-empty; order is creation-time ascending with ties kept in
/// ingestion order; the TCA used downstream is the latest record's TCA.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ConjunctionEvent {
    key: EventKey,
    records: Vec<CdmRecord>,
}

impl ConjunctionEvent {
    /// Build an event from records in ingestion order. Sorts stably by
    /// creation time; returns `None` for an empty record list (an invariant
    /// violation at the grouping layer, not a valid event).
    pub fn from_records(key: EventKey, mut records: Vec<CdmRecord>) -> Option<Self> {
        if records.is_empty() {
            return None;
        }
        records.sort_by_key(|r| r.created);
        Some(ConjunctionEvent { key, records })
    }

    pub fn key(&self) -> &EventKey {
        &self.key
    }

    pub fn records(&self) -> &[CdmRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The most recent snapshot.
    pub fn latest(&self) -> &CdmRecord {
        self.records.last().expect("event is non-empty")
    }

    /// Latest TCA estimate; supersedes earlier estimates downstream.
    pub fn latest_tca(&self) -> DateTime<Utc> {
        self.latest().tca
    }

    /// The two most recent observed probabilities as (previous, latest).
    /// `previous` is `None` for single-record events.
    pub fn observed_probability_pair(&self) -> (Option<f64>, f64) {
        let latest = self.latest().collision_probability;
        let previous = if self.records.len() >= 2 {
            Some(self.records[self.records.len() - 2].collision_probability)
        } else {
            None
        };
        (previous, latest)
    }
}
