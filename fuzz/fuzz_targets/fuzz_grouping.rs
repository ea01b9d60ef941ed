//! Fuzz target for event grouping.
//!
//! Grouping must never panic: malformed records are rejected per-record and
//! every accepted record lands in exactly one event.

#![no_main]

use arbitrary::Arbitrary;
use chrono::{TimeZone, Utc};
use ct_common::CdmRecord;
use ct_core::grouping::group_records;
use libfuzzer_sys::fuzz_target;
use uuid::Uuid;

#[derive(Debug, Arbitrary)]
struct RawRecord {
    primary: String,
    secondary: String,
    created_secs: u32,
    tca_secs: u32,
    miss_distance_m: f64,
    collision_probability: f64,
}

fuzz_target!(|raw: Vec<RawRecord>| {
    let records: Vec<CdmRecord> = raw
        .iter()
        .map(|r| CdmRecord {
            message_id: Uuid::nil(),
            primary_id: r.primary.clone(),
            secondary_id: r.secondary.clone(),
            created: Utc.timestamp_opt(r.created_secs as i64, 0).unwrap(),
            tca: Utc.timestamp_opt(r.tca_secs as i64, 0).unwrap(),
            miss_distance_m: r.miss_distance_m,
            collision_probability: r.collision_probability,
            primary: None,
            secondary: None,
        })
        .collect();

    let outcome = group_records(&records, 3600);
    let grouped: usize = outcome.events.iter().map(|e| e.len()).sum();
    assert_eq!(grouped + outcome.rejected.len(), records.len());
});
