//! Conjunction Triage common types and errors.
//!
//! This crate provides foundational types shared across ct-core modules:
//! - CDM record and conjunction event types with identity guarantees
//! - Common error types with stable codes
//! - Output format specifications
//! - Schema versioning

pub mod cdm;
pub mod error;
pub mod output;
pub mod schema;

pub use cdm::{CdmRecord, ConjunctionEvent, EventKey, ObjectAttributes, ObjectPair, RcsClass};
pub use error::{Error, ErrorCategory, Result};
pub use output::OutputFormat;
pub use schema::SCHEMA_VERSION;
