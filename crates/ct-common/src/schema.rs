//! Schema versioning for serialized outputs.

/// Version stamped into serialized batch reports and assessments.
///
/// Bump the minor version for additive fields, the major version for
/// breaking changes to field meaning or removal.
pub const SCHEMA_VERSION: &str = "1.0.0";
