//! Deterministic canonical encoding of event fields
//!
//! The canonical encoding is the hinge of the whole ledger: any drift between
//! implementations (differing timestamp precision, omitted nulls, unsorted
//! keys) silently invalidates every downstream chain. Encoding goes through
//! RFC 8785 (JCS), which guarantees ascending code-point key order, no
//! whitespace, RFC 8259 string escaping and UTF-8 output.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Fixed timestamp layout: UTC, six fractional digits, explicit offset.
///
/// `2025-01-15T12:00:00.000000+00:00` (never `Z`, never fewer digits).
pub const TIMESTAMP_LAYOUT: &str = "%Y-%m-%dT%H:%M:%S%.6f+00:00";

/// The 11 hashable fields of an event.
///
/// Declaration order here is irrelevant: JCS sorts keys at encoding time.
/// Absent optionals must encode as JSON `null`, so no field carries a
/// `skip_serializing_if`.
#[derive(Debug, Serialize)]
pub struct HashInput<'a> {
    pub event_id: String,
    pub agent_id: &'a str,
    pub action_type: &'a str,
    pub tool_name: Option<&'a str>,
    pub timestamp: String,
    pub environment: Option<&'a str>,
    pub model_version: Option<&'a str>,
    pub prompt_version: Option<&'a str>,
    pub input_hash: &'a str,
    pub output_hash: &'a str,
    pub previous_event_hash: Option<&'a str>,
}

/// Render a UTC instant in the fixed canonical layout.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_LAYOUT).to_string()
}

/// Truncate an instant to microsecond precision.
///
/// Server clocks hand out nanoseconds; the ledger stores and hashes
/// microseconds, so the instant must be truncated once at generation time to
/// keep the stored value and the hashed rendering identical.
pub fn truncate_to_micros(ts: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_micros(ts.timestamp_micros()).unwrap_or(ts)
}

/// Produce the canonical byte string for hashing.
pub fn canonicalize(input: &HashInput<'_>) -> Result<Vec<u8>, serde_json::Error> {
    serde_jcs::to_vec(input)
}
