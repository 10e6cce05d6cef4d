//! Export formatting
//!
//! Read-only dumps of filtered events, oldest first. CSV gets one row per
//! event with empty strings for absent optionals; JSON wraps the events in a
//! small envelope with the export instant and count.

use chrono::{DateTime, Utc};
use provlog_core::{format_timestamp, Event};
use serde::Serialize;

use crate::error::ApiError;

/// CSV column order: the 12 event fields in declaration order.
const CSV_HEADER: [&str; 12] = [
    "event_id",
    "agent_id",
    "action_type",
    "tool_name",
    "timestamp",
    "environment",
    "model_version",
    "prompt_version",
    "input_hash",
    "output_hash",
    "previous_event_hash",
    "event_hash",
];

/// Render events as CSV with a header row.
pub fn to_csv(events: &[Event]) -> Result<String, ApiError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(CSV_HEADER)
        .map_err(|e| ApiError::Internal(format!("csv write failed: {}", e)))?;

    for event in events {
        writer
            .write_record([
                event.event_id.to_string().as_str(),
                &event.agent_id,
                &event.action_type,
                event.tool_name.as_deref().unwrap_or(""),
                &format_timestamp(event.timestamp),
                event.environment.as_deref().unwrap_or(""),
                event.model_version.as_deref().unwrap_or(""),
                event.prompt_version.as_deref().unwrap_or(""),
                &event.input_hash,
                &event.output_hash,
                event.previous_event_hash.as_deref().unwrap_or(""),
                &event.event_hash,
            ])
            .map_err(|e| ApiError::Internal(format!("csv write failed: {}", e)))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ApiError::Internal(format!("csv write failed: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| ApiError::Internal(format!("csv encoding: {}", e)))
}

#[derive(Debug, Serialize)]
struct JsonExport<'a> {
    exported_at: DateTime<Utc>,
    total_events: usize,
    events: &'a [Event],
}

/// Render events as a JSON export envelope.
pub fn to_json(events: &[Event]) -> Result<String, ApiError> {
    let export = JsonExport {
        exported_at: Utc::now(),
        total_events: events.len(),
        events,
    };
    serde_json::to_string_pretty(&export)
        .map_err(|e| ApiError::Internal(format!("json export failed: {}", e)))
}

/// Timestamped attachment filename.
pub fn export_filename(now: DateTime<Utc>, extension: &str) -> String {
    format!("events_export_{}.{}", now.format("%Y%m%d_%H%M%S"), extension)
}
