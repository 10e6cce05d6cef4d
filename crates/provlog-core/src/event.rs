//! Ledger event types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::canonical::{format_timestamp, HashInput};

/// A single ledger event.
///
/// Events are immutable once persisted. `event_hash` is the SHA-256 of the
/// canonical encoding of all other fields; `previous_event_hash` links to the
/// prior event of the same agent (absent for the genesis event of a chain).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub event_id: Uuid,
    pub agent_id: String,
    pub action_type: String,
    pub tool_name: Option<String>,
    /// Server-assigned UTC instant, microsecond precision.
    pub timestamp: DateTime<Utc>,
    pub environment: Option<String>,
    pub model_version: Option<String>,
    pub prompt_version: Option<String>,
    /// SHA-256 of the caller-side input plaintext, 64 lowercase hex chars.
    pub input_hash: String,
    /// SHA-256 of the caller-side output plaintext, 64 lowercase hex chars.
    pub output_hash: String,
    pub previous_event_hash: Option<String>,
    pub event_hash: String,
}

impl Event {
    /// The canonical hashing view of this event (all fields except
    /// `event_hash`).
    pub fn hash_input(&self) -> HashInput<'_> {
        HashInput {
            event_id: self.event_id.to_string(),
            agent_id: &self.agent_id,
            action_type: &self.action_type,
            tool_name: self.tool_name.as_deref(),
            timestamp: format_timestamp(self.timestamp),
            environment: self.environment.as_deref(),
            model_version: self.model_version.as_deref(),
            prompt_version: self.prompt_version.as_deref(),
            input_hash: &self.input_hash,
            output_hash: &self.output_hash,
            previous_event_hash: self.previous_event_hash.as_deref(),
        }
    }

    /// Epoch microseconds of the event timestamp.
    pub fn timestamp_micros(&self) -> i64 {
        self.timestamp.timestamp_micros()
    }
}

/// The caller-supplied payload of a new event.
///
/// Carries no timestamp, no IDs and no chain hashes; those are assigned by
/// the append coordinator. Fields are expected to be validated and
/// normalized (lowercase digests) before a draft is constructed.
#[derive(Debug, Clone)]
pub struct EventDraft {
    pub agent_id: String,
    pub action_type: String,
    pub tool_name: Option<String>,
    pub environment: Option<String>,
    pub model_version: Option<String>,
    pub prompt_version: Option<String>,
    pub input_hash: String,
    pub output_hash: String,
}
