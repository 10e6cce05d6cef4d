//! Archive backend trait and record format

use async_trait::async_trait;
use chrono::NaiveDate;
use provlog_core::{format_timestamp, Event};
use serde::{Deserialize, Serialize};

/// Archive error types
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("archive io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("archive record error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid archive path component: {0}")]
    InvalidPath(String),
}

/// One archived event, as written to disk.
///
/// Field declaration order is the on-disk key order. The timestamp uses the
/// same fixed layout as the canonical hash encoding, so an archive line can
/// be re-verified without consulting the primary store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveRecord {
    pub event_id: String,
    pub agent_id: String,
    pub action_type: String,
    pub tool_name: Option<String>,
    pub timestamp: String,
    pub environment: Option<String>,
    pub model_version: Option<String>,
    pub prompt_version: Option<String>,
    pub input_hash: String,
    pub output_hash: String,
    pub previous_event_hash: Option<String>,
    pub event_hash: String,
}

impl ArchiveRecord {
    pub fn from_event(event: &Event) -> Self {
        Self {
            event_id: event.event_id.to_string(),
            agent_id: event.agent_id.clone(),
            action_type: event.action_type.clone(),
            tool_name: event.tool_name.clone(),
            timestamp: format_timestamp(event.timestamp),
            environment: event.environment.clone(),
            model_version: event.model_version.clone(),
            prompt_version: event.prompt_version.clone(),
            input_hash: event.input_hash.clone(),
            output_hash: event.output_hash.clone(),
            previous_event_hash: event.previous_event_hash.clone(),
            event_hash: event.event_hash.clone(),
        }
    }
}

/// Trait for archive sinks.
///
/// Implementations must be append-only: an event, once written, is never
/// rewritten or reordered. Selection between implementations happens at
/// configuration time; the file-backed archive is the single in-tree one.
#[async_trait]
pub trait ArchiveBackend: Send + Sync {
    /// Get the human-readable name of this backend.
    fn name(&self) -> &str;

    /// Append one event to the archive keyed by `(agent_id, UTC date)`.
    async fn write_event(&self, event: &Event) -> Result<(), ArchiveError>;

    /// Read all records for an agent and day, in append order.
    async fn read_events(
        &self,
        agent_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<ArchiveRecord>, ArchiveError>;

    /// Check whether the archive is writable.
    async fn check_health(&self) -> bool;
}
