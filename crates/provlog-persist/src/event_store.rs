//! Event store trait and error types

use async_trait::async_trait;
use provlog_core::Event;
use uuid::Uuid;

/// Storage error types
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Uniqueness violation on `event_id` or `event_hash`. Fatal for the
    /// request that triggered it; retrying the same row is unsafe.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("query error: {0}")]
    Query(String),
}

/// Filters shared by the list and export reads.
#[derive(Debug, Default, Clone)]
pub struct EventFilter {
    pub agent_id: Option<String>,
    pub action_type: Option<String>,
    /// Inclusive lower bound, epoch microseconds.
    pub start_micros: Option<i64>,
    /// Inclusive upper bound, epoch microseconds.
    pub end_micros: Option<i64>,
}

/// 1-based pagination window.
#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub page: u32,
    pub page_size: u32,
}

impl Page {
    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.page_size)
    }
}

/// The transactional ordered collection of events.
///
/// Only the append coordinator writes; every other component reads. Reads
/// that feed chain verification must use the `(timestamp, event_id)`
/// ordering so that verification agrees with write order.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Insert one event. A uniqueness violation maps to
    /// [`StoreError::Conflict`].
    async fn insert(&self, event: &Event) -> Result<(), StoreError>;

    /// The `event_hash` of the most recent event for an agent, under
    /// `(timestamp DESC, event_id DESC)`. `None` when the chain is empty.
    async fn tip_hash(&self, agent_id: &str) -> Result<Option<String>, StoreError>;

    /// Fetch a single event by id.
    async fn get(&self, event_id: Uuid) -> Result<Option<Event>, StoreError>;

    /// Page through filtered events, newest first. Returns the page and the
    /// total match count.
    async fn list(&self, filter: &EventFilter, page: Page)
        -> Result<(Vec<Event>, u64), StoreError>;

    /// All events of one agent within an inclusive microsecond range,
    /// ordered `(timestamp ASC, event_id ASC)`, the verification ordering.
    async fn chain_range(
        &self,
        agent_id: &str,
        start_micros: Option<i64>,
        end_micros: Option<i64>,
    ) -> Result<Vec<Event>, StoreError>;

    /// Whether the agent has any event strictly before the given instant.
    async fn exists_before(&self, agent_id: &str, micros: i64) -> Result<bool, StoreError>;

    /// Filtered events ordered oldest first, for export dumps.
    async fn export_range(&self, filter: &EventFilter) -> Result<Vec<Event>, StoreError>;

    /// Liveness probe for health reporting.
    async fn is_healthy(&self) -> bool;
}
