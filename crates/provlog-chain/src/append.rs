//! Append coordinator
//!
//! One append = lease → tip read → hash → insert → archive hand-off. The
//! primary store is authoritative: a failed insert aborts the append, a
//! failed archive write is logged and left to the reconciler.

use chrono::Utc;
use provlog_core::{compute_event_hash, truncate_to_micros, ChainError, Event, EventDraft};
use provlog_archive::ArchiveBackend;
use provlog_persist::{EventStore, StoreError};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use uuid::Uuid;

use crate::lease::LeaseMap;

/// Append error types
#[derive(Debug, thiserror::Error)]
pub enum AppendError {
    /// Primary-store uniqueness violation inside the critical section.
    /// Fatal for this request; the caller may regenerate and retry.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("store operation timed out")]
    Timeout,

    #[error(transparent)]
    Store(StoreError),

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error("append task aborted")]
    Aborted,
}

impl From<StoreError> for AppendError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict(msg) => AppendError::Conflict(msg),
            other => AppendError::Store(other),
        }
    }
}

struct AppendInner {
    store: Arc<dyn EventStore>,
    archive: Arc<dyn ArchiveBackend>,
    leases: LeaseMap,
    store_timeout: Duration,
    archive_timeout: Duration,
}

/// The append coordinator. Cheap to clone; all clones share one lease map.
#[derive(Clone)]
pub struct Appender {
    inner: Arc<AppendInner>,
}

impl Appender {
    pub fn new(store: Arc<dyn EventStore>, archive: Arc<dyn ArchiveBackend>) -> Self {
        Self::with_timeouts(store, archive, Duration::from_secs(10), Duration::from_secs(10))
    }

    pub fn with_timeouts(
        store: Arc<dyn EventStore>,
        archive: Arc<dyn ArchiveBackend>,
        store_timeout: Duration,
        archive_timeout: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(AppendInner {
                store,
                archive,
                leases: LeaseMap::default(),
                store_timeout,
                archive_timeout,
            }),
        }
    }

    /// Append one event to the caller's agent chain.
    ///
    /// `event_id` and `timestamp` are assigned here, never by the client.
    /// The critical section runs on its own task so a dropped request future
    /// cannot cancel it between tip read and archive hand-off.
    pub async fn append(&self, draft: EventDraft) -> Result<Event, AppendError> {
        let inner = self.inner.clone();
        let task = tokio::spawn(async move { inner.append_locked(draft).await });
        task.await.map_err(|_| AppendError::Aborted)?
    }
}

impl AppendInner {
    async fn append_locked(&self, draft: EventDraft) -> Result<Event, AppendError> {
        let _lease = self.leases.acquire(&draft.agent_id).await;

        // Assigned under the lease: the timestamp of each append must order
        // at or after the tip it links to, and concurrent waiters would
        // otherwise carry instants taken before their turn.
        let event_id = Uuid::new_v4();
        let timestamp = truncate_to_micros(Utc::now());

        let previous_event_hash = timeout(self.store_timeout, self.store.tip_hash(&draft.agent_id))
            .await
            .map_err(|_| AppendError::Timeout)??;

        let mut event = Event {
            event_id,
            agent_id: draft.agent_id,
            action_type: draft.action_type,
            tool_name: draft.tool_name,
            timestamp,
            environment: draft.environment,
            model_version: draft.model_version,
            prompt_version: draft.prompt_version,
            input_hash: draft.input_hash,
            output_hash: draft.output_hash,
            previous_event_hash,
            event_hash: String::new(),
        };
        event.event_hash = compute_event_hash(&event.hash_input())?;

        timeout(self.store_timeout, self.store.insert(&event))
            .await
            .map_err(|_| AppendError::Timeout)??;

        // The row is committed; an archive failure only degrades redundancy
        // and is reported through health checks and reconciliation.
        match timeout(self.archive_timeout, self.archive.write_event(&event)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!(agent_id = %event.agent_id, event_id = %event.event_id, error = %e,
                    "archive write failed after commit");
            }
            Err(_) => {
                tracing::warn!(agent_id = %event.agent_id, event_id = %event.event_id,
                    "archive write timed out after commit");
            }
        }

        Ok(event)
    }
}
