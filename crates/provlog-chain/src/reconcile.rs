//! Archive reconciliation
//!
//! Cross-checks one agent-day of primary-store rows against the archive
//! file. Read-only on both sides. Events present only in the archive are not
//! reported: the primary store is authoritative.

use chrono::NaiveDate;
use provlog_archive::{ArchiveBackend, ArchiveError};
use provlog_persist::{EventStore, StoreError};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Reconciliation error types (infrastructure, not divergence).
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Archive(#[from] ArchiveError),
}

/// The outcome of one agent-day reconciliation.
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileReport {
    pub agent_id: String,
    pub date: String,
    pub is_valid: bool,
    pub db_events: u64,
    pub archive_events: u64,
    pub mismatches: u64,
    pub missing_in_archive: u64,
    pub error_message: Option<String>,
}

/// Store-vs-archive reconciler.
pub struct Reconciler {
    store: Arc<dyn EventStore>,
    archive: Arc<dyn ArchiveBackend>,
}

impl Reconciler {
    pub fn new(store: Arc<dyn EventStore>, archive: Arc<dyn ArchiveBackend>) -> Self {
        Self { store, archive }
    }

    pub async fn reconcile(
        &self,
        agent_id: &str,
        date: NaiveDate,
    ) -> Result<ReconcileReport, ReconcileError> {
        let day_start = date
            .and_hms_micro_opt(0, 0, 0, 0)
            .map(|t| t.and_utc().timestamp_micros());
        let day_end = date
            .and_hms_micro_opt(23, 59, 59, 999_999)
            .map(|t| t.and_utc().timestamp_micros());

        let db_events = self.store.chain_range(agent_id, day_start, day_end).await?;
        let archive_records = self.archive.read_events(agent_id, date).await?;

        let by_hash: HashMap<&str, &provlog_archive::ArchiveRecord> = archive_records
            .iter()
            .map(|r| (r.event_hash.as_str(), r))
            .collect();

        let mut missing_in_archive: u64 = 0;
        let mut mismatches: u64 = 0;
        for event in &db_events {
            match by_hash.get(event.event_hash.as_str()) {
                None => missing_in_archive += 1,
                Some(record) if record.event_id != event.event_id.to_string() => mismatches += 1,
                Some(_) => {}
            }
        }

        let is_valid = missing_in_archive == 0 && mismatches == 0;
        let error_message = if is_valid {
            None
        } else {
            let mut parts = Vec::new();
            if missing_in_archive > 0 {
                parts.push(format!("{} events missing from archive", missing_in_archive));
            }
            if mismatches > 0 {
                parts.push(format!("{} hash mismatches", mismatches));
            }
            Some(parts.join("; "))
        };

        Ok(ReconcileReport {
            agent_id: agent_id.to_string(),
            date: date.format("%Y-%m-%d").to_string(),
            is_valid,
            db_events: db_events.len() as u64,
            archive_events: archive_records.len() as u64,
            mismatches,
            missing_in_archive,
            error_message,
        })
    }
}
