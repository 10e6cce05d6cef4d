//! Chain verification
//!
//! Recomputes every content hash and re-walks the linkage for one agent,
//! stopping at the first divergence. Verification failures are data, not
//! errors: the verdict always comes back `Ok` unless the store itself fails.

use chrono::{DateTime, Utc};
use provlog_core::{verify_event, ChainError};
use provlog_persist::{EventStore, StoreError};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// Verification error types (infrastructure, not chain state).
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Chain(#[from] ChainError),
}

/// The outcome of a chain verification.
#[derive(Debug, Clone, Serialize)]
pub struct ChainVerdict {
    pub is_valid: bool,
    pub events_checked: u64,
    pub first_invalid_event_id: Option<Uuid>,
    pub error_message: Option<String>,
}

impl ChainVerdict {
    fn valid(events_checked: u64) -> Self {
        Self {
            is_valid: true,
            events_checked,
            first_invalid_event_id: None,
            error_message: None,
        }
    }

    fn invalid(events_checked: u64, event_id: Uuid, message: String) -> Self {
        Self {
            is_valid: false,
            events_checked,
            first_invalid_event_id: Some(event_id),
            error_message: Some(message),
        }
    }
}

/// Store-backed chain verifier.
pub struct ChainVerifier {
    store: Arc<dyn EventStore>,
}

impl ChainVerifier {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self { store }
    }

    /// Verify an agent's chain over an inclusive timestamp range.
    ///
    /// Without a `start` bound the whole chain is checked and the first
    /// event must be a genesis. With a `start` bound the window anchors on
    /// the first loaded event's own claimed predecessor, so a window
    /// verifies iff it is a consistent suffix of the full chain.
    pub async fn verify_chain(
        &self,
        agent_id: &str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<ChainVerdict, VerifyError> {
        let events = self
            .store
            .chain_range(
                agent_id,
                start.map(|t| t.timestamp_micros()),
                end.map(|t| t.timestamp_micros()),
            )
            .await?;

        if events.is_empty() {
            return Ok(ChainVerdict::valid(0));
        }

        let windowed = start.is_some();
        let mut expected_prev: Option<String> = if windowed {
            events[0].previous_event_hash.clone()
        } else {
            None
        };

        let mut checked: u64 = 0;
        for (i, event) in events.iter().enumerate() {
            checked += 1;

            if !verify_event(event)? {
                return Ok(ChainVerdict::invalid(
                    checked,
                    event.event_id,
                    format!("content hash mismatch for event {}", event.event_id),
                ));
            }

            if i == 0 && !windowed {
                if event.previous_event_hash.is_some() {
                    // Not necessarily the genesis: the range may simply start
                    // after older rows. Only an agent with no earlier event
                    // at all is allowed a bare genesis.
                    let has_earlier = self
                        .store
                        .exists_before(agent_id, event.timestamp_micros())
                        .await?;
                    if !has_earlier {
                        return Ok(ChainVerdict::invalid(
                            checked,
                            event.event_id,
                            format!(
                                "genesis event {} must have no previous_event_hash",
                                event.event_id
                            ),
                        ));
                    }
                }
            } else if i > 0 && event.previous_event_hash != expected_prev {
                return Ok(ChainVerdict::invalid(
                    checked,
                    event.event_id,
                    format!("previous_event_hash mismatch at event {}", event.event_id),
                ));
            }

            expected_prev = Some(event.event_hash.clone());
        }

        Ok(ChainVerdict::valid(checked))
    }
}
