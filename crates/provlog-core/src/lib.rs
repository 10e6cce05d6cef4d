//! # Provlog Core
//!
//! Core types for the Provlog ledger — tamper-evident, hash-chained records
//! of AI agent actions.
//!
//! ## Key Types
//!
//! - [`Event`] — an immutable ledger record, chained per agent
//! - [`EventDraft`] — the caller-supplied payload of a new event
//! - [`HashInput`] — the canonical hashing view of an event
//!
//! ## Hashing
//!
//! Events are hashed over a deterministic canonical encoding (RFC 8785 JCS:
//! sorted keys, no whitespace, UTF-8). The hash of each event covers the
//! previous event's hash, forming a per-agent chain in which any retroactive
//! edit is detectable.
//!
//! ```rust
//! use provlog_core::{compute_event_hash, HashInput};
//!
//! let zeros = "0".repeat(64);
//! let ones = "1".repeat(64);
//! let input = HashInput {
//!     event_id: "00000000-0000-0000-0000-000000000000".to_string(),
//!     agent_id: "a1",
//!     action_type: "llm_call",
//!     tool_name: None,
//!     timestamp: "2025-01-15T12:00:00.000000+00:00".to_string(),
//!     environment: None,
//!     model_version: None,
//!     prompt_version: None,
//!     input_hash: &zeros,
//!     output_hash: &ones,
//!     previous_event_hash: None,
//! };
//! let digest = compute_event_hash(&input).unwrap();
//! assert_eq!(digest.len(), 64);
//! ```

pub mod canonical;
pub mod chain;
pub mod event;

pub use canonical::{canonicalize, format_timestamp, truncate_to_micros, HashInput};
pub use chain::{compute_event_hash, verify_event, ChainError};
pub use event::{Event, EventDraft};
