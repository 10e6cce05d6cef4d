//! Event hashing and single-event verification

use sha2::{Digest, Sha256};

use crate::canonical::{canonicalize, HashInput};
use crate::event::Event;

/// Errors from hash computation.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("canonical encoding failed: {0}")]
    Canonical(#[from] serde_json::Error),
}

/// SHA-256 of the canonical encoding, as 64 lowercase hex chars.
pub fn compute_event_hash(input: &HashInput<'_>) -> Result<String, ChainError> {
    let bytes = canonicalize(input)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hex::encode(hasher.finalize()))
}

/// True iff the stored `event_hash` matches the recomputed content hash.
pub fn verify_event(event: &Event) -> Result<bool, ChainError> {
    Ok(compute_event_hash(&event.hash_input())? == event.event_hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;
    use uuid::Uuid;

    fn build_event(prev: Option<String>) -> Event {
        let mut event = Event {
            event_id: Uuid::new_v4(),
            agent_id: "agent-7".to_string(),
            action_type: "tool_call".to_string(),
            tool_name: Some("web_search".to_string()),
            timestamp: Utc.with_ymd_and_hms(2025, 3, 1, 8, 30, 0).unwrap(),
            environment: Some("prod".to_string()),
            model_version: None,
            prompt_version: None,
            input_hash: "a".repeat(64),
            output_hash: "b".repeat(64),
            previous_event_hash: prev,
            event_hash: String::new(),
        };
        event.event_hash = compute_event_hash(&event.hash_input()).unwrap();
        event
    }

    #[test]
    fn hash_is_lowercase_hex() {
        let event = build_event(None);
        assert_eq!(event.event_hash.len(), 64);
        assert!(event
            .event_hash
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn verify_accepts_untouched_event() {
        let event = build_event(None);
        assert!(verify_event(&event).unwrap());
    }

    #[test]
    fn verify_rejects_any_field_mutation() {
        let mut event = build_event(Some("c".repeat(64)));
        event.input_hash = "f".repeat(64);
        assert!(!verify_event(&event).unwrap());

        let mut event = build_event(Some("c".repeat(64)));
        event.previous_event_hash = None;
        assert!(!verify_event(&event).unwrap());

        let mut event = build_event(None);
        event.timestamp = event.timestamp + chrono::Duration::microseconds(1);
        assert!(!verify_event(&event).unwrap());
    }

    #[test]
    fn previous_hash_feeds_into_the_digest() {
        let genesis = build_event(None);
        let child_a = build_event(Some(genesis.event_hash.clone()));
        let child_b = build_event(Some("d".repeat(64)));
        assert_ne!(child_a.event_hash, child_b.event_hash);
    }

    fn label() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9 _.-]{1,40}"
    }

    fn hex64() -> impl Strategy<Value = String> {
        "[0-9a-f]{64}"
    }

    proptest! {
        #[test]
        fn canonicalization_is_stable_for_arbitrary_fields(
            agent in "[A-Za-z0-9._-]{1,32}",
            action in label(),
            tool in proptest::option::of(label()),
            env in proptest::option::of(label()),
            input in hex64(),
            output in hex64(),
            prev in proptest::option::of(hex64()),
            micros in 0i64..4_102_444_800_000_000,
        ) {
            let event = Event {
                event_id: Uuid::new_v4(),
                agent_id: agent,
                action_type: action,
                tool_name: tool,
                timestamp: chrono::DateTime::from_timestamp_micros(micros).unwrap(),
                environment: env,
                model_version: None,
                prompt_version: None,
                input_hash: input,
                output_hash: output,
                previous_event_hash: prev,
                event_hash: String::new(),
            };
            let first = compute_event_hash(&event.hash_input()).unwrap();
            let second = compute_event_hash(&event.hash_input()).unwrap();
            prop_assert_eq!(&first, &second);

            let mut sealed = event.clone();
            sealed.event_hash = first;
            prop_assert!(verify_event(&sealed).unwrap());
        }
    }
}
