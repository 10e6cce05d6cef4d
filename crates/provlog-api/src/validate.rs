//! Request input validation
//!
//! All checks run before anything reaches the chain layer. `agent_id` doubles
//! as an archive path component, so its charset is the path-safety boundary.

use regex::Regex;
use std::sync::OnceLock;

static AGENT_ID_RE: OnceLock<Regex> = OnceLock::new();
static HEX64_RE: OnceLock<Regex> = OnceLock::new();

fn agent_id_regex() -> &'static Regex {
    AGENT_ID_RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._-]{1,128}$").expect("agent id regex is valid")
    })
}

fn hex64_regex() -> &'static Regex {
    HEX64_RE.get_or_init(|| Regex::new(r"^[0-9a-fA-F]{64}$").expect("hex regex is valid"))
}

/// Letters, digits, dots, underscores and hyphens only, 1–128 chars.
pub fn validate_agent_id(value: &str) -> Result<(), String> {
    if agent_id_regex().is_match(value) {
        Ok(())
    } else {
        Err(
            "agent_id must be 1-128 characters of letters, numbers, dots, underscores and hyphens"
                .to_string(),
        )
    }
}

/// Exactly 64 hex chars; normalized to lowercase.
pub fn normalize_digest(field: &str, value: &str) -> Result<String, String> {
    if hex64_regex().is_match(value) {
        Ok(value.to_ascii_lowercase())
    } else {
        Err(format!("{} must be exactly 64 hexadecimal characters", field))
    }
}

/// Required label with a length cap.
pub fn validate_label(field: &str, value: &str, max: usize) -> Result<(), String> {
    if value.is_empty() {
        return Err(format!("{} must not be empty", field));
    }
    if value.chars().count() > max {
        return Err(format!("{} must be at most {} characters", field, max));
    }
    Ok(())
}

/// Optional label with a length cap.
pub fn validate_opt_label(field: &str, value: &Option<String>, max: usize) -> Result<(), String> {
    match value {
        Some(v) => validate_label(field, v, max),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_id_charset() {
        assert!(validate_agent_id("agent-1.prod_A").is_ok());
        assert!(validate_agent_id(&"a".repeat(128)).is_ok());

        assert!(validate_agent_id("").is_err());
        assert!(validate_agent_id(&"a".repeat(129)).is_err());
        assert!(validate_agent_id("../etc/passwd").is_err());
        assert!(validate_agent_id("agent/1").is_err());
        assert!(validate_agent_id("agent 1").is_err());
    }

    #[test]
    fn digests_are_normalized_to_lowercase() {
        let upper = "ABCDEF0123456789".repeat(4);
        assert_eq!(
            normalize_digest("input_hash", &upper).unwrap(),
            upper.to_ascii_lowercase()
        );

        assert!(normalize_digest("input_hash", "abc").is_err());
        assert!(normalize_digest("input_hash", &"g".repeat(64)).is_err());
    }

    #[test]
    fn labels_respect_caps() {
        assert!(validate_label("action_type", "llm_call", 100).is_ok());
        assert!(validate_label("action_type", "", 100).is_err());
        assert!(validate_label("action_type", &"x".repeat(101), 100).is_err());
        assert!(validate_opt_label("tool_name", &None, 255).is_ok());
        assert!(validate_opt_label("tool_name", &Some("x".repeat(256)), 255).is_err());
    }
}
