//! Session title derivation.
//!
//! Titles are either the default "New Chat" or `"Chat: "` followed by the
//! first 50 characters of a message. Truncation counts characters, not
//! bytes, so multi-byte text is never split mid-codepoint.

use codemate_types::chat::{DEFAULT_SESSION_TITLE, TITLE_PREFIX, TITLE_PREVIEW_CHARS};

/// Derive a session title from message content.
pub fn derive_title(content: &str) -> String {
    let preview: String = content.chars().take(TITLE_PREVIEW_CHARS).collect();
    format!("{TITLE_PREFIX}{preview}")
}

/// Title for a newly created session.
pub fn initial_title(first_message: Option<&str>) -> String {
    match first_message {
        Some(message) => derive_title(message),
        None => DEFAULT_SESSION_TITLE.to_string(),
    }
}
