//! Application configuration types for codemate.
//!
//! `AppConfig` represents the optional `config.toml` in the data directory
//! that selects the model, the context mode, and client/directory limits.
//! Secrets and the database URL are not part of this file; they come from
//! the environment.

use serde::{Deserialize, Serialize};

use crate::chat::DEFAULT_SESSION_PAGE_SIZE;
use crate::llm::ContextMode;

/// Top-level configuration. All fields have sensible defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Completion model identifier.
    #[serde(default = "default_model")]
    pub model: String,

    /// Whether completion calls replay the active session's history.
    #[serde(default)]
    pub context_mode: ContextMode,

    /// Maximum number of sessions shown in the sidebar.
    #[serde(default = "default_session_page_size")]
    pub session_page_size: u32,

    /// Base URL of the completion service.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Timeout for a single completion call, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_session_page_size() -> u32 {
    DEFAULT_SESSION_PAGE_SIZE
}

fn default_api_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_request_timeout_secs() -> u64 {
    120
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            context_mode: ContextMode::default(),
            session_page_size: default_session_page_size(),
            api_base_url: default_api_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}
