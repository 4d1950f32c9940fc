//! Completion request/response types for codemate.
//!
//! These types model the data shapes for the completion service:
//! requests, responses, fixed decoding parameters, content-safety
//! thresholds, and error handling. They are provider-agnostic; the
//! Gemini wire format lives in codemate-infra.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::chat::MessageRole;

/// A single turn sent to the completion service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

/// Request to a completion provider.
///
/// The last message is the current user turn; anything before it is
/// replayed history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
}

/// Response from a completion provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub content: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
    pub usage: Usage,
}

/// Token usage for a completion call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Decoding parameters applied uniformly to every completion call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub temperature: f64,
    pub top_p: f64,
    pub top_k: u32,
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.5,
            top_p: 0.95,
            top_k: 32,
            max_output_tokens: 2048,
        }
    }
}

/// Content-safety category with its wire name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HarmCategory {
    #[serde(rename = "HARM_CATEGORY_HARASSMENT")]
    Harassment,
    #[serde(rename = "HARM_CATEGORY_HATE_SPEECH")]
    HateSpeech,
    #[serde(rename = "HARM_CATEGORY_SEXUALLY_EXPLICIT")]
    SexuallyExplicit,
    #[serde(rename = "HARM_CATEGORY_DANGEROUS_CONTENT")]
    DangerousContent,
}

impl HarmCategory {
    pub const ALL: [HarmCategory; 4] = [
        HarmCategory::Harassment,
        HarmCategory::HateSpeech,
        HarmCategory::SexuallyExplicit,
        HarmCategory::DangerousContent,
    ];
}

/// Severity at which the service blocks content in a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HarmBlockThreshold {
    BlockNone,
    BlockOnlyHigh,
    BlockMediumAndAbove,
    BlockLowAndAbove,
}

/// Threshold for a single safety category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetySetting {
    pub category: HarmCategory,
    pub threshold: HarmBlockThreshold,
}

impl SafetySetting {
    /// The four categories, each blocking only high-severity content.
    pub fn block_only_high() -> Vec<SafetySetting> {
        HarmCategory::ALL
            .into_iter()
            .map(|category| SafetySetting {
                category,
                threshold: HarmBlockThreshold::BlockOnlyHigh,
            })
            .collect()
    }
}

/// Errors from completion provider operations.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("provider error: {message}")]
    Provider { message: String },

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("response blocked by safety filter ({reason})")]
    Blocked { reason: String },

    #[error("provider returned no content")]
    EmptyResponse,

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// How much conversational context each completion call carries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextMode {
    /// Every submission starts a fresh context: system instruction + question.
    #[default]
    Fresh,
    /// The active session's transcript is replayed ahead of the question.
    Session,
}

impl fmt::Display for ContextMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextMode::Fresh => write!(f, "fresh"),
            ContextMode::Session => write!(f, "session"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_config_defaults() {
        let config = GenerationConfig::default();
        assert!((config.temperature - 0.5).abs() < f64::EPSILON);
        assert!((config.top_p - 0.95).abs() < f64::EPSILON);
        assert_eq!(config.top_k, 32);
        assert_eq!(config.max_output_tokens, 2048);
    }

    #[test]
    fn test_block_only_high_covers_all_categories() {
        let settings = SafetySetting::block_only_high();
        assert_eq!(settings.len(), 4);
        assert!(
            settings
                .iter()
                .all(|s| s.threshold == HarmBlockThreshold::BlockOnlyHigh)
        );
    }

    #[test]
    fn test_safety_setting_wire_names() {
        let setting = SafetySetting {
            category: HarmCategory::DangerousContent,
            threshold: HarmBlockThreshold::BlockOnlyHigh,
        };
        let json = serde_json::to_string(&setting).unwrap();
        assert_eq!(
            json,
            r#"{"category":"HARM_CATEGORY_DANGEROUS_CONTENT","threshold":"BLOCK_ONLY_HIGH"}"#
        );
    }

    #[test]
    fn test_context_mode_serde() {
        assert_eq!(ContextMode::default(), ContextMode::Fresh);
        let parsed: ContextMode = serde_json::from_str("\"session\"").unwrap();
        assert_eq!(parsed, ContextMode::Session);
        assert_eq!(ContextMode::Session.to_string(), "session");
    }

    #[test]
    fn test_llm_error_display_carries_upstream_message() {
        let err = LlmError::Provider {
            message: "HTTP 500: backend unavailable".to_string(),
        };
        assert!(err.to_string().contains("backend unavailable"));

        let err = LlmError::Blocked {
            reason: "SAFETY".to_string(),
        };
        assert!(err.to_string().contains("SAFETY"));
    }
}
