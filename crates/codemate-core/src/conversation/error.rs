use codemate_types::error::RepositoryError;
use codemate_types::llm::LlmError;
use thiserror::Error;

/// Errors surfaced by the conversation controller to the UI layer.
#[derive(Debug, Error)]
pub enum ConversationError {
    #[error("message is empty")]
    EmptyMessage,

    #[error("completion failed: {0}")]
    Completion(#[from] LlmError),

    #[error("persistence failed: {0}")]
    Persistence(#[from] RepositoryError),
}
