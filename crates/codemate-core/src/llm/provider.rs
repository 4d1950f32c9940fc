//! CompletionProvider trait definition.
//!
//! This is the core abstraction that completion backends implement.

use codemate_types::llm::{CompletionRequest, CompletionResponse, LlmError};

/// Trait for completion service backends.
///
/// One call, one response: no streaming and no retries. Decoding parameters
/// and safety thresholds are owned by the implementation and applied to
/// every call.
///
/// Implementations live in codemate-infra (e.g., `GeminiProvider`).
pub trait CompletionProvider: Send + Sync {
    /// Human-readable provider name (e.g., "gemini").
    fn name(&self) -> &str;

    /// Send a completion request and receive the full response.
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl std::future::Future<Output = Result<CompletionResponse, LlmError>> + Send;
}
