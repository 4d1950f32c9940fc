//! SessionRepository trait definition.
//!
//! Provides the session store operations: creation, ordered deletion,
//! self-healing message append, chronological reload, and the
//! recency-ordered session directory.

use codemate_types::chat::{ChatMessage, ChatSession, MessageRole, SessionSummary, TranscriptEntry};
use codemate_types::error::RepositoryError;
use uuid::Uuid;

/// Repository trait for chat session and message persistence.
///
/// Implementations live in codemate-infra (e.g., `SqliteSessionStore`).
/// Every method is atomic on its own; two calls are two independent
/// transactions. Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait SessionRepository: Send + Sync {
    /// Insert a new session.
    ///
    /// The title is "New Chat", or a preview of `first_message` when given.
    /// Fails with `RepositoryError::Conflict` if `session_id` already exists.
    fn create_session(
        &self,
        session_id: &Uuid,
        first_message: Option<&str>,
    ) -> impl std::future::Future<Output = Result<ChatSession, RepositoryError>> + Send;

    /// Get a session by its unique ID.
    fn get_session(
        &self,
        session_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<ChatSession>, RepositoryError>> + Send;

    /// Delete a session's messages, then the session itself.
    ///
    /// Returns `true` when a session row was removed, `false` when none existed.
    fn delete_session(
        &self,
        session_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;

    /// Append a message, creating the session first if it does not exist.
    ///
    /// The first assistant message stored while the title is still the default
    /// rewrites the title from its content. `updated_at` is always refreshed.
    fn store_message(
        &self,
        session_id: &Uuid,
        role: MessageRole,
        content: &str,
    ) -> impl std::future::Future<Output = Result<ChatMessage, RepositoryError>> + Send;

    /// All messages of a session in insertion order. Unknown sessions yield an empty list.
    fn load_messages(
        &self,
        session_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<TranscriptEntry>, RepositoryError>> + Send;

    /// Sessions ordered by `updated_at` DESC, at most `limit` rows.
    fn list_sessions(
        &self,
        limit: u32,
    ) -> impl std::future::Future<Output = Result<Vec<SessionSummary>, RepositoryError>> + Send;
}
