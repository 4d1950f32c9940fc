//! Conversation controller.
//!
//! Holds `active_session_id` and the transcript mirroring the store for that
//! session. The state machine is `Idle -> AwaitingCompletion -> Idle`, entered
//! by `submit`; `new_chat`, `switch_session`, and `delete_session` always land
//! in `Idle`.
//!
//! Store writes inside `submit` are separate transactions. A failed write is
//! logged and reported back as a notice instead of aborting the exchange, so
//! the transcript may run ahead of the store until the next reload.

use codemate_types::chat::{MessageRole, SessionSummary, TranscriptEntry};
use serde::Serialize;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use codemate_types::llm::ContextMode;

use crate::chat::format::format_response;
use crate::chat::repository::SessionRepository;
use crate::llm::box_provider::BoxCompletionProvider;
use crate::llm::prompt::build_request;

use super::error::ConversationError;

/// Fixed per-process settings of the controller.
#[derive(Debug, Clone)]
pub struct ControllerSettings {
    pub model: String,
    pub context_mode: ContextMode,
    pub session_page_size: u32,
}

/// Where the controller is in the submit cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerState {
    Idle,
    AwaitingCompletion,
}

/// Read-only view of the controller for rendering.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationSnapshot {
    pub session_id: Uuid,
    pub state: ControllerState,
    pub transcript: Vec<TranscriptEntry>,
}

/// Result of a successful submission.
#[derive(Debug, Clone, Serialize)]
pub struct SubmitOutcome {
    /// The formatted assistant reply appended to the transcript.
    pub reply: String,
    /// Store failures that happened along the way.
    pub notices: Vec<String>,
}

/// Orchestrates one user's conversation against a session store and a
/// completion provider.
pub struct ConversationController<R: SessionRepository> {
    repo: R,
    provider: BoxCompletionProvider,
    settings: ControllerSettings,
    active_session_id: Uuid,
    transcript: Vec<TranscriptEntry>,
    state: ControllerState,
}

impl<R: SessionRepository> ConversationController<R> {
    /// Create a controller with a fresh, not yet persisted, session id.
    ///
    /// Call [`new_chat`](Self::new_chat) to create the session row eagerly;
    /// otherwise the first stored message creates it.
    pub fn new(repo: R, provider: BoxCompletionProvider, settings: ControllerSettings) -> Self {
        Self {
            repo,
            provider,
            settings,
            active_session_id: Uuid::now_v7(),
            transcript: Vec::new(),
            state: ControllerState::Idle,
        }
    }

    /// Access the session store.
    pub fn repo(&self) -> &R {
        &self.repo
    }

    pub fn active_session_id(&self) -> Uuid {
        self.active_session_id
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn snapshot(&self) -> ConversationSnapshot {
        ConversationSnapshot {
            session_id: self.active_session_id,
            state: self.state,
            transcript: self.transcript.clone(),
        }
    }

    /// The session directory, bounded to the configured page size.
    pub async fn list_sessions(&self) -> Result<Vec<SessionSummary>, ConversationError> {
        Ok(self
            .repo
            .list_sessions(self.settings.session_page_size)
            .await?)
    }

    /// Start a new conversation.
    ///
    /// The transcript is reset before the store is touched, so a failed
    /// insert still leaves an empty active session; its row is created by
    /// the first stored message.
    pub async fn new_chat(&mut self) -> Result<Uuid, ConversationError> {
        let session_id = Uuid::now_v7();
        self.active_session_id = session_id;
        self.transcript.clear();
        self.state = ControllerState::Idle;

        self.repo.create_session(&session_id, None).await?;
        info!(session_id = %session_id, "New chat session started");
        Ok(session_id)
    }

    /// Make `session_id` active and rebuild the transcript from the store.
    pub async fn switch_session(&mut self, session_id: Uuid) -> Result<(), ConversationError> {
        self.active_session_id = session_id;
        self.transcript.clear();
        self.state = ControllerState::Idle;

        self.transcript = self.repo.load_messages(&session_id).await?;
        info!(
            session_id = %session_id,
            messages = self.transcript.len(),
            "Switched session"
        );
        Ok(())
    }

    /// Delete a session; deleting the active one starts a new chat.
    pub async fn delete_session(&mut self, session_id: Uuid) -> Result<bool, ConversationError> {
        let deleted = self.repo.delete_session(&session_id).await?;
        info!(session_id = %session_id, deleted, "Session deleted");

        if session_id == self.active_session_id {
            self.new_chat().await?;
        }
        Ok(deleted)
    }

    /// Send `text` to the completion service and record both sides.
    ///
    /// On completion failure the user message stays in the transcript and
    /// the store, no assistant entry is added, and the error is returned.
    pub async fn submit(&mut self, text: &str) -> Result<SubmitOutcome, ConversationError> {
        if text.trim().is_empty() {
            return Err(ConversationError::EmptyMessage);
        }

        let session_id = self.active_session_id;
        let mut notices = Vec::new();

        let history_len = self.transcript.len();
        self.transcript.push(TranscriptEntry::user(text));
        if let Err(e) = self
            .repo
            .store_message(&session_id, MessageRole::User, text)
            .await
        {
            warn!(session_id = %session_id, error = %e, "Failed to store user message");
            notices.push(format!("Your message was not saved: {e}"));
        }

        let request = build_request(
            &self.settings.model,
            self.settings.context_mode,
            &self.transcript[..history_len],
            text,
        );

        let span = info_span!(
            "gen_ai.complete",
            gen_ai.system = self.provider.name(),
            gen_ai.request.model = %request.model,
            gen_ai.request.messages = request.messages.len(),
            session_id = %session_id,
            gen_ai.usage.input_tokens = tracing::field::Empty,
            gen_ai.usage.output_tokens = tracing::field::Empty,
        );
        let awaiting = AwaitingCompletion::enter(&mut self.state);
        let result = self
            .provider
            .complete(&request)
            .instrument(span.clone())
            .await;
        drop(awaiting);

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "Completion failed");
                return Err(e.into());
            }
        };
        span.record("gen_ai.usage.input_tokens", response.usage.input_tokens);
        span.record("gen_ai.usage.output_tokens", response.usage.output_tokens);
        debug!(finish_reason = ?response.finish_reason, "Completion received");

        let reply = format_response(&response.content);
        self.transcript.push(TranscriptEntry::assistant(reply.clone()));
        if let Err(e) = self
            .repo
            .store_message(&session_id, MessageRole::Assistant, &reply)
            .await
        {
            warn!(session_id = %session_id, error = %e, "Failed to store assistant reply");
            notices.push(format!("The reply was not saved: {e}"));
        }

        Ok(SubmitOutcome { reply, notices })
    }
}

/// Holds the controller in `AwaitingCompletion` until dropped, including
/// when the `submit` future is cancelled mid-call.
struct AwaitingCompletion<'a>(&'a mut ControllerState);

impl<'a> AwaitingCompletion<'a> {
    fn enter(state: &'a mut ControllerState) -> Self {
        *state = ControllerState::AwaitingCompletion;
        Self(state)
    }
}

impl Drop for AwaitingCompletion<'_> {
    fn drop(&mut self) {
        *self.0 = ControllerState::Idle;
    }
}
