//! Conversation HTTP handlers.
//!
//! Endpoints:
//! - GET  /api/v1/conversation          - Active session, directory, startup banner
//! - POST /api/v1/conversation/messages - Submit a message

use std::time::Instant;

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use codemate_core::conversation::ConversationSnapshot;
use codemate_types::chat::SessionSummary;
use codemate_types::llm::ContextMode;

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::{AppState, ConcreteController};

/// Everything the page needs to render.
#[derive(Debug, Serialize)]
pub struct ConversationView {
    pub available: bool,
    /// Startup error shown above the chat.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner: Option<String>,
    pub model: String,
    pub context_mode: ContextMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation: Option<ConversationSnapshot>,
    pub sessions: Vec<SessionSummary>,
    /// Non-fatal failures to show inline.
    pub notices: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitMessageRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct SubmitView {
    pub reply: String,
    pub notices: Vec<String>,
    pub conversation: ConversationSnapshot,
    pub sessions: Vec<SessionSummary>,
}

/// Directory for the sidebar; a failure becomes a notice.
async fn sidebar(controller: &ConcreteController, notices: &mut Vec<String>) -> Vec<SessionSummary> {
    match controller.list_sessions().await {
        Ok(sessions) => sessions,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to list sessions");
            notices.push(format!("Could not load sessions: {e}"));
            Vec::new()
        }
    }
}

/// GET /api/v1/conversation - Current state of the chat page.
pub async fn get_conversation(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<ConversationView>>, AppError> {
    let start = Instant::now();

    let mut view = ConversationView {
        available: false,
        banner: None,
        model: state.config.model.clone(),
        context_mode: state.config.context_mode,
        conversation: None,
        sessions: Vec::new(),
        notices: Vec::new(),
    };

    match state.controller() {
        Ok(controller) => {
            let controller = controller.lock().await;
            view.available = true;
            view.conversation = Some(controller.snapshot());
            view.sessions = sidebar(&controller, &mut view.notices).await;
        }
        Err(AppError::Unavailable(err)) => {
            view.banner = Some(format!("Chat unavailable: {err}"));
        }
        Err(other) => return Err(other),
    }

    let resp = ApiResponse::timed(view, start)
        .with_link("self", "/api/v1/conversation")
        .with_link("messages", "/api/v1/conversation/messages")
        .with_link("sessions", "/api/v1/sessions");

    Ok(Json(resp))
}

/// POST /api/v1/conversation/messages - Submit a message to the active session.
pub async fn submit_message(
    State(state): State<AppState>,
    Json(body): Json<SubmitMessageRequest>,
) -> Result<Json<ApiResponse<SubmitView>>, AppError> {
    let start = Instant::now();

    let mut controller = state.controller()?.lock().await;
    let outcome = controller.submit(&body.text).await?;

    let mut notices = outcome.notices;
    let sessions = sidebar(&controller, &mut notices).await;

    let view = SubmitView {
        reply: outcome.reply,
        notices,
        conversation: controller.snapshot(),
        sessions,
    };

    Ok(Json(ApiResponse::timed(view, start)))
}
