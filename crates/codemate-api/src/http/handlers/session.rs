//! Session HTTP handlers.
//!
//! Endpoints:
//! - POST   /api/v1/sessions               - Start a new chat
//! - GET    /api/v1/sessions               - Most recently updated sessions
//! - GET    /api/v1/sessions/{id}          - Get a single session
//! - GET    /api/v1/sessions/{id}/messages - Stored transcript of a session
//! - POST   /api/v1/sessions/{id}/activate - Switch the active session
//! - DELETE /api/v1/sessions/{id}          - Delete a session and its messages

use std::time::Instant;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use codemate_core::chat::repository::SessionRepository;
use codemate_core::conversation::ConversationSnapshot;
use codemate_types::chat::{ChatSession, SessionSummary, TranscriptEntry};

use super::parse_uuid;
use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Query parameters for session listing.
#[derive(Debug, Deserialize)]
pub struct SessionListQuery {
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct DeleteView {
    pub deleted: bool,
    pub conversation: ConversationSnapshot,
}

/// POST /api/v1/sessions - Start a new chat.
pub async fn create_session(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<ConversationSnapshot>>), AppError> {
    let start = Instant::now();

    let mut controller = state.controller()?.lock().await;
    let session_id = controller.new_chat().await?;

    let resp = ApiResponse::timed(controller.snapshot(), start)
        .with_link("self", &format!("/api/v1/sessions/{session_id}"));

    Ok((StatusCode::CREATED, Json(resp)))
}

/// GET /api/v1/sessions - List sessions, most recently updated first.
///
/// `limit` is clamped to `1..=session_page_size`.
pub async fn list_sessions(
    State(state): State<AppState>,
    Query(query): Query<SessionListQuery>,
) -> Result<Json<ApiResponse<Vec<SessionSummary>>>, AppError> {
    let start = Instant::now();

    let page_size = state.config.session_page_size;
    let limit = query.limit.unwrap_or(page_size).clamp(1, page_size);

    let controller = state.controller()?.lock().await;
    let sessions = controller.repo().list_sessions(limit).await?;

    let resp = ApiResponse::timed(sessions, start).with_link("self", "/api/v1/sessions");

    Ok(Json(resp))
}

/// GET /api/v1/sessions/{id} - Get a session by ID.
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<ApiResponse<ChatSession>>, AppError> {
    let start = Instant::now();
    let sid = parse_uuid(&session_id)?;

    let controller = state.controller()?.lock().await;
    let session = controller
        .repo()
        .get_session(&sid)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Session {sid} not found")))?;

    let resp = ApiResponse::timed(session, start)
        .with_link("self", &format!("/api/v1/sessions/{sid}"))
        .with_link("messages", &format!("/api/v1/sessions/{sid}/messages"));

    Ok(Json(resp))
}

/// GET /api/v1/sessions/{id}/messages - Stored messages in insertion order.
pub async fn get_messages(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<TranscriptEntry>>>, AppError> {
    let start = Instant::now();
    let sid = parse_uuid(&session_id)?;

    let controller = state.controller()?.lock().await;
    let messages = controller.repo().load_messages(&sid).await?;

    let resp = ApiResponse::timed(messages, start)
        .with_link("session", &format!("/api/v1/sessions/{sid}"));

    Ok(Json(resp))
}

/// POST /api/v1/sessions/{id}/activate - Make a session the active one.
pub async fn activate_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<ApiResponse<ConversationSnapshot>>, AppError> {
    let start = Instant::now();
    let sid = parse_uuid(&session_id)?;

    let mut controller = state.controller()?.lock().await;
    controller.switch_session(sid).await?;

    Ok(Json(ApiResponse::timed(controller.snapshot(), start)))
}

/// DELETE /api/v1/sessions/{id} - Delete a session; the active one is replaced.
pub async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<ApiResponse<DeleteView>>, AppError> {
    let start = Instant::now();
    let sid = parse_uuid(&session_id)?;

    let mut controller = state.controller()?.lock().await;
    let deleted = controller.delete_session(sid).await?;

    let view = DeleteView {
        deleted,
        conversation: controller.snapshot(),
    };

    Ok(Json(ApiResponse::timed(view, start)))
}
