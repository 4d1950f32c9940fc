//! Application error type mapping to HTTP status codes and envelope format.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use codemate_core::conversation::ConversationError;
use codemate_types::error::{RepositoryError, StartupError};

use crate::http::response::ApiResponse;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Startup failed; the chat is not available.
    Unavailable(StartupError),
    /// Controller failure (completion, persistence, empty input).
    Conversation(ConversationError),
    /// Direct store failure.
    Repository(RepositoryError),
    NotFound(String),
    Validation(String),
}

impl From<ConversationError> for AppError {
    fn from(e: ConversationError) -> Self {
        AppError::Conversation(e)
    }
}

impl From<RepositoryError> for AppError {
    fn from(e: RepositoryError) -> Self {
        AppError::Repository(e)
    }
}

impl AppError {
    /// Human-readable message, as sent in the error envelope.
    pub fn message(&self) -> String {
        self.parts().2
    }

    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Unavailable(e) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "SERVICE_UNAVAILABLE",
                e.to_string(),
            ),
            AppError::Conversation(ConversationError::EmptyMessage) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                "Message must not be empty".to_string(),
            ),
            AppError::Conversation(ConversationError::Completion(e)) => {
                (StatusCode::BAD_GATEWAY, "COMPLETION_FAILED", e.to_string())
            }
            AppError::Conversation(ConversationError::Persistence(e)) | AppError::Repository(e) => {
                match e {
                    RepositoryError::Conflict(_) => {
                        (StatusCode::CONFLICT, "CONFLICT", e.to_string())
                    }
                    _ => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "PERSISTENCE_ERROR",
                        e.to_string(),
                    ),
                }
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        if status.is_server_error() {
            tracing::warn!(status = status.as_u16(), code, error = %message, "Request failed");
        }

        let body = ApiResponse::error(code, &message, uuid::Uuid::now_v7().to_string(), 0);
        (status, Json(body)).into_response()
    }
}
