//! Axum router configuration with middleware.
//!
//! The chat page is served at `/`, the JSON API under `/api/v1/`.
//! Middleware: CORS, request tracing.
//!
//! When `CODEMATE_WEB_DIR` points to an existing directory, unknown paths
//! fall through to static files from it (custom assets for the page).

use axum::Router;
use axum::extract::State;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Conversation
        .route(
            "/conversation",
            get(handlers::conversation::get_conversation),
        )
        .route(
            "/conversation/messages",
            post(handlers::conversation::submit_message),
        )
        // Sessions
        .route(
            "/sessions",
            get(handlers::session::list_sessions).post(handlers::session::create_session),
        )
        .route(
            "/sessions/{id}",
            get(handlers::session::get_session).delete(handlers::session::delete_session),
        )
        .route(
            "/sessions/{id}/messages",
            get(handlers::session::get_messages),
        )
        .route(
            "/sessions/{id}/activate",
            post(handlers::session::activate_session),
        );

    let mut router = Router::new()
        .route("/", get(handlers::ui::index))
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if let Ok(web_dir) = std::env::var("CODEMATE_WEB_DIR") {
        if std::path::Path::new(&web_dir).is_dir() {
            router = router.fallback_service(ServeDir::new(&web_dir));
            tracing::info!(path = %web_dir, "Static file serving enabled");
        }
    }

    router
}

/// GET /health - Liveness and whether the chat is available.
async fn health_check(State(state): State<AppState>) -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "chat_available": state.startup_error().is_none(),
    }))
}
