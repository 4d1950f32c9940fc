//! The single-page chat UI, embedded at compile time.

use axum::response::Html;

const INDEX_HTML: &str = include_str!("../../../web/index.html");

/// GET / - Serve the chat page.
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}
