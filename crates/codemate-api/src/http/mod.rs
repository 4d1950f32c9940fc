//! HTTP layer for codemate.
//!
//! Axum router serving the embedded chat page at `/` and a JSON API at
//! `/api/v1/` using the envelope response format.

pub mod error;
pub mod handlers;
pub mod response;
pub mod router;
