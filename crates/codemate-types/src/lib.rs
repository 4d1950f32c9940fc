//! Shared domain types for codemate.
//!
//! This crate contains the core domain types used across the workspace:
//! chat sessions and messages, completion request/response shapes,
//! configuration, and the error taxonomy.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod chat;
pub mod config;
pub mod error;
pub mod llm;
