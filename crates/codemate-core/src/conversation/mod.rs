//! Conversation orchestration.
//!
//! The controller owns the active session id and its in-memory transcript,
//! and sequences store writes around the completion call.

pub mod controller;
pub mod error;

pub use controller::{
    ControllerSettings, ControllerState, ConversationController, ConversationSnapshot,
    SubmitOutcome,
};
pub use error::ConversationError;
