//! Conversation logic and trait definitions for codemate.
//!
//! This crate defines the "ports" (repository and provider traits) that the
//! infrastructure layer implements, plus the pure pieces of the chat flow:
//! title derivation, response formatting, prompt assembly, and the
//! conversation controller. It depends only on `codemate-types` -- never on
//! `codemate-infra` or any database/IO crate.

pub mod chat;
pub mod conversation;
pub mod llm;
