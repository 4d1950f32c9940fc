//! Chat session persistence abstractions and pure chat helpers.
//!
//! `SessionRepository` is implemented by the infrastructure layer;
//! `title` and `format` are side-effect free.

pub mod format;
pub mod repository;
pub mod title;
