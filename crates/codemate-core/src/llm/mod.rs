//! Completion provider abstractions for codemate.
//!
//! - `CompletionProvider`: RPITIT trait for concrete provider implementations
//! - `BoxCompletionProvider`: Object-safe wrapper for dynamic dispatch
//! - `prompt`: the fixed system instruction and request assembly

pub mod box_provider;
pub mod prompt;
pub mod provider;
