//! Infrastructure layer for codemate.
//!
//! Implements the ports defined in `codemate-core`: the SQLite session store,
//! the Gemini completion provider, and configuration loading.

pub mod config;
pub mod llm;
pub mod sqlite;
