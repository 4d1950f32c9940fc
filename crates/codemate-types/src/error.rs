use thiserror::Error;

/// Errors from repository operations (used by trait definitions in codemate-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("query error: {0}")]
    Query(String),

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors that keep the persisted chat from starting.
///
/// These are reported to the user as a banner; the process keeps running.
#[derive(Debug, Clone, Error)]
pub enum StartupError {
    #[error("DATABASE_URL is not set")]
    MissingDatabaseUrl,

    #[error("database unavailable: {0}")]
    Database(String),

    #[error("completion client unavailable: {0}")]
    Provider(String),
}
