//! Application state shared by the CLI and the HTTP handlers.
//!
//! Startup never aborts the process: when the database (or the completion
//! client) cannot be set up, the state carries the [`StartupError`] instead
//! of a controller, and the UI shows it as a banner.

use std::sync::Arc;

use secrecy::SecretString;
use tokio::sync::Mutex;

use codemate_core::conversation::{ControllerSettings, ConversationController};
use codemate_infra::config::{load_app_config, resolve_data_dir};
use codemate_infra::llm::create_provider;
use codemate_infra::sqlite::pool::DatabasePool;
use codemate_infra::sqlite::session::SqliteSessionStore;
use codemate_types::config::AppConfig;
use codemate_types::error::StartupError;

use crate::http::error::AppError;

/// The controller pinned to the SQLite store.
pub type ConcreteController = ConversationController<SqliteSessionStore>;

/// Handle to the single conversation; interactions are serialized by the lock.
pub type SharedController = Arc<Mutex<ConcreteController>>;

/// Values read once from the environment (or the equivalent CLI flags).
pub struct StartupOptions {
    pub database_url: Option<String>,
    pub api_key: Option<SecretString>,
}

#[derive(Clone)]
pub struct AppState {
    controller: Option<SharedController>,
    startup_error: Option<StartupError>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Load config, open the database and wire the controller.
    pub async fn init(options: StartupOptions) -> Self {
        let data_dir = resolve_data_dir();
        let config = load_app_config(&data_dir).await;

        match build_controller(&config, options).await {
            Ok(controller) => {
                tracing::info!(
                    model = %config.model,
                    context_mode = %config.context_mode,
                    "Conversation controller ready"
                );
                Self::with_controller(controller, config)
            }
            Err(err) => {
                tracing::error!(error = %err, "Startup failed; serving error banner");
                Self::unavailable(err, config)
            }
        }
    }

    pub fn with_controller(controller: ConcreteController, config: AppConfig) -> Self {
        Self {
            controller: Some(Arc::new(Mutex::new(controller))),
            startup_error: None,
            config: Arc::new(config),
        }
    }

    pub fn unavailable(error: StartupError, config: AppConfig) -> Self {
        Self {
            controller: None,
            startup_error: Some(error),
            config: Arc::new(config),
        }
    }

    pub fn startup_error(&self) -> Option<&StartupError> {
        self.startup_error.as_ref()
    }

    /// The controller, or 503 when startup failed.
    pub fn controller(&self) -> Result<&SharedController, AppError> {
        match (&self.controller, &self.startup_error) {
            (Some(controller), _) => Ok(controller),
            (None, Some(err)) => Err(AppError::Unavailable(err.clone())),
            (None, None) => Err(AppError::Unavailable(StartupError::MissingDatabaseUrl)),
        }
    }
}

async fn build_controller(
    config: &AppConfig,
    options: StartupOptions,
) -> Result<ConcreteController, StartupError> {
    let database_url = options
        .database_url
        .filter(|url| !url.trim().is_empty())
        .ok_or(StartupError::MissingDatabaseUrl)?;

    let pool = DatabasePool::new(&database_url)
        .await
        .map_err(|e| StartupError::Database(e.to_string()))?;

    let provider = create_provider(config, options.api_key)
        .map_err(|e| StartupError::Provider(e.to_string()))?;

    let settings = ControllerSettings {
        model: config.model.clone(),
        context_mode: config.context_mode,
        session_page_size: config.session_page_size,
    };

    let mut controller =
        ConversationController::new(SqliteSessionStore::new(pool), provider, settings);
    if let Err(err) = controller.new_chat().await {
        tracing::warn!(error = %err, "Could not create the initial session; the first message will");
    }

    Ok(controller)
}

#[cfg(test)]
mod tests {
    use super::*;
    use codemate_core::chat::repository::SessionRepository;

    fn temp_dir() -> std::path::PathBuf {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().to_path_buf();
        std::mem::forget(dir);
        path
    }

    #[tokio::test]
    async fn test_missing_database_url_is_startup_error() {
        let result = build_controller(
            &AppConfig::default(),
            StartupOptions {
                database_url: None,
                api_key: None,
            },
        )
        .await;
        assert!(matches!(result, Err(StartupError::MissingDatabaseUrl)));
    }

    #[tokio::test]
    async fn test_unopenable_database_is_startup_error() {
        let result = build_controller(
            &AppConfig::default(),
            StartupOptions {
                database_url: Some("sqlite:///nonexistent-dir/for/sure/x.db".to_string()),
                api_key: None,
            },
        )
        .await;
        assert!(matches!(result, Err(StartupError::Database(_))));
    }

    #[tokio::test]
    async fn test_valid_database_builds_controller() {
        let dir = temp_dir();
        let url = format!("sqlite://{}?mode=rwc", dir.join("chat.db").display());
        let controller = build_controller(
            &AppConfig::default(),
            StartupOptions {
                database_url: Some(url),
                api_key: Some(SecretString::from("key")),
            },
        )
        .await
        .unwrap();
        assert!(controller.transcript().is_empty());

        let active = controller.active_session_id();
        let session = controller.repo().get_session(&active).await.unwrap();
        assert_eq!(session.unwrap().title, "New Chat");
        let listed = controller.repo().list_sessions(20).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, active);
    }

    #[test]
    fn test_unavailable_state_maps_to_503() {
        let state = AppState::unavailable(
            StartupError::MissingDatabaseUrl,
            AppConfig::default(),
        );
        assert!(matches!(state.controller(), Err(AppError::Unavailable(_))));
        assert!(state.startup_error().is_some());
    }
}
