//! Session inspection commands: list the directory, print a transcript.

use anyhow::{Context, Result, anyhow};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use uuid::Uuid;

use codemate_core::chat::repository::SessionRepository;
use codemate_types::chat::{ChatSession, MessageRole, SessionSummary, TranscriptEntry};

use crate::state::{AppState, SharedController};

fn controller(state: &AppState) -> Result<&SharedController> {
    state.controller().map_err(|e| anyhow!(e.message()))
}

/// One-line, width-bounded rendering of a title for the table.
fn title_cell(title: &str) -> String {
    let flat = title.replace('\n', " ");
    if flat.chars().count() > 48 {
        let head: String = flat.chars().take(45).collect();
        format!("{head}...")
    } else {
        flat
    }
}

/// Directory rows for `limit`, defaulted to and clamped by the page size.
async fn fetch_sessions(state: &AppState, limit: Option<u32>) -> Result<Vec<SessionSummary>> {
    let page_size = state.config.session_page_size;
    let limit = limit.unwrap_or(page_size).clamp(1, page_size);

    let controller = controller(state)?.lock().await;
    Ok(controller.repo().list_sessions(limit).await?)
}

async fn fetch_transcript(
    state: &AppState,
    session_id: Uuid,
) -> Result<(ChatSession, Vec<TranscriptEntry>)> {
    let controller = controller(state)?.lock().await;
    let session = controller
        .repo()
        .get_session(&session_id)
        .await?
        .with_context(|| format!("Session '{session_id}' not found"))?;
    let messages = controller.repo().load_messages(&session_id).await?;
    Ok((session, messages))
}

/// List the most recently updated sessions.
///
/// # Examples
///
/// ```bash
/// codemate sessions
/// codemate sessions --limit 5 --json
/// ```
pub async fn list_sessions(state: &AppState, limit: Option<u32>, json: bool) -> Result<()> {
    let sessions = fetch_sessions(state, limit).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&sessions)?);
        return Ok(());
    }

    if sessions.is_empty() {
        println!();
        println!(
            "  {} No sessions yet. Start one with: {}",
            style("i").blue().bold(),
            style("codemate serve").yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Title").fg(Color::White),
        Cell::new("Updated").fg(Color::White),
        Cell::new("Id").fg(Color::White),
    ]);

    for session in &sessions {
        table.add_row(vec![
            Cell::new(title_cell(&session.title)).fg(Color::Cyan),
            Cell::new(session.updated_at.format("%Y-%m-%d %H:%M").to_string()).fg(Color::White),
            Cell::new(session.id.to_string()).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} session{}",
        style(sessions.len()).bold(),
        if sessions.len() == 1 { "" } else { "s" }
    );
    println!();

    Ok(())
}

/// Print the stored transcript of a session.
///
/// # Examples
///
/// ```bash
/// codemate show <session-id>
/// codemate show <session-id> --json
/// ```
pub async fn show_session(state: &AppState, session_id: Uuid, json: bool) -> Result<()> {
    let (session, messages) = fetch_transcript(state, session_id).await?;

    if json {
        let export = serde_json::json!({
            "session": session,
            "messages": messages,
        });
        println!("{}", serde_json::to_string_pretty(&export)?);
        return Ok(());
    }

    println!();
    println!("  {}", style(title_cell(&session.title)).cyan().bold());
    println!(
        "  {}",
        style(format!(
            "created {} · updated {}",
            session.created_at.format("%Y-%m-%d %H:%M UTC"),
            session.updated_at.format("%Y-%m-%d %H:%M UTC")
        ))
        .dim()
    );
    println!();

    for message in &messages {
        let label = match message.role {
            MessageRole::User => style("You").blue().bold(),
            MessageRole::Assistant => style("Assistant").red().bold(),
        };
        println!("  {label}");
        println!("{}", message.content);
        println!();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use codemate_core::conversation::{ControllerSettings, ConversationController};
    use codemate_infra::llm::create_provider;
    use codemate_infra::sqlite::pool::DatabasePool;
    use codemate_infra::sqlite::session::SqliteSessionStore;
    use codemate_types::config::AppConfig;
    use codemate_types::error::StartupError;

    async fn sqlite_state() -> AppState {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("chat.db").display());
        std::mem::forget(dir);

        let pool = DatabasePool::new(&url).await.unwrap();
        let config = AppConfig::default();
        let provider = create_provider(&config, None).unwrap();
        let settings = ControllerSettings {
            model: config.model.clone(),
            context_mode: config.context_mode,
            session_page_size: config.session_page_size,
        };
        let controller =
            ConversationController::new(SqliteSessionStore::new(pool), provider, settings);
        AppState::with_controller(controller, config)
    }

    fn unavailable_state() -> AppState {
        AppState::unavailable(StartupError::MissingDatabaseUrl, AppConfig::default())
    }

    #[tokio::test]
    async fn test_sessions_reports_startup_error() {
        let err = list_sessions(&unavailable_state(), None, true)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL is not set"));
    }

    #[tokio::test]
    async fn test_show_reports_startup_error() {
        let err = show_session(&unavailable_state(), Uuid::now_v7(), false)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL is not set"));
    }

    #[tokio::test]
    async fn test_show_unknown_session_is_not_found() {
        let state = sqlite_state().await;
        let missing = Uuid::now_v7();
        let err = show_session(&state, missing, true).await.unwrap_err();
        assert!(err.to_string().contains("not found"));
        assert!(err.to_string().contains(&missing.to_string()));
    }

    #[tokio::test]
    async fn test_show_prints_stored_transcript() {
        let state = sqlite_state().await;
        let session_id = Uuid::now_v7();
        {
            let controller = state.controller().unwrap().lock().await;
            let repo = controller.repo();
            repo.store_message(&session_id, MessageRole::User, "reverse a string")
                .await
                .unwrap();
            repo.store_message(&session_id, MessageRole::Assistant, "```\ns[::-1]\n```")
                .await
                .unwrap();
        }

        let (session, messages) = fetch_transcript(&state, session_id).await.unwrap();
        assert_eq!(session.title, "Chat: ```\ns[::-1]\n```");
        assert_eq!(
            messages,
            vec![
                TranscriptEntry::user("reverse a string"),
                TranscriptEntry::assistant("```\ns[::-1]\n```"),
            ]
        );
        show_session(&state, session_id, false).await.unwrap();
    }

    #[tokio::test]
    async fn test_sessions_limit_clamped_to_page_size() {
        let state = sqlite_state().await;
        {
            let controller = state.controller().unwrap().lock().await;
            for _ in 0..25 {
                controller
                    .repo()
                    .create_session(&Uuid::now_v7(), None)
                    .await
                    .unwrap();
            }
        }

        assert_eq!(fetch_sessions(&state, Some(100)).await.unwrap().len(), 20);
        assert_eq!(fetch_sessions(&state, None).await.unwrap().len(), 20);
        assert_eq!(fetch_sessions(&state, Some(0)).await.unwrap().len(), 1);
        assert_eq!(fetch_sessions(&state, Some(3)).await.unwrap().len(), 3);
        list_sessions(&state, Some(100), true).await.unwrap();
    }

    #[test]
    fn test_title_cell_flattens_newlines() {
        assert_eq!(title_cell("Chat: ```\nx\n```"), "Chat: ``` x ```");
    }

    #[test]
    fn test_title_cell_truncates_by_chars() {
        let title = format!("Chat: {}", "é".repeat(50));
        let cell = title_cell(&title);
        assert!(cell.ends_with("..."));
        assert_eq!(cell.chars().count(), 48);
    }
}
