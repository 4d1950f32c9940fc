//! SQLite session store.
//!
//! Implements `SessionRepository` from `codemate-core` with raw sqlx queries,
//! private Row structs, and the split reader/writer pool. Every write method
//! runs in its own transaction on the writer connection.

use chrono::{DateTime, SecondsFormat, Utc};
use codemate_core::chat::repository::SessionRepository;
use codemate_core::chat::title::{derive_title, initial_title};
use codemate_types::chat::{
    ChatMessage, ChatSession, DEFAULT_SESSION_TITLE, MessageRole, SessionSummary,
    TranscriptEntry,
};
use codemate_types::error::RepositoryError;
use sqlx::Row;
use tracing::debug;
use uuid::Uuid;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `SessionRepository`.
#[derive(Clone)]
pub struct SqliteSessionStore {
    pool: DatabasePool,
}

impl SqliteSessionStore {
    /// Create a new store backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

struct ChatSessionRow {
    session_id: String,
    title: String,
    created_at: String,
    updated_at: String,
}

impl ChatSessionRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            session_id: row.try_get("session_id")?,
            title: row.try_get("title")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_session(self) -> Result<ChatSession, RepositoryError> {
        let id = Uuid::parse_str(&self.session_id)
            .map_err(|e| RepositoryError::Query(format!("invalid session id: {e}")))?;

        Ok(ChatSession {
            id,
            title: self.title,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

struct TranscriptRow {
    role: String,
    content: String,
}

impl TranscriptRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            role: row.try_get("role")?,
            content: row.try_get("content")?,
        })
    }

    fn into_entry(self) -> Result<TranscriptEntry, RepositoryError> {
        let role: MessageRole = self
            .role
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;
        Ok(TranscriptEntry {
            role,
            content: self.content,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

/// Fixed-width UTC timestamp so that string order is time order.
fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn query_error(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Query(e.to_string())
}

// ---------------------------------------------------------------------------
// SessionRepository implementation
// ---------------------------------------------------------------------------

impl SessionRepository for SqliteSessionStore {
    #[tracing::instrument(name = "session_store.create", skip_all, fields(session_id = %session_id))]
    async fn create_session(
        &self,
        session_id: &Uuid,
        first_message: Option<&str>,
    ) -> Result<ChatSession, RepositoryError> {
        let now = format_datetime(&Utc::now());
        let title = initial_title(first_message);

        sqlx::query(
            "INSERT INTO chat_sessions (session_id, title, created_at, updated_at) VALUES (?, ?, ?, ?)",
        )
        .bind(session_id.to_string())
        .bind(&title)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool.writer)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.is_unique_violation() {
                    return RepositoryError::Conflict(format!(
                        "session {session_id} already exists"
                    ));
                }
            }
            query_error(e)
        })?;

        debug!(title = %title, "Session created");

        let stamp = parse_datetime(&now)?;
        Ok(ChatSession {
            id: *session_id,
            title,
            created_at: stamp,
            updated_at: stamp,
        })
    }

    #[tracing::instrument(name = "session_store.get", skip_all, fields(session_id = %session_id))]
    async fn get_session(
        &self,
        session_id: &Uuid,
    ) -> Result<Option<ChatSession>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM chat_sessions WHERE session_id = ?")
            .bind(session_id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;

        match row {
            Some(row) => {
                let session_row = ChatSessionRow::from_row(&row).map_err(query_error)?;
                Ok(Some(session_row.into_session()?))
            }
            None => Ok(None),
        }
    }

    #[tracing::instrument(name = "session_store.delete", skip_all, fields(session_id = %session_id))]
    async fn delete_session(&self, session_id: &Uuid) -> Result<bool, RepositoryError> {
        let id = session_id.to_string();
        let mut tx = self.pool.writer.begin().await.map_err(query_error)?;

        let messages = sqlx::query("DELETE FROM chat_messages WHERE session_id = ?")
            .bind(&id)
            .execute(&mut *tx)
            .await
            .map_err(query_error)?;

        let sessions = sqlx::query("DELETE FROM chat_sessions WHERE session_id = ?")
            .bind(&id)
            .execute(&mut *tx)
            .await
            .map_err(query_error)?;

        tx.commit().await.map_err(query_error)?;

        debug!(
            messages = messages.rows_affected(),
            sessions = sessions.rows_affected(),
            "Session rows deleted"
        );
        Ok(sessions.rows_affected() > 0)
    }

    #[tracing::instrument(
        name = "session_store.store_message",
        skip_all,
        fields(session_id = %session_id, role = %role)
    )]
    async fn store_message(
        &self,
        session_id: &Uuid,
        role: MessageRole,
        content: &str,
    ) -> Result<ChatMessage, RepositoryError> {
        let id = session_id.to_string();
        let now = format_datetime(&Utc::now());
        let mut tx = self.pool.writer.begin().await.map_err(query_error)?;

        // A write to an unknown id creates the session with the default title.
        let healed = sqlx::query(
            "INSERT INTO chat_sessions (session_id, title, created_at, updated_at) VALUES (?, ?, ?, ?)
             ON CONFLICT (session_id) DO NOTHING",
        )
        .bind(&id)
        .bind(DEFAULT_SESSION_TITLE)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await
        .map_err(query_error)?;
        if healed.rows_affected() > 0 {
            debug!("Created missing session for message");
        }

        let inserted = sqlx::query(
            "INSERT INTO chat_messages (session_id, role, content, timestamp) VALUES (?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(role.to_string())
        .bind(content)
        .bind(&now)
        .execute(&mut *tx)
        .await
        .map_err(query_error)?;

        if role == MessageRole::Assistant {
            sqlx::query("UPDATE chat_sessions SET title = ? WHERE session_id = ? AND title = ?")
                .bind(derive_title(content))
                .bind(&id)
                .bind(DEFAULT_SESSION_TITLE)
                .execute(&mut *tx)
                .await
                .map_err(query_error)?;
        }

        sqlx::query("UPDATE chat_sessions SET updated_at = ? WHERE session_id = ?")
            .bind(&now)
            .bind(&id)
            .execute(&mut *tx)
            .await
            .map_err(query_error)?;

        tx.commit().await.map_err(query_error)?;

        Ok(ChatMessage {
            id: inserted.last_insert_rowid(),
            session_id: *session_id,
            role,
            content: content.to_string(),
            timestamp: parse_datetime(&now)?,
        })
    }

    #[tracing::instrument(
        name = "session_store.load_messages",
        skip_all,
        fields(session_id = %session_id)
    )]
    async fn load_messages(
        &self,
        session_id: &Uuid,
    ) -> Result<Vec<TranscriptEntry>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT role, content FROM chat_messages WHERE session_id = ? ORDER BY id ASC",
        )
        .bind(session_id.to_string())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_error)?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in &rows {
            let entry_row = TranscriptRow::from_row(row).map_err(query_error)?;
            entries.push(entry_row.into_entry()?);
        }

        Ok(entries)
    }

    #[tracing::instrument(name = "session_store.list", skip_all, fields(limit = limit))]
    async fn list_sessions(&self, limit: u32) -> Result<Vec<SessionSummary>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM chat_sessions ORDER BY updated_at DESC, rowid DESC LIMIT ?",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_error)?;

        let mut sessions = Vec::with_capacity(rows.len());
        for row in &rows {
            let session_row = ChatSessionRow::from_row(row).map_err(query_error)?;
            sessions.push(SessionSummary::from(session_row.into_session()?));
        }

        Ok(sessions)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use tracing::span::{Attributes, Id};
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
    use tracing_subscriber::util::SubscriberInitExt;

    use super::*;

    async fn test_store() -> SqliteSessionStore {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());
        // Leak tempdir so it lives for the test
        std::mem::forget(dir);
        SqliteSessionStore::new(DatabasePool::new(&url).await.unwrap())
    }

    async fn message_count(store: &SqliteSessionStore, session_id: &Uuid) -> i64 {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM chat_messages WHERE session_id = ?")
            .bind(session_id.to_string())
            .fetch_one(&store.pool.reader)
            .await
            .unwrap();
        row.0
    }

    #[tokio::test]
    async fn test_create_and_get_session() {
        let store = test_store().await;
        let id = Uuid::now_v7();

        let created = store.create_session(&id, None).await.unwrap();
        assert_eq!(created.title, "New Chat");

        let fetched = store.get_session(&id).await.unwrap().unwrap();
        assert_eq!(fetched.id, id);
        assert_eq!(fetched.title, "New Chat");
        assert_eq!(fetched.created_at, created.created_at);
        assert_eq!(fetched.updated_at, created.updated_at);
    }

    #[tokio::test]
    async fn test_create_session_with_first_message() {
        let store = test_store().await;
        let id = Uuid::now_v7();

        let created = store
            .create_session(&id, Some("how do I reverse a list in python?"))
            .await
            .unwrap();
        assert_eq!(created.title, "Chat: how do I reverse a list in python?");
    }

    #[tokio::test]
    async fn test_create_duplicate_session_conflicts() {
        let store = test_store().await;
        let id = Uuid::now_v7();

        store.create_session(&id, None).await.unwrap();
        let err = store.create_session(&id, None).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_get_missing_session() {
        let store = test_store().await;
        assert!(store.get_session(&Uuid::now_v7()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_store_message_creates_missing_session() {
        let store = test_store().await;
        let id = Uuid::now_v7();

        let message = store
            .store_message(&id, MessageRole::User, "hello")
            .await
            .unwrap();
        assert_eq!(message.session_id, id);
        assert_eq!(message.role, MessageRole::User);
        assert!(message.id > 0);

        let session = store.get_session(&id).await.unwrap().unwrap();
        assert_eq!(session.title, "New Chat");
    }

    #[tokio::test]
    async fn test_load_messages_in_insertion_order() {
        let store = test_store().await;
        let id = Uuid::now_v7();
        store.create_session(&id, None).await.unwrap();

        let expected: Vec<TranscriptEntry> = (0..6)
            .map(|i| {
                if i % 2 == 0 {
                    TranscriptEntry::user(format!("question {i}"))
                } else {
                    TranscriptEntry::assistant(format!("answer {i}"))
                }
            })
            .collect();
        for entry in &expected {
            store
                .store_message(&id, entry.role, &entry.content)
                .await
                .unwrap();
        }

        let loaded = store.load_messages(&id).await.unwrap();
        assert_eq!(loaded, expected);
    }

    #[tokio::test]
    async fn test_message_ids_increase() {
        let store = test_store().await;
        let id = Uuid::now_v7();

        let first = store
            .store_message(&id, MessageRole::User, "a")
            .await
            .unwrap();
        let second = store
            .store_message(&id, MessageRole::Assistant, "b")
            .await
            .unwrap();
        assert!(second.id > first.id);
        assert!(second.timestamp >= first.timestamp);
    }

    #[tokio::test]
    async fn test_load_messages_unknown_session_is_empty() {
        let store = test_store().await;
        let loaded = store.load_messages(&Uuid::now_v7()).await.unwrap();
        assert!(loaded.is_empty());
    }

    #[tokio::test]
    async fn test_first_assistant_message_sets_title_once() {
        let store = test_store().await;
        let id = Uuid::now_v7();
        store.create_session(&id, None).await.unwrap();

        store
            .store_message(&id, MessageRole::User, "reverse a string")
            .await
            .unwrap();
        let session = store.get_session(&id).await.unwrap().unwrap();
        assert_eq!(session.title, "New Chat", "user messages keep the default");

        store
            .store_message(&id, MessageRole::Assistant, "```\ns[::-1]\n```")
            .await
            .unwrap();
        let session = store.get_session(&id).await.unwrap().unwrap();
        assert_eq!(session.title, "Chat: ```\ns[::-1]\n```");

        store
            .store_message(&id, MessageRole::Assistant, "something else")
            .await
            .unwrap();
        let session = store.get_session(&id).await.unwrap().unwrap();
        assert_eq!(session.title, "Chat: ```\ns[::-1]\n```");
    }

    #[tokio::test]
    async fn test_title_truncated_to_fifty_chars() {
        let store = test_store().await;
        let id = Uuid::now_v7();
        let content = "é".repeat(70);

        store
            .store_message(&id, MessageRole::Assistant, &content)
            .await
            .unwrap();
        let session = store.get_session(&id).await.unwrap().unwrap();
        assert_eq!(session.title, format!("Chat: {}", "é".repeat(50)));
    }

    #[tokio::test]
    async fn test_store_message_refreshes_updated_at() {
        let store = test_store().await;
        let id = Uuid::now_v7();
        let created = store.create_session(&id, None).await.unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let message = store
            .store_message(&id, MessageRole::User, "ping")
            .await
            .unwrap();

        let session = store.get_session(&id).await.unwrap().unwrap();
        assert!(session.updated_at > created.updated_at);
        assert_eq!(session.updated_at, message.timestamp);
        assert_eq!(session.created_at, created.created_at);
    }

    #[tokio::test]
    async fn test_delete_session_removes_messages() {
        let store = test_store().await;
        let id = Uuid::now_v7();
        store
            .store_message(&id, MessageRole::User, "q")
            .await
            .unwrap();
        store
            .store_message(&id, MessageRole::Assistant, "a")
            .await
            .unwrap();
        assert_eq!(message_count(&store, &id).await, 2);

        assert!(store.delete_session(&id).await.unwrap());
        assert_eq!(message_count(&store, &id).await, 0);
        assert!(store.get_session(&id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_missing_session_returns_false() {
        let store = test_store().await;
        assert!(!store.delete_session(&Uuid::now_v7()).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_leaves_other_sessions() {
        let store = test_store().await;
        let keep = Uuid::now_v7();
        let gone = Uuid::now_v7();
        store
            .store_message(&keep, MessageRole::User, "keep")
            .await
            .unwrap();
        store
            .store_message(&gone, MessageRole::User, "drop")
            .await
            .unwrap();

        store.delete_session(&gone).await.unwrap();
        assert_eq!(
            store.load_messages(&keep).await.unwrap(),
            vec![TranscriptEntry::user("keep")]
        );
    }

    #[tokio::test]
    async fn test_list_sessions_bounded_and_recent_first() {
        let store = test_store().await;
        let mut ids = Vec::new();
        for _ in 0..25 {
            let id = Uuid::now_v7();
            store.create_session(&id, None).await.unwrap();
            ids.push(id);
        }

        let sessions = store.list_sessions(20).await.unwrap();
        assert_eq!(sessions.len(), 20);
        assert_eq!(sessions[0].id, ids[24]);
        for pair in sessions.windows(2) {
            assert!(pair[0].updated_at >= pair[1].updated_at);
        }

        // Writing to the oldest session moves it to the top.
        store
            .store_message(&ids[0], MessageRole::User, "bump")
            .await
            .unwrap();
        let sessions = store.list_sessions(20).await.unwrap();
        assert_eq!(sessions[0].id, ids[0]);
    }

    #[tokio::test]
    async fn test_list_sessions_empty() {
        let store = test_store().await;
        assert!(store.list_sessions(20).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_timestamps_are_fixed_width() {
        let store = test_store().await;
        let id = Uuid::now_v7();
        store.create_session(&id, None).await.unwrap();

        let row: (String, String) =
            sqlx::query_as("SELECT created_at, updated_at FROM chat_sessions WHERE session_id = ?")
                .bind(id.to_string())
                .fetch_one(&store.pool.reader)
                .await
                .unwrap();
        assert_eq!(row.0.len(), "2025-01-01T00:00:00.000000Z".len());
        assert!(row.0.ends_with('Z'));
        assert_eq!(row.0, row.1);
    }

    /// Collects the names of spans opened while it is the default subscriber.
    struct SpanNames(Arc<Mutex<Vec<String>>>);

    impl<S: tracing::Subscriber> Layer<S> for SpanNames {
        fn on_new_span(&self, attrs: &Attributes<'_>, _id: &Id, _ctx: Context<'_, S>) {
            self.0.lock().unwrap().push(attrs.metadata().name().to_string());
        }
    }

    #[tokio::test]
    async fn test_reads_and_writes_open_spans() {
        let store = test_store().await;
        let names = Arc::new(Mutex::new(Vec::new()));
        let _guard = tracing_subscriber::registry()
            .with(SpanNames(names.clone()))
            .set_default();

        let id = Uuid::now_v7();
        store.store_message(&id, MessageRole::User, "hi").await.unwrap();
        store.get_session(&id).await.unwrap();
        store.load_messages(&id).await.unwrap();
        store.list_sessions(5).await.unwrap();

        let names = names.lock().unwrap();
        for expected in [
            "session_store.store_message",
            "session_store.get",
            "session_store.load_messages",
            "session_store.list",
        ] {
            assert!(names.iter().any(|n| n == expected), "missing span {expected}");
        }
    }
}
