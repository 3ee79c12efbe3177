use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqlitePoolOptions, Row, SqlitePool};

use crate::core::errors::ApiError;

/// Session used when a chat request does not name one.
pub const DEFAULT_SESSION_ID: &str = "default";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfo {
    pub id: String,
    pub title: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub message_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryMessage {
    pub id: i64,
    pub session_id: String,
    pub role: String,
    pub content: String,
    pub created_at: String,
}

/// A completed question/answer turn, in chronological order.
#[derive(Debug, Clone)]
pub struct ConversationTurn {
    pub user: String,
    pub assistant: String,
}

#[derive(Clone)]
pub struct HistoryStore {
    pool: SqlitePool,
}

impl HistoryStore {
    pub async fn new(db_path: PathBuf) -> Result<Self, ApiError> {
        let conn_str = format!("sqlite://{}?mode=rwc", db_path.to_string_lossy());
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&conn_str)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to connect to history db: {}", e)))?;

        sqlx::query("PRAGMA foreign_keys = ON")
            .execute(&pool)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to enable foreign keys: {}", e)))?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                title TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
        )
        .execute(&pool)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to init sessions table: {}", e)))?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id TEXT NOT NULL,
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY(session_id) REFERENCES sessions(id) ON DELETE CASCADE
            )",
        )
        .execute(&pool)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to init messages table: {}", e)))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_messages_session_id ON messages(session_id)")
            .execute(&pool)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to create index: {}", e)))?;

        Ok(Self { pool })
    }

    pub async fn create_session(&self, title: Option<String>) -> Result<String, ApiError> {
        let session_id = uuid::Uuid::new_v4().to_string();
        let now = chrono::Utc::now().to_rfc3339();

        sqlx::query("INSERT INTO sessions (id, title, created_at, updated_at) VALUES (?, ?, ?, ?)")
            .bind(&session_id)
            .bind(title)
            .bind(&now)
            .bind(&now)
            .execute(&self.pool)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to create session: {}", e)))?;

        Ok(session_id)
    }

    pub async fn get_session(&self, session_id: &str) -> Result<Option<SessionInfo>, ApiError> {
        let row = sqlx::query("SELECT * FROM sessions WHERE id = ?")
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let count: i64 = sqlx::query("SELECT COUNT(*) FROM messages WHERE session_id = ?")
            .bind(session_id)
            .fetch_one(&self.pool)
            .await
            .map(|r| r.get(0))
            .unwrap_or(0);

        Ok(Some(SessionInfo {
            id: row.try_get::<String, _>("id").unwrap_or_default(),
            title: row.try_get::<Option<String>, _>("title").unwrap_or(None),
            created_at: row.try_get::<String, _>("created_at").unwrap_or_default(),
            updated_at: row.try_get::<String, _>("updated_at").unwrap_or_default(),
            message_count: count,
        }))
    }

    pub async fn list_sessions(&self) -> Result<Vec<SessionInfo>, ApiError> {
        let rows = sqlx::query(
            "SELECT s.id, s.title, s.created_at, s.updated_at, \
             COUNT(m.id) as msg_count \
             FROM sessions s \
             LEFT JOIN messages m ON s.id = m.session_id \
             GROUP BY s.id \
             ORDER BY s.updated_at DESC \
             LIMIT 100",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        let mut sessions = Vec::new();
        for row in rows {
            sessions.push(SessionInfo {
                id: row.try_get::<String, _>("id").unwrap_or_default(),
                title: row.try_get::<Option<String>, _>("title").unwrap_or(None),
                created_at: row.try_get::<String, _>("created_at").unwrap_or_default(),
                updated_at: row.try_get::<String, _>("updated_at").unwrap_or_default(),
                message_count: row.try_get::<i64, _>("msg_count").unwrap_or(0),
            });
        }
        Ok(sessions)
    }

    pub async fn delete_session(&self, session_id: &str) -> Result<(), ApiError> {
        sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(ApiError::internal)?;
        Ok(())
    }

    pub async fn add_message(
        &self,
        session_id: &str,
        role: &str,
        content: &str,
    ) -> Result<i64, ApiError> {
        let now = chrono::Utc::now().to_rfc3339();

        let mut tx = self.pool.begin().await.map_err(ApiError::internal)?;

        sqlx::query("INSERT OR IGNORE INTO sessions (id, created_at, updated_at) VALUES (?, ?, ?)")
            .bind(session_id)
            .bind(&now)
            .bind(&now)
            .execute(&mut *tx)
            .await
            .map_err(ApiError::internal)?;

        sqlx::query("UPDATE sessions SET updated_at = ? WHERE id = ?")
            .bind(&now)
            .bind(session_id)
            .execute(&mut *tx)
            .await
            .map_err(ApiError::internal)?;

        let result = sqlx::query(
            "INSERT INTO messages (session_id, role, content, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(session_id)
        .bind(role)
        .bind(content)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(ApiError::internal)?;

        tx.commit().await.map_err(ApiError::internal)?;

        Ok(result.last_insert_rowid())
    }

    /// Record a full question/answer exchange as two messages.
    pub async fn add_turn(
        &self,
        session_id: &str,
        question: &str,
        answer: &str,
    ) -> Result<(), ApiError> {
        self.add_message(session_id, "human", question).await?;
        self.add_message(session_id, "ai", answer).await?;
        Ok(())
    }

    /// Last `limit` messages for a session, oldest first. `limit <= 0`
    /// returns everything.
    pub async fn get_history(
        &self,
        session_id: &str,
        limit: i64,
    ) -> Result<Vec<HistoryMessage>, ApiError> {
        let rows = if limit > 0 {
            sqlx::query(
                "SELECT * FROM (SELECT * FROM messages WHERE session_id = ? ORDER BY id DESC LIMIT ?) ORDER BY id ASC",
            )
            .bind(session_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(ApiError::internal)?
        } else {
            sqlx::query("SELECT * FROM messages WHERE session_id = ? ORDER BY id ASC")
                .bind(session_id)
                .fetch_all(&self.pool)
                .await
                .map_err(ApiError::internal)?
        };

        let mut messages = Vec::new();
        for row in rows {
            messages.push(HistoryMessage {
                id: row.try_get::<i64, _>("id").unwrap_or_default(),
                session_id: row.try_get::<String, _>("session_id").unwrap_or_default(),
                role: row.try_get::<String, _>("role").unwrap_or_default(),
                content: row.try_get::<String, _>("content").unwrap_or_default(),
                created_at: row.try_get::<String, _>("created_at").unwrap_or_default(),
            });
        }

        Ok(messages)
    }

    /// Last `limit` completed question/answer turns, oldest first.
    ///
    /// Pairs each `human` message with the `ai` message that follows it;
    /// a trailing unanswered question is dropped.
    pub async fn get_recent_turns(
        &self,
        session_id: &str,
        limit: i64,
    ) -> Result<Vec<ConversationTurn>, ApiError> {
        // Two rows per turn.
        let fetch_limit = if limit > 0 { limit * 2 } else { 0 };
        let messages = self.get_history(session_id, fetch_limit).await?;

        let mut turns = Vec::new();
        let mut pending_question: Option<String> = None;
        for message in messages {
            match message.role.as_str() {
                "human" => pending_question = Some(message.content),
                "ai" => {
                    if let Some(user) = pending_question.take() {
                        turns.push(ConversationTurn {
                            user,
                            assistant: message.content,
                        });
                    }
                }
                _ => {}
            }
        }

        if limit > 0 && turns.len() > limit as usize {
            let excess = turns.len() - limit as usize;
            turns.drain(..excess);
        }

        Ok(turns)
    }

    pub async fn get_total_message_count(&self) -> Result<i64, ApiError> {
        let count: i64 = sqlx::query("SELECT COUNT(*) FROM messages")
            .fetch_one(&self.pool)
            .await
            .map(|r| r.get(0))
            .unwrap_or(0);
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_store() -> HistoryStore {
        let path = std::env::temp_dir().join(format!("junu-history-{}.db", uuid::Uuid::new_v4()));
        HistoryStore::new(path).await.unwrap()
    }

    #[tokio::test]
    async fn add_turn_and_get_recent_turns() {
        let store = test_store().await;

        store.add_turn("s1", "q1", "a1").await.unwrap();
        store.add_turn("s1", "q2", "a2").await.unwrap();
        store.add_turn("s1", "q3", "a3").await.unwrap();

        let turns = store.get_recent_turns("s1", 2).await.unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].user, "q2");
        assert_eq!(turns[0].assistant, "a2");
        assert_eq!(turns[1].user, "q3");
        assert_eq!(turns[1].assistant, "a3");
    }

    #[tokio::test]
    async fn unanswered_question_is_not_a_turn() {
        let store = test_store().await;

        store.add_turn("s1", "q1", "a1").await.unwrap();
        store.add_message("s1", "human", "q2").await.unwrap();

        let turns = store.get_recent_turns("s1", 5).await.unwrap();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].user, "q1");
    }

    #[tokio::test]
    async fn add_message_creates_session_implicitly() {
        let store = test_store().await;

        store.add_message("implicit", "human", "hello").await.unwrap();

        let session = store.get_session("implicit").await.unwrap().unwrap();
        assert_eq!(session.message_count, 1);
    }

    #[tokio::test]
    async fn delete_session_cascades_messages() {
        let store = test_store().await;

        store.add_turn("s1", "q", "a").await.unwrap();
        store.delete_session("s1").await.unwrap();

        assert!(store.get_session("s1").await.unwrap().is_none());
        assert_eq!(store.get_total_message_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn list_sessions_reports_counts() {
        let store = test_store().await;

        let id = store.create_session(Some("कागजात".to_string())).await.unwrap();
        store.add_turn(&id, "q", "a").await.unwrap();

        let sessions = store.list_sessions().await.unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].message_count, 2);
        assert_eq!(sessions[0].title.as_deref(), Some("कागजात"));
    }
}
