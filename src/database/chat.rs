// ABOUTME: Database operations for chat sessions and their messages
// ABOUTME: Sessions are user-scoped; message appends touch the session timestamp
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Léger AI

use super::Database;
use crate::errors::{AppError, AppResult};
use crate::llm::MessageRole;
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

// ============================================================================
// Database Record Types
// ============================================================================

/// Database representation of a chat session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Unique session ID
    pub id: String,
    /// User ID who owns the session
    pub user_id: String,
    /// Session title (derived from the first query or user-defined)
    pub title: String,
    /// When the session was created (ISO 8601)
    pub created_at: String,
    /// When the session was last touched (ISO 8601)
    pub updated_at: String,
}

/// Database representation of a chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecord {
    /// Unique message ID
    pub id: String,
    /// Session ID this message belongs to
    pub session_id: String,
    /// Role of the message sender (system, user, assistant)
    pub role: String,
    /// Message content
    pub content: String,
    /// When the message was created (ISO 8601)
    pub created_at: String,
}

/// Summary of a session for listing in the sidebar
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Session ID
    pub id: String,
    /// Session title
    pub title: String,
    /// Number of messages in the session
    pub message_count: i64,
    /// When the session was created
    pub created_at: String,
    /// When the session was last touched
    pub updated_at: String,
}

// ============================================================================
// Chat Manager
// ============================================================================

/// Chat database operations manager
pub struct ChatManager {
    pool: SqlitePool,
}

impl Database {
    /// Create the chats and messages tables
    pub(super) async fn migrate_chat(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS chats (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                title TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .execute(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to create chats table: {e}")))?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS messages (
                id TEXT PRIMARY KEY,
                chat_id TEXT NOT NULL,
                role TEXT NOT NULL CHECK (role IN ('user', 'assistant', 'system')),
                content TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to create messages table: {e}")))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_chats_user ON chats(user_id, updated_at)")
            .execute(self.pool())
            .await
            .map_err(|e| AppError::database(format!("Failed to create chats index: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_messages_chat ON messages(chat_id, created_at)",
        )
        .execute(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to create messages index: {e}")))?;

        Ok(())
    }
}

impl ChatManager {
    /// Create a new chat manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ========================================================================
    // Session Operations
    // ========================================================================

    /// Create a new session
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn create_session(&self, user_id: &str, title: &str) -> AppResult<SessionRecord> {
        let id = Uuid::new_v4().to_string();
        let now = chrono::Utc::now().to_rfc3339();

        sqlx::query(
            r"
            INSERT INTO chats (id, user_id, title, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            ",
        )
        .bind(&id)
        .bind(user_id)
        .bind(title)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create session: {e}")))?;

        Ok(SessionRecord {
            id,
            user_id: user_id.to_owned(),
            title: title.to_owned(),
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Get a session by ID, scoped to its owner
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn get_session(
        &self,
        session_id: &str,
        user_id: &str,
    ) -> AppResult<Option<SessionRecord>> {
        let row = sqlx::query(
            r"
            SELECT id, user_id, title, created_at, updated_at
            FROM chats
            WHERE id = $1 AND user_id = $2
            ",
        )
        .bind(session_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get session: {e}")))?;

        Ok(row.map(|r| SessionRecord {
            id: r.get("id"),
            user_id: r.get("user_id"),
            title: r.get("title"),
            created_at: r.get("created_at"),
            updated_at: r.get("updated_at"),
        }))
    }

    /// List a user's sessions, most recently touched first
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn list_sessions(&self, user_id: &str) -> AppResult<Vec<SessionSummary>> {
        let rows = sqlx::query(
            r"
            SELECT c.id, c.title, c.created_at, c.updated_at,
                   COUNT(m.id) as message_count
            FROM chats c
            LEFT JOIN messages m ON m.chat_id = c.id
            WHERE c.user_id = $1
            GROUP BY c.id
            ORDER BY c.updated_at DESC
            ",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list sessions: {e}")))?;

        let summaries = rows
            .into_iter()
            .map(|r| SessionSummary {
                id: r.get("id"),
                title: r.get("title"),
                message_count: r.get("message_count"),
                created_at: r.get("created_at"),
                updated_at: r.get("updated_at"),
            })
            .collect();

        Ok(summaries)
    }

    /// Touch a session's updated timestamp
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn touch_session(&self, session_id: &str) -> AppResult<String> {
        let now = chrono::Utc::now().to_rfc3339();
        sqlx::query("UPDATE chats SET updated_at = $1 WHERE id = $2")
            .bind(&now)
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to touch session: {e}")))?;
        Ok(now)
    }

    /// Delete a session and all its messages
    ///
    /// Messages are removed explicitly; SQLite cascade enforcement depends on
    /// a per-connection pragma.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn delete_session(&self, session_id: &str, user_id: &str) -> AppResult<bool> {
        sqlx::query(
            r"
            DELETE FROM messages
            WHERE chat_id IN (SELECT id FROM chats WHERE id = $1 AND user_id = $2)
            ",
        )
        .bind(session_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to delete session messages: {e}")))?;

        let result = sqlx::query("DELETE FROM chats WHERE id = $1 AND user_id = $2")
            .bind(session_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to delete session: {e}")))?;

        Ok(result.rows_affected() > 0)
    }

    // ========================================================================
    // Message Operations
    // ========================================================================

    /// Append a message to a session and touch the session timestamp
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn add_message(
        &self,
        session_id: &str,
        role: MessageRole,
        content: &str,
    ) -> AppResult<MessageRecord> {
        let id = Uuid::new_v4().to_string();
        let now = chrono::Utc::now().to_rfc3339();
        let role_str = role.as_str();

        sqlx::query(
            r"
            INSERT INTO messages (id, chat_id, role, content, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(&id)
        .bind(session_id)
        .bind(role_str)
        .bind(content)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to add message: {e}")))?;

        sqlx::query("UPDATE chats SET updated_at = $1 WHERE id = $2")
            .bind(&now)
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to touch session timestamp: {e}")))?;

        Ok(MessageRecord {
            id,
            session_id: session_id.to_owned(),
            role: role_str.to_owned(),
            content: content.to_owned(),
            created_at: now,
        })
    }

    /// Get all messages for a session in chronological order
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn get_messages(&self, session_id: &str) -> AppResult<Vec<MessageRecord>> {
        let rows = sqlx::query(
            r"
            SELECT id, chat_id, role, content, created_at
            FROM messages
            WHERE chat_id = $1
            ORDER BY created_at ASC
            ",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get messages: {e}")))?;

        let messages = rows
            .into_iter()
            .map(|r| MessageRecord {
                id: r.get("id"),
                session_id: r.get("chat_id"),
                role: r.get("role"),
                content: r.get("content"),
                created_at: r.get("created_at"),
            })
            .collect();

        Ok(messages)
    }
}
