//! Repository for conversation rows and their last-message projection.

use crate::entities::Conversation;
use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

const CONVERSATION_COLUMNS: &str = "id, public_id, user_a_id, user_b_id, \
     last_message_preview, last_message_sender_id, created_at, updated_at";

pub struct ConversationRepository {
    pool: SqlitePool,
}

impl ConversationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Canonical storage order for a participant pair. Both lookups and
    /// inserts must go through this, otherwise the UNIQUE(user_a_id,
    /// user_b_id) index cannot collapse (a, b) and (b, a).
    pub fn normalize_pair(first: i64, second: i64) -> (i64, i64) {
        if first < second {
            (first, second)
        } else {
            (second, first)
        }
    }

    pub async fn find_by_pair(
        &self,
        first: i64,
        second: i64,
    ) -> Result<Option<Conversation>, sqlx::Error> {
        let (user_a_id, user_b_id) = Self::normalize_pair(first, second);
        sqlx::query_as::<_, Conversation>(&format!(
            "SELECT {CONVERSATION_COLUMNS} FROM conversations WHERE user_a_id = ? AND user_b_id = ?"
        ))
        .bind(user_a_id)
        .bind(user_b_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Fetch the conversation for a pair, creating it on first contact.
    ///
    /// The insert is `ON CONFLICT DO NOTHING` followed by a re-fetch, so two
    /// racing callers both land on the same row instead of one of them
    /// failing on the unique index.
    pub async fn find_or_create(
        &self,
        first: i64,
        second: i64,
    ) -> Result<Conversation, sqlx::Error> {
        let (user_a_id, user_b_id) = Self::normalize_pair(first, second);
        let now = Utc::now().to_rfc3339();

        let result = sqlx::query(
            r#"
            INSERT INTO conversations (public_id, user_a_id, user_b_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT (user_a_id, user_b_id) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(user_a_id)
        .bind(user_b_id)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            tracing::debug!(user_a_id, user_b_id, "created conversation");
        }

        sqlx::query_as::<_, Conversation>(&format!(
            "SELECT {CONVERSATION_COLUMNS} FROM conversations WHERE user_a_id = ? AND user_b_id = ?"
        ))
        .bind(user_a_id)
        .bind(user_b_id)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Conversation>, sqlx::Error> {
        sqlx::query_as::<_, Conversation>(&format!(
            "SELECT {CONVERSATION_COLUMNS} FROM conversations WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// All conversations the user participates in, most recently touched
    /// first.
    pub async fn list_for_user(&self, user_id: i64) -> Result<Vec<Conversation>, sqlx::Error> {
        sqlx::query_as::<_, Conversation>(&format!(
            "SELECT {CONVERSATION_COLUMNS} FROM conversations \
             WHERE user_a_id = ? OR user_b_id = ? \
             ORDER BY updated_at DESC, id DESC"
        ))
        .bind(user_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Rewrite the last-message projection inside the caller's transaction.
    /// Passing `None` for both fields clears the projection (last message
    /// deleted, conversation now empty).
    pub async fn apply_projection(
        conn: &mut SqliteConnection,
        conversation_id: i64,
        preview: Option<&str>,
        sender_id: Option<i64>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE conversations
            SET last_message_preview = ?, last_message_sender_id = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(preview)
        .bind(sender_id)
        .bind(Utc::now().to_rfc3339())
        .bind(conversation_id)
        .execute(conn)
        .await?;
        Ok(())
    }
}
