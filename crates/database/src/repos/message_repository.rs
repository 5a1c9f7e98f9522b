//! Repository for message rows.
//!
//! Reads that feed the HTTP surface run against the pool; writes take a
//! `&mut SqliteConnection` so the service can bundle the message mutation
//! and the conversation projection update into one transaction.

use crate::entities::{DirectMessage, NewMessage};
use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

const MESSAGE_COLUMNS: &str = "id, public_id, conversation_id, sender_id, receiver_id, \
     text, image_url, file_url, file_name, file_type, edited, created_at, updated_at";

pub struct MessageRepository {
    pool: SqlitePool,
}

impl MessageRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Full history of a conversation in send order. Ties on `created_at`
    /// fall back to insertion order.
    pub async fn list_for_conversation(
        &self,
        conversation_id: i64,
    ) -> Result<Vec<DirectMessage>, sqlx::Error> {
        sqlx::query_as::<_, DirectMessage>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages \
             WHERE conversation_id = ? \
             ORDER BY created_at ASC, id ASC"
        ))
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn find_by_public_id(
        &self,
        public_id: &str,
    ) -> Result<Option<DirectMessage>, sqlx::Error> {
        sqlx::query_as::<_, DirectMessage>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE public_id = ?"
        ))
        .bind(public_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// The chronologically newest message of a conversation, if any. Used to
    /// recompute the last-message projection after an edit or delete.
    pub async fn latest_in_conversation(
        conn: &mut SqliteConnection,
        conversation_id: i64,
    ) -> Result<Option<DirectMessage>, sqlx::Error> {
        sqlx::query_as::<_, DirectMessage>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages \
             WHERE conversation_id = ? \
             ORDER BY created_at DESC, id DESC \
             LIMIT 1"
        ))
        .bind(conversation_id)
        .fetch_optional(conn)
        .await
    }

    pub async fn insert(
        conn: &mut SqliteConnection,
        conversation_id: i64,
        request: &NewMessage,
    ) -> Result<DirectMessage, sqlx::Error> {
        let public_id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        let result = sqlx::query(
            r#"
            INSERT INTO messages (
                public_id, conversation_id, sender_id, receiver_id,
                text, image_url, file_url, file_name, file_type,
                edited, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?)
            "#,
        )
        .bind(&public_id)
        .bind(conversation_id)
        .bind(request.sender_id)
        .bind(request.receiver_id)
        .bind(&request.text)
        .bind(&request.image_url)
        .bind(&request.file_url)
        .bind(&request.file_name)
        .bind(&request.file_type)
        .bind(&now)
        .bind(&now)
        .execute(conn)
        .await?;

        Ok(DirectMessage {
            id: result.last_insert_rowid(),
            public_id,
            conversation_id,
            sender_id: request.sender_id,
            receiver_id: request.receiver_id,
            text: request.text.clone(),
            image_url: request.image_url.clone(),
            file_url: request.file_url.clone(),
            file_name: request.file_name.clone(),
            file_type: request.file_type.clone(),
            edited: false,
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Replace the text body of a message and mark it edited. Attachments
    /// are immutable; only the text changes.
    pub async fn update_text(
        conn: &mut SqliteConnection,
        message_id: i64,
        text: Option<&str>,
    ) -> Result<String, sqlx::Error> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            r#"
            UPDATE messages SET text = ?, edited = 1, updated_at = ? WHERE id = ?
            "#,
        )
        .bind(text)
        .bind(&now)
        .bind(message_id)
        .execute(conn)
        .await?;
        Ok(now)
    }

    pub async fn delete(conn: &mut SqliteConnection, message_id: i64) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM messages WHERE id = ?")
            .bind(message_id)
            .execute(conn)
            .await?;
        Ok(())
    }
}
