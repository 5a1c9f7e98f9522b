//! Message entity definitions

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct DirectMessage {
    pub id: i64,
    pub public_id: String,
    pub conversation_id: i64,
    pub sender_id: i64,
    pub receiver_id: i64,
    pub text: Option<String>,
    pub image_url: Option<String>,
    pub file_url: Option<String>,
    pub file_name: Option<String>,
    pub file_type: Option<String>,
    pub edited: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl DirectMessage {
    pub fn has_attachment(&self) -> bool {
        self.image_url.is_some() || self.file_url.is_some()
    }
}

/// Insert request for a new message. At least one of `text` / `image_url` /
/// `file_url` must be present; the service layer enforces this before any
/// row is written.
#[derive(Debug, Clone, Default)]
pub struct NewMessage {
    pub sender_id: i64,
    pub receiver_id: i64,
    pub text: Option<String>,
    pub image_url: Option<String>,
    pub file_url: Option<String>,
    pub file_name: Option<String>,
    pub file_type: Option<String>,
}
