//! Conversation entity definitions

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One row per unordered participant pair. `user_a_id < user_b_id` always
/// holds; lookups must normalise the pair before querying.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Conversation {
    pub id: i64,
    pub public_id: String,
    pub user_a_id: i64,
    pub user_b_id: i64,
    pub last_message_preview: Option<String>,
    pub last_message_sender_id: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

impl Conversation {
    /// The counterpart of `user_id` within this conversation.
    pub fn counterpart_of(&self, user_id: i64) -> i64 {
        if self.user_a_id == user_id {
            self.user_b_id
        } else {
            self.user_a_id
        }
    }
}
