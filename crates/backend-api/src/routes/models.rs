//! Wire models shared by the REST surface and the WebSocket events.
//!
//! Everything here speaks public ids only; database row ids never cross
//! the process boundary.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A message as clients see it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MessageView {
    pub id: String,
    pub conversation_id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub text: Option<String>,
    pub image_url: Option<String>,
    pub file_url: Option<String>,
    pub file_name: Option<String>,
    pub file_type: Option<String>,
    pub edited: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Roster entry: another user plus live presence and the conversation's
/// last-message projection, when a conversation exists.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Counterpart {
    pub id: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub is_online: bool,
    pub last_message_preview: Option<String>,
    pub last_message_sender_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CounterpartsResponse {
    pub counterparts: Vec<Counterpart>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessagesResponse {
    pub messages: Vec<MessageView>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: MessageView,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteMessageResponse {
    pub deleted_message_id: String,
    pub conversation_id: String,
}

/// Body of a send. At least one of `text` / `image` / `file` must carry
/// content; the service rejects empty sends.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct SendMessageRequest {
    #[serde(default)]
    pub text: Option<String>,
    /// Base64 data URI (`data:image/png;base64,...`).
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub file: Option<FilePayload>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FilePayload {
    /// Raw base64 or a base64 data URI.
    pub data: String,
    pub name: String,
    #[serde(default)]
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateMessageRequest {
    #[serde(default)]
    pub text: Option<String>,
}
