//! Conversation and message core: roster, history, send/edit/delete with
//! the last-message projection and live fan-out.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use duplex_auth::User;
use duplex_database::entities::{Conversation, DirectMessage, NewMessage};
use duplex_database::repos::{ConversationRepository, MessageRepository, UserRepository};
use sqlx::SqlitePool;
use tracing::info;

use super::error::ServiceError;
use super::upload::{decode_base64_payload, AttachmentUploader, StoredAttachment};
use crate::dispatch::{Dispatcher, ServerEvent};
use crate::presence::PresenceRegistry;
use crate::routes::models::{
    Counterpart, DeleteMessageResponse, MessageView, SendMessageRequest,
};

#[derive(Clone)]
pub struct MessageService {
    pool: SqlitePool,
    presence: PresenceRegistry,
    dispatcher: Dispatcher,
    uploader: Arc<dyn AttachmentUploader>,
}

impl MessageService {
    pub fn new(
        pool: SqlitePool,
        presence: PresenceRegistry,
        dispatcher: Dispatcher,
        uploader: Arc<dyn AttachmentUploader>,
    ) -> Self {
        Self {
            pool,
            presence,
            dispatcher,
            uploader,
        }
    }

    /// Roster for the caller: every other user, their live presence and the
    /// last-message projection of the shared conversation, if one exists.
    pub async fn list_counterparts(&self, caller: &User) -> Result<Vec<Counterpart>, ServiceError> {
        let users = UserRepository::new(self.pool.clone())
            .list_excluding(caller.id)
            .await?;
        let conversations = ConversationRepository::new(self.pool.clone())
            .list_for_user(caller.id)
            .await?;
        let by_counterpart: HashMap<i64, &Conversation> = conversations
            .iter()
            .map(|conversation| (conversation.counterpart_of(caller.id), conversation))
            .collect();
        let online: HashSet<String> = self.presence.online_user_ids().await.into_iter().collect();

        let roster = users
            .into_iter()
            .map(|user| {
                let conversation = by_counterpart.get(&user.id);
                let last_message_sender_id = conversation
                    .and_then(|c| c.last_message_sender_id)
                    .map(|sender_id| {
                        if sender_id == caller.id {
                            caller.public_id.clone()
                        } else {
                            user.public_id.clone()
                        }
                    });
                Counterpart {
                    is_online: online.contains(&user.public_id),
                    last_message_preview: conversation
                        .and_then(|c| c.last_message_preview.clone()),
                    last_message_sender_id,
                    id: user.public_id,
                    display_name: user.display_name,
                    avatar_url: user.avatar_url,
                }
            })
            .collect();
        Ok(roster)
    }

    /// Full history with a counterpart in send order. A pair that never
    /// exchanged a message yields an empty list, not an error.
    pub async fn list_messages(
        &self,
        caller: &User,
        counterpart_public_id: &str,
    ) -> Result<Vec<MessageView>, ServiceError> {
        let counterpart = self.require_user(counterpart_public_id).await?;
        let conversation = ConversationRepository::new(self.pool.clone())
            .find_by_pair(caller.id, counterpart.id)
            .await?;
        let Some(conversation) = conversation else {
            return Ok(Vec::new());
        };

        let messages = MessageRepository::new(self.pool.clone())
            .list_for_conversation(conversation.id)
            .await?;
        Ok(messages
            .iter()
            .map(|message| {
                let (sender, receiver) = if message.sender_id == caller.id {
                    (caller.public_id.as_str(), counterpart.public_id.as_str())
                } else {
                    (counterpart.public_id.as_str(), caller.public_id.as_str())
                };
                message_view(message, &conversation.public_id, sender, receiver)
            })
            .collect())
    }

    /// Persist a new message and fan it out to every live connection of both
    /// participants, except the originating one.
    pub async fn send_message(
        &self,
        sender: &User,
        counterpart_public_id: &str,
        request: SendMessageRequest,
        origin_connection_id: Option<&str>,
    ) -> Result<MessageView, ServiceError> {
        let receiver = self.require_user(counterpart_public_id).await?;
        if receiver.id == sender.id {
            return Err(ServiceError::validation("cannot message yourself"));
        }

        let text = normalize_text(request.text.as_deref());
        if text.is_none() && request.image.is_none() && request.file.is_none() {
            return Err(ServiceError::validation(
                "message must carry text or an attachment",
            ));
        }

        let mut new_message = NewMessage {
            sender_id: sender.id,
            receiver_id: receiver.id,
            text,
            ..Default::default()
        };

        // Attachment upload happens before anything is persisted; an upload
        // failure leaves no partial message behind.
        if let Some(image) = &request.image {
            let stored = self.store_payload(image, "image", None).await?;
            apply_attachment(&mut new_message, stored, None);
        } else if let Some(file) = &request.file {
            let stored = self
                .store_payload(&file.data, &file.name, file.mime_type.as_deref())
                .await?;
            apply_attachment(&mut new_message, stored, Some(file.name.clone()));
        }

        let conversation = ConversationRepository::new(self.pool.clone())
            .find_or_create(sender.id, receiver.id)
            .await?;

        let mut tx = self.pool.begin().await?;
        let message = MessageRepository::insert(&mut tx, conversation.id, &new_message).await?;
        let preview = preview_of(&message);
        ConversationRepository::apply_projection(
            &mut tx,
            conversation.id,
            Some(&preview),
            Some(sender.id),
        )
        .await?;
        tx.commit().await?;

        info!(
            message_id = %message.public_id,
            conversation_id = %conversation.public_id,
            "message created"
        );

        let view = message_view(
            &message,
            &conversation.public_id,
            &sender.public_id,
            &receiver.public_id,
        );
        self.dispatcher
            .dispatch(
                &ServerEvent::MessageCreated {
                    message: view.clone(),
                },
                &[&sender.public_id, &receiver.public_id],
                origin_connection_id,
            )
            .await;
        Ok(view)
    }

    /// Replace a message's text. Only the sender may edit; an edit may not
    /// strip the last remaining content from the message.
    pub async fn edit_message(
        &self,
        requester: &User,
        message_public_id: &str,
        new_text: Option<&str>,
        origin_connection_id: Option<&str>,
    ) -> Result<MessageView, ServiceError> {
        let (message, conversation) = self.require_owned_message(requester, message_public_id).await?;

        let text = normalize_text(new_text);
        if text.is_none() && !message.has_attachment() {
            return Err(ServiceError::validation(
                "edited message must keep text or an attachment",
            ));
        }

        let mut tx = self.pool.begin().await?;
        let updated_at = MessageRepository::update_text(&mut tx, message.id, text.as_deref()).await?;
        // The projection always mirrors the chronologically-latest message,
        // whichever message was edited.
        if let Some(latest) = MessageRepository::latest_in_conversation(&mut tx, conversation.id).await? {
            let preview = preview_of(&latest);
            ConversationRepository::apply_projection(
                &mut tx,
                conversation.id,
                Some(&preview),
                Some(latest.sender_id),
            )
            .await?;
        }
        tx.commit().await?;

        let mut updated = message;
        updated.text = text;
        updated.edited = true;
        updated.updated_at = updated_at;

        let counterpart = self.counterpart_in(&conversation, requester).await?;
        let view = message_view(
            &updated,
            &conversation.public_id,
            &requester.public_id,
            &counterpart,
        );
        self.dispatcher
            .dispatch(
                &ServerEvent::MessageEdited {
                    message: view.clone(),
                },
                &[&requester.public_id, &counterpart],
                origin_connection_id,
            )
            .await;
        Ok(view)
    }

    /// Remove a message. Only the sender may delete; the projection is
    /// recomputed from whatever message is now the latest, or cleared when
    /// the conversation became empty.
    pub async fn delete_message(
        &self,
        requester: &User,
        message_public_id: &str,
        origin_connection_id: Option<&str>,
    ) -> Result<DeleteMessageResponse, ServiceError> {
        let (message, conversation) = self.require_owned_message(requester, message_public_id).await?;

        let mut tx = self.pool.begin().await?;
        MessageRepository::delete(&mut tx, message.id).await?;
        match MessageRepository::latest_in_conversation(&mut tx, conversation.id).await? {
            Some(latest) => {
                let preview = preview_of(&latest);
                ConversationRepository::apply_projection(
                    &mut tx,
                    conversation.id,
                    Some(&preview),
                    Some(latest.sender_id),
                )
                .await?;
            }
            None => {
                ConversationRepository::apply_projection(&mut tx, conversation.id, None, None)
                    .await?;
            }
        }
        tx.commit().await?;

        info!(
            message_id = %message.public_id,
            conversation_id = %conversation.public_id,
            "message deleted"
        );

        let counterpart = self.counterpart_in(&conversation, requester).await?;
        self.dispatcher
            .dispatch(
                &ServerEvent::MessageDeleted {
                    message_id: message.public_id.clone(),
                    conversation_id: conversation.public_id.clone(),
                },
                &[&requester.public_id, &counterpart],
                origin_connection_id,
            )
            .await;
        Ok(DeleteMessageResponse {
            deleted_message_id: message.public_id,
            conversation_id: conversation.public_id,
        })
    }

    async fn require_user(
        &self,
        public_id: &str,
    ) -> Result<duplex_database::entities::User, ServiceError> {
        UserRepository::new(self.pool.clone())
            .find_by_public_id(public_id)
            .await?
            .ok_or(ServiceError::NotFound)
    }

    /// Resolve a message the requester is allowed to mutate, together with
    /// its conversation.
    async fn require_owned_message(
        &self,
        requester: &User,
        message_public_id: &str,
    ) -> Result<(DirectMessage, Conversation), ServiceError> {
        let message = MessageRepository::new(self.pool.clone())
            .find_by_public_id(message_public_id)
            .await?
            .ok_or(ServiceError::NotFound)?;
        if message.sender_id != requester.id {
            return Err(ServiceError::Forbidden);
        }
        let conversation = ConversationRepository::new(self.pool.clone())
            .find_by_id(message.conversation_id)
            .await?
            .ok_or(ServiceError::NotFound)?;
        Ok((message, conversation))
    }

    async fn counterpart_in(
        &self,
        conversation: &Conversation,
        user: &User,
    ) -> Result<String, ServiceError> {
        let counterpart_id = conversation.counterpart_of(user.id);
        let counterpart = UserRepository::new(self.pool.clone())
            .find_by_id(counterpart_id)
            .await?
            .ok_or(ServiceError::NotFound)?;
        Ok(counterpart.public_id)
    }

    async fn store_payload(
        &self,
        data: &str,
        name: &str,
        declared_mime: Option<&str>,
    ) -> Result<StoredAttachment, ServiceError> {
        let (bytes, embedded_mime) =
            decode_base64_payload(data).map_err(|err| ServiceError::validation(err.to_string()))?;
        let mime = declared_mime
            .map(str::to_string)
            .or(embedded_mime)
            .unwrap_or_else(|| "application/octet-stream".to_string());
        self.uploader
            .store(&bytes, &mime, name)
            .await
            .map_err(|err| ServiceError::attachment(err.to_string()))
    }
}

/// The MIME type decides which message fields the stored blob lands in:
/// `image/*` becomes `image_url`, anything else the file triple.
fn apply_attachment(message: &mut NewMessage, stored: StoredAttachment, file_name: Option<String>) {
    if stored.mime_type.starts_with("image/") {
        message.image_url = Some(stored.url);
    } else {
        message.file_url = Some(stored.url);
        message.file_name = Some(file_name.unwrap_or_else(|| "file".to_string()));
        message.file_type = Some(stored.mime_type);
    }
}

fn normalize_text(text: Option<&str>) -> Option<String> {
    text.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

fn preview_of(message: &DirectMessage) -> String {
    if let Some(text) = message.text.as_deref().filter(|t| !t.is_empty()) {
        return text.to_string();
    }
    if message.image_url.is_some() {
        return "Image".to_string();
    }
    format!(
        "File: {}",
        message.file_name.as_deref().unwrap_or("file")
    )
}

fn message_view(
    message: &DirectMessage,
    conversation_public_id: &str,
    sender_public_id: &str,
    receiver_public_id: &str,
) -> MessageView {
    MessageView {
        id: message.public_id.clone(),
        conversation_id: conversation_public_id.to_string(),
        sender_id: sender_public_id.to_string(),
        receiver_id: receiver_public_id.to_string(),
        text: message.text.clone(),
        image_url: message.image_url.clone(),
        file_url: message.file_url.clone(),
        file_name: message.file_name.clone(),
        file_type: message.file_type.clone(),
        edited: message.edited,
        created_at: message.created_at.clone(),
        updated_at: message.updated_at.clone(),
    }
}
