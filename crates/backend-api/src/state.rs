use std::sync::Arc;

use duplex_auth::{AuthSession, Authenticator, User};
use sqlx::SqlitePool;

use crate::dispatch::Dispatcher;
use crate::presence::PresenceRegistry;
use crate::services::message::MessageService;
use crate::services::upload::AttachmentUploader;
use crate::ApiError;

#[derive(Clone)]
pub struct AppState {
    db_pool: SqlitePool,
    authenticator: Authenticator,
    presence: PresenceRegistry,
    dispatcher: Dispatcher,
    uploader: Arc<dyn AttachmentUploader>,
}

impl AppState {
    pub fn new(
        db_pool: SqlitePool,
        authenticator: Authenticator,
        uploader: Arc<dyn AttachmentUploader>,
    ) -> Self {
        let presence = PresenceRegistry::new();
        let dispatcher = Dispatcher::new(presence.clone());
        Self {
            db_pool,
            authenticator,
            presence,
            dispatcher,
            uploader,
        }
    }

    pub fn db_pool(&self) -> &SqlitePool {
        &self.db_pool
    }

    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    pub fn presence(&self) -> &PresenceRegistry {
        &self.presence
    }

    pub fn message_service(&self) -> MessageService {
        MessageService::new(
            self.db_pool.clone(),
            self.presence.clone(),
            self.dispatcher.clone(),
            self.uploader.clone(),
        )
    }

    pub async fn authenticate(&self, token: &str) -> Result<(User, AuthSession), ApiError> {
        self.authenticator
            .authenticate_token(token)
            .await
            .map_err(ApiError::from)
    }
}
