//! Test helpers for the service layer: a migrated temp database, a wired
//! `MessageService` and raw connection handles for asserting fan-out.

use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use duplex_auth::User;
use duplex_config::UploadsConfig;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tempfile::TempDir;
use tokio::sync::mpsc;

use crate::dispatch::{Dispatcher, ServerEvent};
use crate::presence::{ConnectionHandle, PresenceRegistry};
use crate::services::message::MessageService;
use crate::services::upload::DiskUploader;

pub struct TestService {
    pub pool: SqlitePool,
    pub service: MessageService,
    pub presence: PresenceRegistry,
    _temp_dir: TempDir,
}

impl TestService {
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let db_path = temp_dir.path().join("service.db");

        let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", db_path.display()))
            .expect("invalid sqlite url")
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .expect("failed to open test database");
        duplex_database::MIGRATOR
            .run(&pool)
            .await
            .expect("migrations failed");

        let presence = PresenceRegistry::new();
        let uploader = Arc::new(DiskUploader::new(&UploadsConfig {
            dir: temp_dir.path().join("uploads").display().to_string(),
            base_url: "/uploads".to_string(),
        }));
        let service = MessageService::new(
            pool.clone(),
            presence.clone(),
            Dispatcher::new(presence.clone()),
            uploader,
        );

        Self {
            pool,
            service,
            presence,
            _temp_dir: temp_dir,
        }
    }

    pub fn connection(&self, id: &str) -> (ConnectionHandle, mpsc::Receiver<ServerEvent>) {
        let (tx, rx) = mpsc::channel(32);
        (ConnectionHandle::new(id, tx), rx)
    }
}

pub async fn create_test_user(pool: &SqlitePool, public_id: &str, display_name: &str) -> User {
    let now = Utc::now().to_rfc3339();
    let email = format!("{public_id}@example.com");
    let id = sqlx::query(
        "INSERT INTO users (public_id, email, display_name, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(public_id)
    .bind(&email)
    .bind(display_name)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await
    .expect("failed to insert test user")
    .last_insert_rowid();

    User {
        id,
        public_id: public_id.to_string(),
        email: Some(email),
        display_name: Some(display_name.to_string()),
        avatar_url: None,
    }
}
