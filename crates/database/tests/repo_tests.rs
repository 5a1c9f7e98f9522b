//! Repository behaviour against a real (temporary) sqlite database.

use chrono::Utc;
use duplex_config::DatabaseConfig;
use duplex_database::entities::NewMessage;
use duplex_database::repos::{ConversationRepository, MessageRepository, UserRepository};
use duplex_database::{prepare_database, run_migrations};
use sqlx::SqlitePool;
use tempfile::TempDir;

struct TestContext {
    pool: SqlitePool,
    _temp_dir: TempDir,
}

impl TestContext {
    async fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("repos.db");
        let config = DatabaseConfig {
            url: format!("sqlite://{}", db_path.display()),
            max_connections: 5,
        };
        let pool = prepare_database(&config).await.unwrap();
        run_migrations(&pool).await.unwrap();
        Self {
            pool,
            _temp_dir: temp_dir,
        }
    }

    async fn insert_user(&self, public_id: &str, display_name: &str) -> i64 {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO users (public_id, display_name, created_at, updated_at) VALUES (?, ?, ?, ?)",
        )
        .bind(public_id)
        .bind(display_name)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .unwrap()
        .last_insert_rowid()
    }
}

#[tokio::test]
async fn find_or_create_is_pair_order_insensitive() {
    let ctx = TestContext::new().await;
    let alice = ctx.insert_user("alice", "Alice").await;
    let bob = ctx.insert_user("bob", "Bob").await;

    let repo = ConversationRepository::new(ctx.pool.clone());
    let first = repo.find_or_create(alice, bob).await.unwrap();
    let second = repo.find_or_create(bob, alice).await.unwrap();

    assert_eq!(first.id, second.id);
    assert!(first.user_a_id < first.user_b_id);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM conversations")
        .fetch_one(&ctx.pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn messages_list_in_send_order() {
    let ctx = TestContext::new().await;
    let alice = ctx.insert_user("alice", "Alice").await;
    let bob = ctx.insert_user("bob", "Bob").await;

    let conversations = ConversationRepository::new(ctx.pool.clone());
    let conversation = conversations.find_or_create(alice, bob).await.unwrap();

    let mut tx = ctx.pool.begin().await.unwrap();
    for body in ["first", "second", "third"] {
        let request = NewMessage {
            sender_id: alice,
            receiver_id: bob,
            text: Some(body.to_string()),
            ..Default::default()
        };
        MessageRepository::insert(&mut tx, conversation.id, &request)
            .await
            .unwrap();
    }
    tx.commit().await.unwrap();

    let messages = MessageRepository::new(ctx.pool.clone())
        .list_for_conversation(conversation.id)
        .await
        .unwrap();
    let bodies: Vec<_> = messages
        .iter()
        .map(|m| m.text.as_deref().unwrap())
        .collect();
    assert_eq!(bodies, vec!["first", "second", "third"]);
}

#[tokio::test]
async fn latest_in_conversation_picks_newest_row() {
    let ctx = TestContext::new().await;
    let alice = ctx.insert_user("alice", "Alice").await;
    let bob = ctx.insert_user("bob", "Bob").await;

    let conversations = ConversationRepository::new(ctx.pool.clone());
    let conversation = conversations.find_or_create(alice, bob).await.unwrap();

    let mut tx = ctx.pool.begin().await.unwrap();
    for body in ["older", "newest"] {
        let request = NewMessage {
            sender_id: alice,
            receiver_id: bob,
            text: Some(body.to_string()),
            ..Default::default()
        };
        MessageRepository::insert(&mut tx, conversation.id, &request)
            .await
            .unwrap();
    }
    let latest = MessageRepository::latest_in_conversation(&mut tx, conversation.id)
        .await
        .unwrap()
        .unwrap();
    tx.commit().await.unwrap();

    assert_eq!(latest.text.as_deref(), Some("newest"));
}

#[tokio::test]
async fn apply_projection_clears_with_none() {
    let ctx = TestContext::new().await;
    let alice = ctx.insert_user("alice", "Alice").await;
    let bob = ctx.insert_user("bob", "Bob").await;

    let conversations = ConversationRepository::new(ctx.pool.clone());
    let conversation = conversations.find_or_create(alice, bob).await.unwrap();

    let mut tx = ctx.pool.begin().await.unwrap();
    ConversationRepository::apply_projection(&mut tx, conversation.id, Some("hello"), Some(alice))
        .await
        .unwrap();
    tx.commit().await.unwrap();

    let updated = conversations
        .find_by_id(conversation.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.last_message_preview.as_deref(), Some("hello"));
    assert_eq!(updated.last_message_sender_id, Some(alice));

    let mut tx = ctx.pool.begin().await.unwrap();
    ConversationRepository::apply_projection(&mut tx, conversation.id, None, None)
        .await
        .unwrap();
    tx.commit().await.unwrap();

    let cleared = conversations
        .find_by_id(conversation.id)
        .await
        .unwrap()
        .unwrap();
    assert!(cleared.last_message_preview.is_none());
    assert!(cleared.last_message_sender_id.is_none());
}

#[tokio::test]
async fn list_excluding_hides_the_caller() {
    let ctx = TestContext::new().await;
    let alice = ctx.insert_user("alice", "Alice").await;
    ctx.insert_user("bob", "Bob").await;
    ctx.insert_user("carol", "Carol").await;

    let users = UserRepository::new(ctx.pool.clone())
        .list_excluding(alice)
        .await
        .unwrap();
    let ids: Vec<_> = users.iter().map(|u| u.public_id.as_str()).collect();
    assert_eq!(ids, vec!["bob", "carol"]);
}
