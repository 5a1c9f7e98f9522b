use chrono::{Duration, Utc};
use duplex_auth::{new_public_id, AuthError, Authenticator};
use duplex_config::AuthConfig;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use std::str::FromStr;
use tempfile::TempDir;

type TestResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

fn default_auth_config() -> AuthConfig {
    AuthConfig {
        session_ttl_seconds: 3_600,
    }
}

struct TestContext {
    pool: SqlitePool,
    authenticator: Authenticator,
    _temp_dir: TempDir,
}

impl TestContext {
    async fn new() -> TestResult<Self> {
        let temp_dir = TempDir::new()?;
        let db_path = temp_dir.path().join("auth.sqlite");
        let db_url = format!("sqlite://{}", db_path.display());

        let mut options = SqliteConnectOptions::from_str(&db_url)?;
        options = options.create_if_missing(true);
        options = options.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        MIGRATOR.run(&pool).await?;

        let authenticator = Authenticator::new(pool.clone(), default_auth_config());

        Ok(Self {
            pool,
            authenticator,
            _temp_dir: temp_dir,
        })
    }

    fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    async fn insert_user(&self, public_id: &str, display_name: &str) -> TestResult<i64> {
        let now = Utc::now().to_rfc3339();
        let id = sqlx::query(
            "INSERT INTO users (public_id, email, display_name, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(public_id)
        .bind(format!("{public_id}@example.com"))
        .bind(display_name)
        .bind(&now)
        .bind(&now)
        .execute(self.pool())
        .await?
        .last_insert_rowid();

        Ok(id)
    }
}

#[tokio::test]
async fn issue_session_then_authenticate_round_trips_user() -> TestResult {
    let ctx = TestContext::new().await?;
    let user_id = ctx.insert_user("alice-1", "Alice").await?;

    let session = ctx.authenticator().issue_session(user_id).await?;
    assert!(!session.token.is_empty());
    assert!(session.expires_at > Utc::now());

    let (user, resolved) = ctx.authenticator().authenticate_token(&session.token).await?;
    assert_eq!(user.id, user_id);
    assert_eq!(user.public_id, "alice-1");
    assert_eq!(user.display_name.as_deref(), Some("Alice"));
    assert_eq!(resolved.user_id, user_id);

    Ok(())
}

#[tokio::test]
async fn authenticate_rejects_unknown_token() -> TestResult {
    let ctx = TestContext::new().await?;

    let result = ctx.authenticator().authenticate_token("no-such-token").await;
    assert!(matches!(result, Err(AuthError::SessionNotFound)));

    Ok(())
}

#[tokio::test]
async fn authenticate_deletes_expired_sessions() -> TestResult {
    let ctx = TestContext::new().await?;
    let user_id = ctx.insert_user("bob-1", "Bob").await?;

    let expired_at = (Utc::now() - Duration::hours(1)).to_rfc3339();
    let created_at = (Utc::now() - Duration::hours(2)).to_rfc3339();
    sqlx::query("INSERT INTO sessions (user_id, token, created_at, expires_at) VALUES (?, ?, ?, ?)")
        .bind(user_id)
        .bind("stale-token")
        .bind(&created_at)
        .bind(&expired_at)
        .execute(ctx.pool())
        .await?;

    let result = ctx.authenticator().authenticate_token("stale-token").await;
    assert!(matches!(result, Err(AuthError::SessionExpired)));

    let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sessions WHERE token = ?")
        .bind("stale-token")
        .fetch_one(ctx.pool())
        .await?;
    assert_eq!(remaining, 0, "expired session should be removed");

    Ok(())
}

#[test]
fn minted_public_ids_are_unique() {
    let first = new_public_id();
    let second = new_public_id();
    assert!(!first.is_empty());
    assert_ne!(first, second);
}

#[tokio::test]
async fn sessions_are_unique_per_issue() -> TestResult {
    let ctx = TestContext::new().await?;
    let user_id = ctx.insert_user("carol-1", "Carol").await?;

    let first = ctx.authenticator().issue_session(user_id).await?;
    let second = ctx.authenticator().issue_session(user_id).await?;
    assert_ne!(first.token, second.token);

    Ok(())
}
