//! Repository for user reads. Users are owned by the auth collaborator;
//! the messaging core only ever reads them.

use crate::entities::User;
use sqlx::SqlitePool;

pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// All candidate counterparts for a caller, i.e. every user but the
    /// caller themselves. Stable order for a given snapshot.
    pub async fn list_excluding(&self, user_id: i64) -> Result<Vec<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, public_id, email, display_name, avatar_url, created_at, updated_at
            FROM users
            WHERE id != ?
            ORDER BY id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn find_by_public_id(&self, public_id: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, public_id, email, display_name, avatar_url, created_at, updated_at
            FROM users
            WHERE public_id = ?
            "#,
        )
        .bind(public_id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, public_id, email, display_name, avatar_url, created_at, updated_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }
}
