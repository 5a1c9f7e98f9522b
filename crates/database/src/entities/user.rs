//! User entity definitions

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A user as stored in the record store. Owned by the auth collaborator;
/// this core reads users but never mutates them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub public_id: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}
