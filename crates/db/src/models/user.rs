//! User entity model and DTOs.

use serde::Serialize;
use sqlx::FromRow;

use leadbook_core::types::{DbId, Timestamp};

/// A registered user (principal). `password_hash` is an argon2id PHC string
/// and must never be serialized into responses.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: DbId,
    pub username: String,
    pub display_name: String,
    pub password_hash: String,
    pub is_active: bool,
    pub created_at: Timestamp,
}

/// DTO for inserting a new user. The password has already been hashed.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub username: String,
    pub display_name: String,
    pub password_hash: String,
}

/// Public user info safe to embed in API responses.
#[derive(Debug, Clone, Serialize)]
pub struct UserInfo {
    pub id: DbId,
    pub username: String,
    pub display_name: String,
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            display_name: user.display_name.clone(),
        }
    }
}
