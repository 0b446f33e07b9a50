//! User account model.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// A user account. Credentials are stored as an opaque hash/salt pair and
/// never leave the service through a DTO.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub password_hash: Vec<u8>,
    pub password_salt: Vec<u8>,
    /// Global override role: bypasses every scoped role check.
    pub is_system_admin: bool,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
