//! Group model.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// A group inside a project. The owning project is fixed at creation; members
/// are a many-to-many relation via `group_members`.
#[derive(Debug, Clone, FromRow)]
pub struct Group {
    pub id: Uuid,
    pub name: String,
    pub project_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct GroupWithCounts {
    pub id: Uuid,
    pub name: String,
    pub project_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub no_members: i64,
    pub no_questions: i64,
}
