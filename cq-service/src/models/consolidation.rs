//! Consolidation model.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Groups related questions of one project for review. The engineer is the
/// creating user; questions are linked via `consolidated_questions`.
#[derive(Debug, Clone, FromRow)]
pub struct Consolidation {
    pub id: Uuid,
    pub name: String,
    pub engineer_id: Uuid,
    pub project_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
