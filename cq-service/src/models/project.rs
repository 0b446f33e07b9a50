//! Project model.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// A project. Managers and engineers are independent many-to-many relations
/// (`project_managers` / `project_engineers` junction tables); a user may hold
/// both roles at once. "Project member" is derived: a user belonging to any
/// group under the project.
#[derive(Debug, Clone, FromRow)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Project row enriched with relation counts for list/detail DTOs.
#[derive(Debug, Clone, FromRow)]
pub struct ProjectWithCounts {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub no_managers: i64,
    pub no_engineers: i64,
    pub no_groups: i64,
    pub no_consolidations: i64,
    pub total_members: i64,
}
