use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::ProjectWithCounts;

#[derive(Debug, Deserialize, Validate)]
pub struct ProjectCreateRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,

    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ProjectUpdateRequest {
    #[validate(length(min = 1, message = "Name must not be empty"))]
    pub name: Option<String>,

    pub description: Option<String>,
}

/// Invite users by email; unknown addresses get accounts created for them.
#[derive(Debug, Deserialize, Validate)]
pub struct UsersAddRequest {
    #[validate(length(min = 1, message = "No users were selected."))]
    pub emails: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UsersRemoveRequest {
    #[validate(length(min = 1, message = "No users were selected."))]
    pub ids: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct ProjectResponse {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub no_managers: i64,
    pub no_engineers: i64,
    pub no_groups: i64,
    pub no_consolidations: i64,
    pub total_members: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProjectWithCounts> for ProjectResponse {
    fn from(p: ProjectWithCounts) -> Self {
        Self {
            id: p.id,
            name: p.name,
            description: p.description,
            no_managers: p.no_managers,
            no_engineers: p.no_engineers,
            no_groups: p.no_groups,
            no_consolidations: p.no_consolidations,
            total_members: p.total_members,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}
