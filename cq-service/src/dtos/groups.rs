use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::GroupWithCounts;

#[derive(Debug, Deserialize, Validate)]
pub struct GroupCreateRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct GroupUpdateRequest {
    #[validate(length(min = 1, message = "Name must not be empty"))]
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct GroupResponse {
    pub id: Uuid,
    pub name: String,
    pub project_id: Uuid,
    pub no_members: i64,
    pub no_questions: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<GroupWithCounts> for GroupResponse {
    fn from(g: GroupWithCounts) -> Self {
        Self {
            id: g.id,
            name: g.name,
            project_id: g.project_id,
            no_members: g.no_members,
            no_questions: g.no_questions,
            created_at: g.created_at,
            updated_at: g.updated_at,
        }
    }
}
