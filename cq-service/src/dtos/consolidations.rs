use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::Consolidation;

#[derive(Debug, Deserialize, Validate)]
pub struct ConsolidationCreateRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ConsolidationUpdateRequest {
    #[validate(length(min = 1, message = "Name must not be empty"))]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct QuestionSelectionRequest {
    #[validate(length(min = 1, message = "No questions were selected."))]
    pub question_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct ConsolidationResponse {
    pub id: Uuid,
    pub name: String,
    pub engineer_id: Uuid,
    pub project_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Consolidation> for ConsolidationResponse {
    fn from(c: Consolidation) -> Self {
        Self {
            id: c.id,
            name: c.name,
            engineer_id: c.engineer_id,
            project_id: c.project_id,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}
