use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{Passage, Term};

#[derive(Debug, Deserialize, Validate)]
pub struct TermCreateRequest {
    #[validate(length(min = 1, message = "Term content is required"))]
    pub content: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PassageCreateRequest {
    #[validate(length(min = 1, message = "Passage content is required"))]
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct TermResponse {
    pub id: Uuid,
    pub content: String,
    pub project_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Term> for TermResponse {
    fn from(t: Term) -> Self {
        Self {
            id: t.id,
            content: t.content,
            project_id: t.project_id,
            created_at: t.created_at,
            updated_at: t.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PassageResponse {
    pub id: Uuid,
    pub content: String,
    pub author_id: Uuid,
    pub term_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Passage> for PassageResponse {
    fn from(p: Passage) -> Self {
        Self {
            id: p.id,
            content: p.content,
            author_id: p.author_id,
            term_id: p.term_id,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}
