//! Term and passage models (annotations).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// A term of a project's vocabulary; content is unique per project.
#[derive(Debug, Clone, FromRow)]
pub struct Term {
    pub id: Uuid,
    pub content: String,
    pub project_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A passage illustrating a term; content is unique per term. Passages are
/// linked to questions via the `annotated_passages` junction.
#[derive(Debug, Clone, FromRow)]
pub struct Passage {
    pub id: Uuid,
    pub content: String,
    pub author_id: Uuid,
    pub term_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
