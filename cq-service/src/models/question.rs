//! Question, rating and comment models.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// A competency question inside a group. Edits never mutate a row: each edit
/// inserts a new version sharing the `lineage_id` of the first version, and
/// flips `is_current_version` on the predecessor.
#[derive(Debug, Clone, FromRow)]
pub struct Question {
    pub id: Uuid,
    /// Stable id shared by all versions of one question.
    pub lineage_id: Uuid,
    pub question: String,
    pub version: i32,
    pub is_current_version: bool,
    pub author_id: Uuid,
    pub group_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Question row with its floor-averaged rating (0 when unrated).
#[derive(Debug, Clone, FromRow)]
pub struct QuestionWithRating {
    pub id: Uuid,
    pub lineage_id: Uuid,
    pub question: String,
    pub version: i32,
    pub is_current_version: bool,
    pub author_id: Uuid,
    pub group_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub aggregated_rating: i32,
}

/// A 1..=5 rating; one per (question, author), upserted on re-rating.
#[derive(Debug, Clone, FromRow)]
pub struct Rating {
    pub id: Uuid,
    pub rating: i32,
    pub question_id: Uuid,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub comment: String,
    pub question_id: Uuid,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
