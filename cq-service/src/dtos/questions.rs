use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{Comment, QuestionWithRating, Rating};

#[derive(Debug, Deserialize, Validate)]
pub struct QuestionCreateRequest {
    #[validate(length(min = 1, message = "Question text is required"))]
    pub question: String,
}

/// Editing a question creates a new version rather than mutating it in place.
#[derive(Debug, Deserialize, Validate)]
pub struct QuestionUpdateRequest {
    #[validate(length(min = 1, message = "Question text is required"))]
    pub question: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RatingSetRequest {
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CommentCreateRequest {
    #[validate(length(min = 1, message = "Comment text is required"))]
    pub comment: String,
}

#[derive(Debug, Serialize)]
pub struct QuestionResponse {
    pub id: Uuid,
    pub lineage_id: Uuid,
    pub question: String,
    pub version: i32,
    pub is_current_version: bool,
    pub aggregated_rating: i32,
    pub author_id: Uuid,
    pub group_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<QuestionWithRating> for QuestionResponse {
    fn from(q: QuestionWithRating) -> Self {
        Self {
            id: q.id,
            lineage_id: q.lineage_id,
            question: q.question,
            version: q.version,
            is_current_version: q.is_current_version,
            aggregated_rating: q.aggregated_rating,
            author_id: q.author_id,
            group_id: q.group_id,
            created_at: q.created_at,
            updated_at: q.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RatingResponse {
    pub rating: i32,
}

impl From<Rating> for RatingResponse {
    fn from(r: Rating) -> Self {
        Self { rating: r.rating }
    }
}

#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub id: Uuid,
    pub comment: String,
    pub question_id: Uuid,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Comment> for CommentResponse {
    fn from(c: Comment) -> Self {
        Self {
            id: c.id,
            comment: c.comment,
            question_id: c.question_id,
            author_id: c.author_id,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}
