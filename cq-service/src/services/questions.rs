//! Question queries: versioned edits, ratings and comments.

use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::models::{Comment, Question, QuestionWithRating, Rating};

use super::error::ServiceError;

const EDIT_CONFLICT: &str = "The question was edited concurrently. Retry against the latest version.";

const QUESTION_WITH_RATING: &str = "
    SELECT q.*,
        COALESCE((SELECT FLOOR(AVG(r.rating))::int FROM ratings r WHERE r.question_id = q.id), 0)
            AS aggregated_rating
    FROM questions q";

#[derive(Clone)]
pub struct QuestionService {
    pool: PgPool,
}

impl QuestionService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self))]
    pub async fn get_question(&self, id: Uuid) -> Result<QuestionWithRating, ServiceError> {
        sqlx::query_as::<_, QuestionWithRating>(&format!("{QUESTION_WITH_RATING} WHERE q.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ServiceError::QuestionNotFound(id))
    }

    /// Current versions of all questions in a group.
    #[instrument(skip(self))]
    pub async fn get_group_questions(
        &self,
        group_id: Uuid,
    ) -> Result<Vec<QuestionWithRating>, ServiceError> {
        let questions = sqlx::query_as::<_, QuestionWithRating>(&format!(
            "{QUESTION_WITH_RATING}
             WHERE q.group_id = $1 AND q.is_current_version
             ORDER BY q.created_at"
        ))
        .bind(group_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(questions)
    }

    #[instrument(skip(self, question))]
    pub async fn create(
        &self,
        group_id: Uuid,
        author_id: Uuid,
        question: &str,
    ) -> Result<QuestionWithRating, ServiceError> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO questions (id, lineage_id, question, version, is_current_version, author_id, group_id)
             VALUES ($1, $1, $2, 1, TRUE, $3, $4)",
        )
        .bind(id)
        .bind(question)
        .bind(author_id)
        .bind(group_id)
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                ServiceError::GroupNotFound(group_id)
            }
            _ => ServiceError::Database(e),
        })?;
        self.get_question(id).await
    }

    /// Create a new version of a question: the edited text is inserted as a
    /// fresh row in the same lineage and the predecessor loses its
    /// current-version flag, all in one transaction.
    ///
    /// Concurrent edits of the same lineage serialize on the row lock of its
    /// current version; the loser surfaces as a conflict, never as a corrupt
    /// lineage.
    #[instrument(skip(self, question))]
    pub async fn new_version(
        &self,
        question_id: Uuid,
        author_id: Uuid,
        question: &str,
    ) -> Result<QuestionWithRating, ServiceError> {
        let mut tx = self.pool.begin().await?;

        let lineage_id: Option<Uuid> =
            sqlx::query_scalar("SELECT lineage_id FROM questions WHERE id = $1")
                .bind(question_id)
                .fetch_optional(&mut *tx)
                .await?;
        let lineage_id = lineage_id.ok_or(ServiceError::QuestionNotFound(question_id))?;

        let current = sqlx::query_as::<_, Question>(
            "SELECT * FROM questions
             WHERE lineage_id = $1 AND is_current_version
             FOR UPDATE",
        )
        .bind(lineage_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ServiceError::Conflict(EDIT_CONFLICT.to_string()))?;

        sqlx::query(
            "UPDATE questions SET is_current_version = FALSE, updated_at = NOW() WHERE id = $1",
        )
        .bind(current.id)
        .execute(&mut *tx)
        .await?;

        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO questions (id, lineage_id, question, version, is_current_version, author_id, group_id)
             VALUES ($1, $2, $3, $4, TRUE, $5, $6)",
        )
        .bind(id)
        .bind(lineage_id)
        .bind(question)
        .bind(current.version + 1)
        .bind(author_id)
        .bind(current.group_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                ServiceError::Conflict(EDIT_CONFLICT.to_string())
            }
            _ => ServiceError::Database(e),
        })?;

        tx.commit().await?;
        self.get_question(id).await
    }

    /// All versions of the question's lineage, oldest first.
    #[instrument(skip(self))]
    pub async fn get_versions(
        &self,
        question_id: Uuid,
    ) -> Result<Vec<QuestionWithRating>, ServiceError> {
        let versions = sqlx::query_as::<_, QuestionWithRating>(&format!(
            "{QUESTION_WITH_RATING}
             WHERE q.lineage_id = (SELECT lineage_id FROM questions WHERE id = $1)
             ORDER BY q.version"
        ))
        .bind(question_id)
        .fetch_all(&self.pool)
        .await?;
        if versions.is_empty() {
            return Err(ServiceError::QuestionNotFound(question_id));
        }
        Ok(versions)
    }

    /// Delete a question with its whole version lineage.
    #[instrument(skip(self))]
    pub async fn delete(&self, question_id: Uuid) -> Result<(), ServiceError> {
        let result = sqlx::query(
            "DELETE FROM questions
             WHERE lineage_id = (SELECT lineage_id FROM questions WHERE id = $1)",
        )
        .bind(question_id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(ServiceError::QuestionNotFound(question_id));
        }
        Ok(())
    }

    /// Upsert the acting user's rating for a question.
    #[instrument(skip(self))]
    pub async fn rate(
        &self,
        question_id: Uuid,
        author_id: Uuid,
        rating: i32,
    ) -> Result<Rating, ServiceError> {
        let rating = sqlx::query_as::<_, Rating>(
            "INSERT INTO ratings (id, rating, question_id, author_id)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (question_id, author_id)
             DO UPDATE SET rating = EXCLUDED.rating, updated_at = NOW()
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(rating)
        .bind(question_id)
        .bind(author_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                ServiceError::QuestionNotFound(question_id)
            }
            _ => ServiceError::Database(e),
        })?;
        Ok(rating)
    }

    #[instrument(skip(self))]
    pub async fn get_rating(
        &self,
        question_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Rating>, ServiceError> {
        let rating = sqlx::query_as::<_, Rating>(
            "SELECT * FROM ratings WHERE question_id = $1 AND author_id = $2",
        )
        .bind(question_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(rating)
    }

    #[instrument(skip(self))]
    pub async fn get_comments(&self, question_id: Uuid) -> Result<Vec<Comment>, ServiceError> {
        let comments = sqlx::query_as::<_, Comment>(
            "SELECT * FROM comments WHERE question_id = $1 ORDER BY created_at",
        )
        .bind(question_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(comments)
    }

    #[instrument(skip(self, comment))]
    pub async fn add_comment(
        &self,
        question_id: Uuid,
        author_id: Uuid,
        comment: &str,
    ) -> Result<Comment, ServiceError> {
        let comment = sqlx::query_as::<_, Comment>(
            "INSERT INTO comments (id, comment, question_id, author_id)
             VALUES ($1, $2, $3, $4)
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(comment)
        .bind(question_id)
        .bind(author_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                ServiceError::QuestionNotFound(question_id)
            }
            _ => ServiceError::Database(e),
        })?;
        Ok(comment)
    }

    /// Remove a comment; only its author or a system admin may do so.
    #[instrument(skip(self))]
    pub async fn delete_comment(
        &self,
        comment_id: Uuid,
        acting_user_id: Uuid,
        is_system_admin: bool,
    ) -> Result<(), ServiceError> {
        let author_id: Option<Uuid> =
            sqlx::query_scalar("SELECT author_id FROM comments WHERE id = $1")
                .bind(comment_id)
                .fetch_optional(&self.pool)
                .await?;
        let author_id = author_id.ok_or(ServiceError::CommentNotFound(comment_id))?;
        if author_id != acting_user_id && !is_system_admin {
            return Err(ServiceError::NotCommentAuthor);
        }
        sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(comment_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Link a passage to a question (annotation).
    #[instrument(skip(self))]
    pub async fn annotate(&self, question_id: Uuid, passage_id: Uuid) -> Result<(), ServiceError> {
        sqlx::query(
            "INSERT INTO annotated_passages (question_id, passage_id)
             VALUES ($1, $2)
             ON CONFLICT DO NOTHING",
        )
        .bind(question_id)
        .bind(passage_id)
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                match db_err.constraint() {
                    Some("annotated_passages_passage_id_fkey") => {
                        ServiceError::PassageNotFound(passage_id)
                    }
                    _ => ServiceError::QuestionNotFound(question_id),
                }
            }
            _ => ServiceError::Database(e),
        })?;
        Ok(())
    }
}
