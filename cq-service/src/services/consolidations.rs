//! Consolidation queries: review bundles of related questions.

use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::models::{Consolidation, QuestionWithRating};

use super::error::ServiceError;

#[derive(Clone)]
pub struct ConsolidationService {
    pool: PgPool,
}

impl ConsolidationService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self))]
    pub async fn get_consolidation(&self, id: Uuid) -> Result<Consolidation, ServiceError> {
        sqlx::query_as::<_, Consolidation>("SELECT * FROM consolidations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ServiceError::ConsolidationNotFound(id))
    }

    #[instrument(skip(self))]
    pub async fn get_project_consolidations(
        &self,
        project_id: Uuid,
    ) -> Result<Vec<Consolidation>, ServiceError> {
        let consolidations = sqlx::query_as::<_, Consolidation>(
            "SELECT * FROM consolidations WHERE project_id = $1 ORDER BY name",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(consolidations)
    }

    #[instrument(skip(self))]
    pub async fn get_questions(&self, id: Uuid) -> Result<Vec<QuestionWithRating>, ServiceError> {
        let questions = sqlx::query_as::<_, QuestionWithRating>(
            "SELECT q.*,
                 COALESCE((SELECT FLOOR(AVG(r.rating))::int FROM ratings r
                           WHERE r.question_id = q.id), 0) AS aggregated_rating
             FROM questions q
             JOIN consolidated_questions cq ON cq.question_id = q.id
             WHERE cq.consolidation_id = $1
             ORDER BY q.created_at",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        Ok(questions)
    }

    /// The creating engineer becomes the consolidation's engineer.
    #[instrument(skip(self))]
    pub async fn create(
        &self,
        project_id: Uuid,
        engineer_id: Uuid,
        name: &str,
    ) -> Result<Consolidation, ServiceError> {
        sqlx::query_as::<_, Consolidation>(
            "INSERT INTO consolidations (id, name, engineer_id, project_id)
             VALUES ($1, $2, $3, $4)
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(engineer_id)
        .bind(project_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                ServiceError::Conflict(format!("A consolidation named '{name}' already exists."))
            }
            sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                ServiceError::ProjectNotFound(project_id)
            }
            _ => ServiceError::Database(e),
        })
    }

    #[instrument(skip(self))]
    pub async fn rename(&self, id: Uuid, name: &str) -> Result<Consolidation, ServiceError> {
        sqlx::query_as::<_, Consolidation>(
            "UPDATE consolidations SET name = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                ServiceError::Conflict(format!("A consolidation named '{name}' already exists."))
            }
            _ => ServiceError::Database(e),
        })?
        .ok_or(ServiceError::ConsolidationNotFound(id))
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let result = sqlx::query("DELETE FROM consolidations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ServiceError::ConsolidationNotFound(id));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn add_questions(
        &self,
        id: Uuid,
        question_ids: &[Uuid],
    ) -> Result<(), ServiceError> {
        if question_ids.is_empty() {
            return Err(ServiceError::EmptySelection);
        }
        self.get_consolidation(id).await?;
        sqlx::query(
            "INSERT INTO consolidated_questions (consolidation_id, question_id)
             SELECT $1, question_id FROM UNNEST($2::uuid[]) AS t(question_id)
             ON CONFLICT DO NOTHING",
        )
        .bind(id)
        .bind(question_ids)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn remove_questions(
        &self,
        id: Uuid,
        question_ids: &[Uuid],
    ) -> Result<(), ServiceError> {
        if question_ids.is_empty() {
            return Err(ServiceError::EmptySelection);
        }
        self.get_consolidation(id).await?;
        sqlx::query(
            "DELETE FROM consolidated_questions
             WHERE consolidation_id = $1 AND question_id = ANY($2)",
        )
        .bind(id)
        .bind(question_ids)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
