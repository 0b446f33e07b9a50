//! Term and passage queries (project vocabulary and annotations).

use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::models::{Passage, Term};

use super::error::ServiceError;

#[derive(Clone)]
pub struct TermService {
    pool: PgPool,
}

impl TermService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self))]
    pub async fn get_term(&self, id: Uuid) -> Result<Term, ServiceError> {
        sqlx::query_as::<_, Term>("SELECT * FROM terms WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ServiceError::TermNotFound(id))
    }

    #[instrument(skip(self))]
    pub async fn get_project_terms(&self, project_id: Uuid) -> Result<Vec<Term>, ServiceError> {
        let terms =
            sqlx::query_as::<_, Term>("SELECT * FROM terms WHERE project_id = $1 ORDER BY content")
                .bind(project_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(terms)
    }

    #[instrument(skip(self, content))]
    pub async fn create(&self, project_id: Uuid, content: &str) -> Result<Term, ServiceError> {
        sqlx::query_as::<_, Term>(
            "INSERT INTO terms (id, content, project_id) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(content)
        .bind(project_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                ServiceError::Conflict("This term already exists in the project.".to_string())
            }
            sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                ServiceError::ProjectNotFound(project_id)
            }
            _ => ServiceError::Database(e),
        })
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let result = sqlx::query("DELETE FROM terms WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ServiceError::TermNotFound(id));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_passages(&self, term_id: Uuid) -> Result<Vec<Passage>, ServiceError> {
        let passages = sqlx::query_as::<_, Passage>(
            "SELECT * FROM passages WHERE term_id = $1 ORDER BY created_at",
        )
        .bind(term_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(passages)
    }

    #[instrument(skip(self, content))]
    pub async fn add_passage(
        &self,
        term_id: Uuid,
        author_id: Uuid,
        content: &str,
    ) -> Result<Passage, ServiceError> {
        sqlx::query_as::<_, Passage>(
            "INSERT INTO passages (id, content, author_id, term_id)
             VALUES ($1, $2, $3, $4)
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(content)
        .bind(author_id)
        .bind(term_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                ServiceError::Conflict("This passage already exists for the term.".to_string())
            }
            sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                ServiceError::TermNotFound(term_id)
            }
            _ => ServiceError::Database(e),
        })
    }

    #[instrument(skip(self))]
    pub async fn delete_passage(&self, passage_id: Uuid) -> Result<(), ServiceError> {
        let result = sqlx::query("DELETE FROM passages WHERE id = $1")
            .bind(passage_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ServiceError::PassageNotFound(passage_id));
        }
        Ok(())
    }
}
