//! Project queries and manager/engineer membership mutation.

use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::models::{ProjectWithCounts, User};

use super::error::ServiceError;

const PROJECT_WITH_COUNTS: &str = "
    SELECT p.*,
        (SELECT COUNT(*) FROM project_managers pm WHERE pm.project_id = p.id) AS no_managers,
        (SELECT COUNT(*) FROM project_engineers pe WHERE pe.project_id = p.id) AS no_engineers,
        (SELECT COUNT(*) FROM groups g WHERE g.project_id = p.id) AS no_groups,
        (SELECT COUNT(*) FROM consolidations c WHERE c.project_id = p.id) AS no_consolidations,
        (SELECT COUNT(DISTINCT gm.user_id)
         FROM group_members gm
         JOIN groups g ON g.id = gm.group_id
         WHERE g.project_id = p.id) AS total_members
    FROM projects p";

#[derive(Clone)]
pub struct ProjectService {
    pool: PgPool,
}

impl ProjectService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self))]
    pub async fn get_project(&self, id: Uuid) -> Result<ProjectWithCounts, ServiceError> {
        sqlx::query_as::<_, ProjectWithCounts>(&format!("{PROJECT_WITH_COUNTS} WHERE p.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ServiceError::ProjectNotFound(id))
    }

    #[instrument(skip(self))]
    pub async fn get_projects(&self) -> Result<Vec<ProjectWithCounts>, ServiceError> {
        let projects =
            sqlx::query_as::<_, ProjectWithCounts>(&format!("{PROJECT_WITH_COUNTS} ORDER BY p.name"))
                .fetch_all(&self.pool)
                .await?;
        Ok(projects)
    }

    /// Projects the user is a member of, i.e. belongs to at least one group of.
    #[instrument(skip(self))]
    pub async fn my_projects(&self, user_id: Uuid) -> Result<Vec<ProjectWithCounts>, ServiceError> {
        let projects = sqlx::query_as::<_, ProjectWithCounts>(&format!(
            "{PROJECT_WITH_COUNTS}
             WHERE EXISTS(
                 SELECT 1 FROM group_members gm
                 JOIN groups g ON g.id = gm.group_id
                 WHERE g.project_id = p.id AND gm.user_id = $1
             )
             ORDER BY p.name"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(projects)
    }

    #[instrument(skip(self))]
    pub async fn create(
        &self,
        name: &str,
        description: &str,
    ) -> Result<ProjectWithCounts, ServiceError> {
        let id: Uuid = sqlx::query_scalar(
            "INSERT INTO projects (id, name, description) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(description)
        .fetch_one(&self.pool)
        .await?;
        self.get_project(id).await
    }

    #[instrument(skip(self))]
    pub async fn update(
        &self,
        id: Uuid,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<ProjectWithCounts, ServiceError> {
        let result = sqlx::query(
            "UPDATE projects SET
                 name = COALESCE($2, name),
                 description = COALESCE($3, description),
                 updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(name)
        .bind(description)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(ServiceError::ProjectNotFound(id));
        }
        self.get_project(id).await
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ServiceError::ProjectNotFound(id));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_managers(&self, project_id: Uuid) -> Result<Vec<User>, ServiceError> {
        let users = sqlx::query_as::<_, User>(
            "SELECT u.* FROM users u
             JOIN project_managers pm ON pm.user_id = u.id
             WHERE pm.project_id = $1
             ORDER BY u.name",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    #[instrument(skip(self))]
    pub async fn get_engineers(&self, project_id: Uuid) -> Result<Vec<User>, ServiceError> {
        let users = sqlx::query_as::<_, User>(
            "SELECT u.* FROM users u
             JOIN project_engineers pe ON pe.user_id = u.id
             WHERE pe.project_id = $1
             ORDER BY u.name",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    #[instrument(skip(self))]
    pub async fn add_managers(
        &self,
        project_id: Uuid,
        user_ids: &[Uuid],
    ) -> Result<(), ServiceError> {
        if user_ids.is_empty() {
            return Err(ServiceError::EmptySelection);
        }
        self.ensure_exists(project_id).await?;
        sqlx::query(
            "INSERT INTO project_managers (user_id, project_id)
             SELECT user_id, $1 FROM UNNEST($2::uuid[]) AS t(user_id)
             ON CONFLICT DO NOTHING",
        )
        .bind(project_id)
        .bind(user_ids)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn remove_managers(
        &self,
        project_id: Uuid,
        user_ids: &[Uuid],
    ) -> Result<(), ServiceError> {
        if user_ids.is_empty() {
            return Err(ServiceError::EmptySelection);
        }
        self.ensure_exists(project_id).await?;
        sqlx::query("DELETE FROM project_managers WHERE project_id = $1 AND user_id = ANY($2)")
            .bind(project_id)
            .bind(user_ids)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn add_engineers(
        &self,
        project_id: Uuid,
        user_ids: &[Uuid],
    ) -> Result<(), ServiceError> {
        if user_ids.is_empty() {
            return Err(ServiceError::EmptySelection);
        }
        self.ensure_exists(project_id).await?;
        sqlx::query(
            "INSERT INTO project_engineers (user_id, project_id)
             SELECT user_id, $1 FROM UNNEST($2::uuid[]) AS t(user_id)
             ON CONFLICT DO NOTHING",
        )
        .bind(project_id)
        .bind(user_ids)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn remove_engineers(
        &self,
        project_id: Uuid,
        user_ids: &[Uuid],
    ) -> Result<(), ServiceError> {
        if user_ids.is_empty() {
            return Err(ServiceError::EmptySelection);
        }
        self.ensure_exists(project_id).await?;
        sqlx::query("DELETE FROM project_engineers WHERE project_id = $1 AND user_id = ANY($2)")
            .bind(project_id)
            .bind(user_ids)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn ensure_exists(&self, project_id: Uuid) -> Result<(), ServiceError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM projects WHERE id = $1)")
            .bind(project_id)
            .fetch_one(&self.pool)
            .await?;
        if !exists {
            return Err(ServiceError::ProjectNotFound(project_id));
        }
        Ok(())
    }
}
