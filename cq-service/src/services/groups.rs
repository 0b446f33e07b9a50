//! Group queries and member management.

use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::models::{GroupWithCounts, User};

use super::error::ServiceError;

const GROUP_WITH_COUNTS: &str = "
    SELECT g.*,
        (SELECT COUNT(*) FROM group_members gm WHERE gm.group_id = g.id) AS no_members,
        (SELECT COUNT(*) FROM questions q
         WHERE q.group_id = g.id AND q.is_current_version) AS no_questions
    FROM groups g";

#[derive(Clone)]
pub struct GroupService {
    pool: PgPool,
}

impl GroupService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self))]
    pub async fn get_group(&self, id: Uuid) -> Result<GroupWithCounts, ServiceError> {
        sqlx::query_as::<_, GroupWithCounts>(&format!("{GROUP_WITH_COUNTS} WHERE g.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ServiceError::GroupNotFound(id))
    }

    #[instrument(skip(self))]
    pub async fn get_groups(&self) -> Result<Vec<GroupWithCounts>, ServiceError> {
        let groups =
            sqlx::query_as::<_, GroupWithCounts>(&format!("{GROUP_WITH_COUNTS} ORDER BY g.name"))
                .fetch_all(&self.pool)
                .await?;
        Ok(groups)
    }

    #[instrument(skip(self))]
    pub async fn get_project_groups(
        &self,
        project_id: Uuid,
    ) -> Result<Vec<GroupWithCounts>, ServiceError> {
        let groups = sqlx::query_as::<_, GroupWithCounts>(&format!(
            "{GROUP_WITH_COUNTS} WHERE g.project_id = $1 ORDER BY g.name"
        ))
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(groups)
    }

    /// Groups the user is a member of, optionally narrowed to one project.
    #[instrument(skip(self))]
    pub async fn my_groups(
        &self,
        user_id: Uuid,
        project_id: Option<Uuid>,
    ) -> Result<Vec<GroupWithCounts>, ServiceError> {
        let groups = sqlx::query_as::<_, GroupWithCounts>(&format!(
            "{GROUP_WITH_COUNTS}
             JOIN group_members me ON me.group_id = g.id AND me.user_id = $1
             WHERE $2::uuid IS NULL OR g.project_id = $2
             ORDER BY g.name"
        ))
        .bind(user_id)
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(groups)
    }

    #[instrument(skip(self))]
    pub async fn create(&self, project_id: Uuid, name: &str) -> Result<GroupWithCounts, ServiceError> {
        let id: Uuid = sqlx::query_scalar(
            "INSERT INTO groups (id, name, project_id) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(project_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                ServiceError::ProjectNotFound(project_id)
            }
            _ => ServiceError::Database(e),
        })?;
        self.get_group(id).await
    }

    #[instrument(skip(self))]
    pub async fn update(&self, id: Uuid, name: &str) -> Result<GroupWithCounts, ServiceError> {
        let result = sqlx::query("UPDATE groups SET name = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(name)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ServiceError::GroupNotFound(id));
        }
        self.get_group(id).await
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let result = sqlx::query("DELETE FROM groups WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ServiceError::GroupNotFound(id));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_members(&self, group_id: Uuid) -> Result<Vec<User>, ServiceError> {
        let users = sqlx::query_as::<_, User>(
            "SELECT u.* FROM users u
             JOIN group_members gm ON gm.user_id = u.id
             WHERE gm.group_id = $1
             ORDER BY u.name",
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    #[instrument(skip(self))]
    pub async fn add_members(&self, group_id: Uuid, user_ids: &[Uuid]) -> Result<(), ServiceError> {
        if user_ids.is_empty() {
            return Err(ServiceError::EmptySelection);
        }
        self.ensure_exists(group_id).await?;
        sqlx::query(
            "INSERT INTO group_members (user_id, group_id)
             SELECT user_id, $1 FROM UNNEST($2::uuid[]) AS t(user_id)
             ON CONFLICT DO NOTHING",
        )
        .bind(group_id)
        .bind(user_ids)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn remove_members(
        &self,
        group_id: Uuid,
        user_ids: &[Uuid],
    ) -> Result<(), ServiceError> {
        if user_ids.is_empty() {
            return Err(ServiceError::EmptySelection);
        }
        self.ensure_exists(group_id).await?;
        sqlx::query("DELETE FROM group_members WHERE group_id = $1 AND user_id = ANY($2)")
            .bind(group_id)
            .bind(user_ids)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn ensure_exists(&self, group_id: Uuid) -> Result<(), ServiceError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM groups WHERE id = $1)")
            .bind(group_id)
            .fetch_one(&self.pool)
            .await?;
        if !exists {
            return Err(ServiceError::GroupNotFound(group_id));
        }
        Ok(())
    }
}
