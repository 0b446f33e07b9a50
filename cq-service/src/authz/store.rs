//! Membership existence queries.

use async_trait::async_trait;
use service_core::error::AppError;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

/// Read-only membership checks backing the guards and permission headers.
///
/// Every check is a single DB-side join with no side effects. Unknown project
/// or group ids yield `false` rather than an error: the guard path fails
/// closed and deliberately does not distinguish "not found" from "not
/// authorized".
#[async_trait]
pub trait MembershipQueries: Send + Sync {
    /// True iff the user appears in the project's manager junction rows.
    async fn is_project_manager(&self, project_id: Uuid, user_id: Uuid) -> Result<bool, AppError>;

    /// True iff the user appears in the project's engineer junction rows.
    async fn is_project_engineer(&self, project_id: Uuid, user_id: Uuid)
        -> Result<bool, AppError>;

    /// True iff the user is a member of at least one group under the project.
    async fn is_project_member(&self, project_id: Uuid, user_id: Uuid) -> Result<bool, AppError>;

    /// True iff the user appears in the group's member junction rows.
    async fn is_group_member(&self, group_id: Uuid, user_id: Uuid) -> Result<bool, AppError>;

    /// True iff the user manages the project owning the group.
    async fn is_group_manager(&self, group_id: Uuid, user_id: Uuid) -> Result<bool, AppError>;
}

/// Postgres-backed [`MembershipQueries`] over the request-scoped pool.
#[derive(Clone)]
pub struct PgMembershipStore {
    pool: PgPool,
}

impl PgMembershipStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MembershipQueries for PgMembershipStore {
    #[instrument(skip(self))]
    async fn is_project_manager(&self, project_id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(
                 SELECT 1 FROM project_managers
                 WHERE project_id = $1 AND user_id = $2
             )",
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    #[instrument(skip(self))]
    async fn is_project_engineer(
        &self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(
                 SELECT 1 FROM project_engineers
                 WHERE project_id = $1 AND user_id = $2
             )",
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    #[instrument(skip(self))]
    async fn is_project_member(&self, project_id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(
                 SELECT 1 FROM group_members gm
                 JOIN groups g ON g.id = gm.group_id
                 WHERE g.project_id = $1 AND gm.user_id = $2
             )",
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    #[instrument(skip(self))]
    async fn is_group_member(&self, group_id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(
                 SELECT 1 FROM group_members
                 WHERE group_id = $1 AND user_id = $2
             )",
        )
        .bind(group_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    #[instrument(skip(self))]
    async fn is_group_manager(&self, group_id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(
                 SELECT 1 FROM project_managers pm
                 JOIN groups g ON g.project_id = pm.project_id
                 WHERE g.id = $1 AND pm.user_id = $2
             )",
        )
        .bind(group_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }
}
