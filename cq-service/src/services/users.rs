//! User account queries and the get-or-create invitation flow.

use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::models::User;

use super::error::ServiceError;
use super::password::EncryptionService;

/// Users resolved by an invitation flow: the ones that already existed and
/// the ones freshly created together with their generated initial password.
pub struct InvitedUsers {
    pub existing: Vec<User>,
    pub created: Vec<(User, String)>,
}

impl InvitedUsers {
    /// All resolved user ids, existing and created.
    pub fn ids(&self) -> Vec<Uuid> {
        self.existing
            .iter()
            .map(|u| u.id)
            .chain(self.created.iter().map(|(u, _)| u.id))
            .collect()
    }
}

#[derive(Clone)]
pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self))]
    pub async fn get_user(&self, id: Uuid) -> Result<User, ServiceError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ServiceError::UserNotFound(id))
    }

    #[instrument(skip(self))]
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, ServiceError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    #[instrument(skip(self))]
    pub async fn get_users(&self) -> Result<Vec<User>, ServiceError> {
        let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    #[instrument(skip(self, password_hash, password_salt))]
    pub async fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &[u8],
        password_salt: &[u8],
        is_verified: bool,
        is_system_admin: bool,
    ) -> Result<User, ServiceError> {
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (id, email, name, password_hash, password_salt, is_system_admin, is_verified)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(name)
        .bind(password_hash)
        .bind(password_salt)
        .bind(is_system_admin)
        .bind(is_verified)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                match db_err.constraint() {
                    Some("users_email_key") => ServiceError::EmailInUse(email.to_string()),
                    _ => ServiceError::NameInUse(name.to_string()),
                }
            }
            _ => ServiceError::Database(e),
        })?;
        Ok(user)
    }

    #[instrument(skip(self))]
    pub async fn update_user(
        &self,
        id: Uuid,
        name: Option<&str>,
        email: Option<&str>,
        is_verified: Option<bool>,
        is_system_admin: Option<bool>,
    ) -> Result<User, ServiceError> {
        sqlx::query_as::<_, User>(
            "UPDATE users SET
                 name = COALESCE($2, name),
                 email = COALESCE($3, email),
                 is_verified = COALESCE($4, is_verified),
                 is_system_admin = COALESCE($5, is_system_admin),
                 updated_at = NOW()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(name)
        .bind(email)
        .bind(is_verified)
        .bind(is_system_admin)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ServiceError::UserNotFound(id))
    }

    #[instrument(skip(self))]
    pub async fn delete_user(&self, id: Uuid) -> Result<(), ServiceError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ServiceError::UserNotFound(id));
        }
        Ok(())
    }

    /// Resolve a list of emails to users, creating missing accounts with a
    /// generated initial password. Created accounts start unverified; the
    /// caller is responsible for mailing the credentials.
    #[instrument(skip(self, encryption))]
    pub async fn get_or_create_users(
        &self,
        encryption: &EncryptionService,
        emails: &[String],
    ) -> Result<InvitedUsers, ServiceError> {
        let mut invited = InvitedUsers {
            existing: Vec::new(),
            created: Vec::new(),
        };

        for email in emails {
            if let Some(user) = self.get_user_by_email(email).await? {
                invited.existing.push(user);
                continue;
            }

            let password = encryption.generate_password();
            let hashed = encryption.hash_password(&password)?;
            // The email doubles as the initial unique name.
            let user = self
                .create_user(email, email, &hashed.hash, &hashed.salt, false, false)
                .await?;
            invited.created.push((user, password));
        }

        Ok(invited)
    }
}
