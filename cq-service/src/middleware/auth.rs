//! Bearer-token authentication middleware.

use anyhow::anyhow;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use service_core::error::AppError;
use uuid::Uuid;

use crate::models::User;
use crate::startup::AppState;

/// The authenticated acting user, stored in request extensions by
/// [`auth_middleware`] and consumed by handlers, guards and the permission
/// header middleware.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub is_system_admin: bool,
    pub is_verified: bool,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            is_system_admin: user.is_system_admin,
            is_verified: user.is_verified,
        }
    }
}

/// Middleware to require authentication.
///
/// Validates the bearer token and resolves the acting user from the database
/// so revoked accounts and stale admin flags are caught on every request.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::AuthError(anyhow!("Missing or invalid Authorization header")))?;

    let claims = state
        .jwt
        .validate_access_token(token)
        .map_err(|_| AppError::AuthError(anyhow!("Invalid or expired token")))?;

    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| AppError::AuthError(anyhow!("Invalid token subject")))?;

    let user = state
        .users
        .get_user(user_id)
        .await
        .map_err(|_| AppError::AuthError(anyhow!("Unknown user")))?;

    req.extensions_mut().insert(CurrentUser::from(&user));

    Ok(next.run(req).await)
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<CurrentUser>().cloned().ok_or_else(|| {
            AppError::InternalError(anyhow!("Acting user missing from request extensions"))
        })
    }
}
