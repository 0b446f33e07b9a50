//! Account handlers: registration, login and user administration.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

use crate::dtos::users::{
    LoginRequest, LoginResponse, RegisterRequest, UserResponse, UserUpdateRequest,
};
use crate::middleware::auth::CurrentUser;
use crate::services::ServiceError;
use crate::startup::AppState;

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let hashed = state.encryption.hash_password(&payload.password)?;
    let user = state
        .users
        .create_user(
            &payload.name,
            &payload.email,
            &hashed.hash,
            &hashed.salt,
            false,
            false,
        )
        .await?;

    tracing::info!(user_id = %user.id, "User registered");
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user = state
        .users
        .get_user_by_email(&payload.email)
        .await?
        .ok_or(ServiceError::InvalidCredentials)?;

    let valid = state
        .encryption
        .verify_password(&payload.password, &user.password_hash, &user.password_salt)?;
    if !valid {
        return Err(ServiceError::InvalidCredentials.into());
    }

    let token = state.jwt.issue_access_token(user.id, &user.email)?;
    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(LoginResponse {
        token,
        user: UserResponse::from(user),
    }))
}

pub async fn list_users(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let users = state.users.get_users().await?;
    let users: Vec<UserResponse> = users.into_iter().map(UserResponse::from).collect();
    Ok(Json(users))
}

pub async fn get_user_by_email(
    State(state): State<AppState>,
    Path(user_email): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .users
        .get_user_by_email(&user_email)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(anyhow::anyhow!(
                "No user with email '{user_email}' was found."
            ))
        })?;
    Ok(Json(UserResponse::from(user)))
}

pub async fn me(user: CurrentUser) -> impl IntoResponse {
    Json(UserResponse {
        id: user.id,
        email: user.email,
        name: user.name,
        is_system_admin: user.is_system_admin,
        is_verified: user.is_verified,
    })
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<UserUpdateRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user = state
        .users
        .update_user(
            user_id,
            payload.name.as_deref(),
            payload.email.as_deref(),
            payload.is_verified,
            payload.is_system_admin,
        )
        .await?;
    Ok(Json(UserResponse::from(user)))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state.users.delete_user(user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
