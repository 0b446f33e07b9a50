//! Project handlers: CRUD plus manager/engineer roster management.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

use crate::dtos::projects::{
    ProjectCreateRequest, ProjectResponse, ProjectUpdateRequest, UsersAddRequest,
    UsersRemoveRequest,
};
use crate::dtos::users::UserResponse;
use crate::middleware::auth::CurrentUser;
use crate::services::{InvitedUsers, ProjectRoleLabel};
use crate::startup::AppState;

pub async fn list_projects(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let projects = state.projects.get_projects().await?;
    let projects: Vec<ProjectResponse> = projects.into_iter().map(ProjectResponse::from).collect();
    Ok(Json(projects))
}

pub async fn my_projects(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let projects = state.projects.my_projects(user.id).await?;
    let projects: Vec<ProjectResponse> = projects.into_iter().map(ProjectResponse::from).collect();
    Ok(Json(projects))
}

pub async fn get_project(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let project = state.projects.get_project(project_id).await?;
    Ok(Json(ProjectResponse::from(project)))
}

pub async fn create_project(
    State(state): State<AppState>,
    Json(payload): Json<ProjectCreateRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let project = state
        .projects
        .create(&payload.name, &payload.description)
        .await?;
    tracing::info!(project_id = %project.id, "Project created");
    Ok((StatusCode::CREATED, Json(ProjectResponse::from(project))))
}

pub async fn update_project(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
    Json(payload): Json<ProjectUpdateRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let project = state
        .projects
        .update(
            project_id,
            payload.name.as_deref(),
            payload.description.as_deref(),
        )
        .await?;
    Ok(Json(ProjectResponse::from(project)))
}

pub async fn delete_project(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state.projects.delete(project_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_managers(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let users = state.projects.get_managers(project_id).await?;
    let users: Vec<UserResponse> = users.into_iter().map(UserResponse::from).collect();
    Ok(Json(users))
}

pub async fn get_engineers(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let users = state.projects.get_engineers(project_id).await?;
    let users: Vec<UserResponse> = users.into_iter().map(UserResponse::from).collect();
    Ok(Json(users))
}

pub async fn add_managers(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
    Json(payload): Json<UsersAddRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let invited = state
        .users
        .get_or_create_users(&state.encryption, &payload.emails)
        .await?;
    state.projects.add_managers(project_id, &invited.ids()).await?;
    spawn_invitations(&state, project_id, invited, ProjectRoleLabel::Manager);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn remove_managers(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
    Json(payload): Json<UsersRemoveRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    state.projects.remove_managers(project_id, &payload.ids).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_engineers(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
    Json(payload): Json<UsersAddRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let invited = state
        .users
        .get_or_create_users(&state.encryption, &payload.emails)
        .await?;
    state.projects.add_engineers(project_id, &invited.ids()).await?;
    spawn_invitations(&state, project_id, invited, ProjectRoleLabel::OntologyEngineer);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn remove_engineers(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
    Json(payload): Json<UsersRemoveRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    state.projects.remove_engineers(project_id, &payload.ids).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Mail invitations after a roster change. Credentials go to freshly created
/// accounts, the role mail to everyone. Delivery is fire-and-forget: it runs
/// after the response and must never stall or fail the request.
fn spawn_invitations(
    state: &AppState,
    project_id: Uuid,
    invited: InvitedUsers,
    role: ProjectRoleLabel,
) {
    let state = state.clone();
    tokio::spawn(async move {
        let project = match state.projects.get_project(project_id).await {
            Ok(project) => project,
            Err(err) => {
                tracing::warn!(%project_id, error = %err, "Invitation mails skipped");
                return;
            }
        };

        for (user, password) in &invited.created {
            if let Err(err) = state.email.send_account_invitation(&user.email, password).await {
                tracing::warn!(to = %user.email, error = %err, "Account invitation mail failed");
            }
        }
        for user in invited.existing.iter().chain(invited.created.iter().map(|(u, _)| u)) {
            if let Err(err) = state
                .email
                .send_project_invitation(&user.email, &project.name, role)
                .await
            {
                tracing::warn!(to = %user.email, error = %err, "Project invitation mail failed");
            }
        }
    });
}
