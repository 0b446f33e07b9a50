//! Group handlers: CRUD and member roster management.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

use crate::dtos::groups::{GroupCreateRequest, GroupResponse, GroupUpdateRequest};
use crate::dtos::projects::{UsersAddRequest, UsersRemoveRequest};
use crate::dtos::users::UserResponse;
use crate::middleware::auth::CurrentUser;
use crate::services::InvitedUsers;
use crate::startup::AppState;

pub async fn list_groups(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let groups = state.groups.get_groups().await?;
    let groups: Vec<GroupResponse> = groups.into_iter().map(GroupResponse::from).collect();
    Ok(Json(groups))
}

pub async fn list_project_groups(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let groups = state.groups.get_project_groups(project_id).await?;
    let groups: Vec<GroupResponse> = groups.into_iter().map(GroupResponse::from).collect();
    Ok(Json(groups))
}

pub async fn my_groups(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let groups = state.groups.my_groups(user.id, None).await?;
    let groups: Vec<GroupResponse> = groups.into_iter().map(GroupResponse::from).collect();
    Ok(Json(groups))
}

pub async fn my_project_groups(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let groups = state.groups.my_groups(user.id, Some(project_id)).await?;
    let groups: Vec<GroupResponse> = groups.into_iter().map(GroupResponse::from).collect();
    Ok(Json(groups))
}

pub async fn get_group(
    State(state): State<AppState>,
    Path((_project_id, group_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    let group = state.groups.get_group(group_id).await?;
    Ok(Json(GroupResponse::from(group)))
}

/// Fetch a group by id alone, for clients that hold no project context.
pub async fn get_group_direct(
    State(state): State<AppState>,
    Path(group_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let group = state.groups.get_group(group_id).await?;
    Ok(Json(GroupResponse::from(group)))
}

pub async fn create_group(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
    Json(payload): Json<GroupCreateRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let group = state.groups.create(project_id, &payload.name).await?;
    tracing::info!(group_id = %group.id, project_id = %project_id, "Group created");
    Ok((StatusCode::CREATED, Json(GroupResponse::from(group))))
}

pub async fn update_group(
    State(state): State<AppState>,
    Path((_project_id, group_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<GroupUpdateRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let group = state.groups.update(group_id, &payload.name).await?;
    Ok(Json(GroupResponse::from(group)))
}

pub async fn delete_group(
    State(state): State<AppState>,
    Path((_project_id, group_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    state.groups.delete(group_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_members(
    State(state): State<AppState>,
    Path((_project_id, group_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    let users = state.groups.get_members(group_id).await?;
    let users: Vec<UserResponse> = users.into_iter().map(UserResponse::from).collect();
    Ok(Json(users))
}

pub async fn add_members(
    State(state): State<AppState>,
    Path((_project_id, group_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UsersAddRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let invited = state
        .users
        .get_or_create_users(&state.encryption, &payload.emails)
        .await?;
    state.groups.add_members(group_id, &invited.ids()).await?;
    spawn_invitations(&state, group_id, invited);
    Ok(StatusCode::NO_CONTENT)
}

/// Extend a group's roster by email without project context in the path,
/// creating accounts for unknown addresses.
pub async fn extend_members(
    State(state): State<AppState>,
    Path(group_id): Path<Uuid>,
    Json(payload): Json<UsersAddRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let invited = state
        .users
        .get_or_create_users(&state.encryption, &payload.emails)
        .await?;
    state.groups.add_members(group_id, &invited.ids()).await?;
    spawn_invitations(&state, group_id, invited);
    Ok(StatusCode::NO_CONTENT)
}

/// Mail invitations after a roster change. Credentials go to freshly created
/// accounts, the group mail to everyone. Delivery is fire-and-forget: it runs
/// after the response and must never stall or fail the request.
fn spawn_invitations(state: &AppState, group_id: Uuid, invited: InvitedUsers) {
    let state = state.clone();
    tokio::spawn(async move {
        let context = async {
            let group = state.groups.get_group(group_id).await?;
            let project = state.projects.get_project(group.project_id).await?;
            Ok::<_, AppError>((group, project))
        };
        let (group, project) = match context.await {
            Ok(context) => context,
            Err(err) => {
                tracing::warn!(%group_id, error = %err, "Invitation mails skipped");
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
                .send_group_invitation(&user.email, &group.name, &project.name)
                .await
            {
                tracing::warn!(to = %user.email, error = %err, "Group invitation mail failed");
            }
        }
    });
}

pub async fn remove_members(
    State(state): State<AppState>,
    Path((_project_id, group_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UsersRemoveRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    state.groups.remove_members(group_id, &payload.ids).await?;
    Ok(StatusCode::NO_CONTENT)
}
