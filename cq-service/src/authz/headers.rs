//! Advisory permission headers, attached after the handler.

use axum::{
    extract::{RawPathParams, Request, State},
    http::HeaderValue,
    middleware::Next,
    response::Response,
    RequestExt,
};
use uuid::Uuid;

use crate::middleware::auth::CurrentUser;
use crate::startup::AppState;

pub const PROJECT_MANAGER_HEADER: &str = "permissions-project-manager";
pub const PROJECT_ENGINEER_HEADER: &str = "permissions-project-engineer";
pub const PROJECT_MEMBER_HEADER: &str = "permissions-project-member";
pub const GROUP_MEMBER_HEADER: &str = "permissions-group-member";

/// Sets `Permissions-Project-*` headers on successful responses of routes
/// carrying a `project_id` path parameter.
///
/// Purely advisory for client UIs: it never blocks, never changes status or
/// body, and any failure computing a flag degrades to `false`.
pub async fn project_permission_headers(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let project_id = scope_param(&mut req, "project_id").await;
    let user = req.extensions().get::<CurrentUser>().cloned();

    let mut response = next.run(req).await;

    let (Some(project_id), Some(user)) = (project_id, user) else {
        return response;
    };
    if !response.status().is_success() {
        return response;
    }

    // Independent checks, fanned out; errors are swallowed per flag.
    let (is_manager, is_engineer, is_member) = tokio::join!(
        state.roles.is_project_manager(&user, project_id),
        state.roles.is_project_engineer(&user, project_id),
        state.roles.is_project_member(&user, project_id),
    );
    set_flag(&mut response, PROJECT_MANAGER_HEADER, is_manager);
    set_flag(&mut response, PROJECT_ENGINEER_HEADER, is_engineer);
    set_flag(&mut response, PROJECT_MEMBER_HEADER, is_member);

    response
}

/// Sets `Permissions-Group-Member` and `Permissions-Project-Manager` (of the
/// group's owning project) on successful responses of routes carrying a
/// `group_id` path parameter. Same advisory contract as the project variant.
pub async fn group_permission_headers(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let group_id = scope_param(&mut req, "group_id").await;
    let user = req.extensions().get::<CurrentUser>().cloned();

    let mut response = next.run(req).await;

    let (Some(group_id), Some(user)) = (group_id, user) else {
        return response;
    };
    if !response.status().is_success() {
        return response;
    }

    let (is_member, is_project_manager) = tokio::join!(
        state.roles.is_group_member(&user, group_id),
        state.roles.is_group_manager(&user, group_id),
    );
    set_flag(&mut response, GROUP_MEMBER_HEADER, is_member);
    set_flag(&mut response, PROJECT_MANAGER_HEADER, is_project_manager);

    response
}

fn set_flag(
    response: &mut Response,
    name: &'static str,
    value: Result<bool, service_core::error::AppError>,
) {
    let value = value.unwrap_or_else(|err| {
        tracing::warn!(header = name, error = %err, "Permission header computation failed");
        false
    });
    let value = if value {
        HeaderValue::from_static("true")
    } else {
        HeaderValue::from_static("false")
    };
    response.headers_mut().insert(name, value);
}

/// Best-effort lookup of a scoped path parameter; unlike the guard path this
/// never fails the request.
async fn scope_param(req: &mut Request, name: &str) -> Option<Uuid> {
    let params: RawPathParams = req.extract_parts().await.ok()?;
    let raw = params
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_owned())?;
    Uuid::parse_str(&raw).ok()
}
