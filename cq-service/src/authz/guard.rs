//! Route guards: blocking pre-handler role checks.

use anyhow::anyhow;
use axum::{
    extract::{RawPathParams, Request, State},
    middleware::Next,
    response::Response,
    RequestExt,
};
use service_core::error::AppError;
use uuid::Uuid;

use crate::middleware::auth::CurrentUser;
use crate::startup::AppState;

/// Role a route demands before its handler runs.
///
/// Scoped roles read their identifier from the matched route's path
/// parameters: `project_id` for the project roles, `group_id` for the group
/// roles. Attaching a scoped guard to a route that does not declare the
/// parameter is a wiring bug and fails loudly at request time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredRole {
    SystemAdmin,
    Verified,
    ProjectManager,
    ProjectEngineer,
    ProjectMember,
    GroupMember,
    /// Manager of the project owning the group named by `group_id`.
    GroupManager,
}

impl RequiredRole {
    fn denial(self) -> AppError {
        let detail = match self {
            RequiredRole::SystemAdmin => {
                "This route may only be accessed by system administrators."
            }
            RequiredRole::Verified => "This route may only be accessed by verified users.",
            RequiredRole::ProjectManager | RequiredRole::GroupManager => {
                "This route may only be accessed by a system administrator or project manager."
            }
            RequiredRole::ProjectEngineer => {
                "This route may only be accessed by a system administrator or ontology engineer."
            }
            RequiredRole::ProjectMember => "This route may only be accessed by project members.",
            RequiredRole::GroupMember => "This route may only be accessed by group members.",
        };
        AppError::AuthError(anyhow!(detail))
    }
}

/// Guard middleware, attached per route via
/// `middleware::from_fn_with_state((state, role), require_role)`.
///
/// Requires the authentication middleware to have stored a [`CurrentUser`]
/// in the request extensions. Guards compose: a route may stack several and
/// the outermost denial wins before the handler ever runs.
pub async fn require_role(
    State((state, role)): State<(AppState, RequiredRole)>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = req
        .extensions()
        .get::<CurrentUser>()
        .cloned()
        .ok_or_else(|| {
            AppError::InternalError(anyhow!("Acting user missing from request extensions"))
        })?;

    let allowed = match role {
        RequiredRole::SystemAdmin => user.is_system_admin,
        RequiredRole::Verified => user.is_verified,
        RequiredRole::ProjectManager => {
            let id = scope_param(&mut req, "project_id").await?;
            state.roles.is_project_manager(&user, id).await?
        }
        RequiredRole::ProjectEngineer => {
            let id = scope_param(&mut req, "project_id").await?;
            state.roles.is_project_engineer(&user, id).await?
        }
        RequiredRole::ProjectMember => {
            let id = scope_param(&mut req, "project_id").await?;
            state.roles.is_project_member(&user, id).await?
        }
        RequiredRole::GroupMember => {
            let id = scope_param(&mut req, "group_id").await?;
            state.roles.is_group_member(&user, id).await?
        }
        RequiredRole::GroupManager => {
            let id = scope_param(&mut req, "group_id").await?;
            state.roles.is_group_manager(&user, id).await?
        }
    };

    if allowed {
        Ok(next.run(req).await)
    } else {
        tracing::debug!(user_id = %user.id, required_role = ?role, "Route access denied");
        Err(role.denial())
    }
}

/// Pull the scoped identifier out of the matched route's path parameters.
///
/// A missing parameter is a misconfigured route, not an authorization
/// failure; it must never silently allow or deny.
async fn scope_param(req: &mut Request, name: &'static str) -> Result<Uuid, AppError> {
    let params: RawPathParams = req
        .extract_parts()
        .await
        .map_err(|err| AppError::ConfigError(anyhow!("Path parameters unavailable: {err}")))?;

    let raw = params
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_owned())
        .ok_or_else(|| {
            AppError::ConfigError(anyhow!(
                "Route guard requires the '{name}' path parameter but the matched route does not declare it"
            ))
        })?;

    Uuid::parse_str(&raw)
        .map_err(|_| AppError::BadRequest(anyhow!("'{name}' must be a valid UUID")))
}
