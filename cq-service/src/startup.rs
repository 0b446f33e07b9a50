//! Application wiring: state, router and server lifecycle.

use std::future::IntoFuture;
use std::sync::Arc;

use axum::{
    http::{HeaderName, HeaderValue, Method},
    middleware,
    routing::{delete, get, patch, post, put},
    Router,
};
use service_core::error::AppError;
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::authz::{
    self, PgMembershipStore, RequiredRole, RoleResolver, GROUP_MEMBER_HEADER,
    PROJECT_ENGINEER_HEADER, PROJECT_MANAGER_HEADER, PROJECT_MEMBER_HEADER,
};
use crate::config::CqConfig;
use crate::handlers;
use crate::middleware::auth::auth_middleware;
use crate::services::{
    ConsolidationService, Database, EmailService, EncryptionService, GroupService, JwtService,
    ProjectService, QuestionService, TermService, UserService,
};

#[derive(Clone)]
pub struct AppState {
    pub config: CqConfig,
    pub db: Database,
    pub jwt: JwtService,
    pub email: EmailService,
    pub encryption: EncryptionService,
    pub users: UserService,
    pub projects: ProjectService,
    pub groups: GroupService,
    pub questions: QuestionService,
    pub consolidations: ConsolidationService,
    pub terms: TermService,
    pub roles: RoleResolver,
}

impl AppState {
    /// Wire all services onto one database handle.
    pub fn new(config: CqConfig, db: Database, email: EmailService) -> Self {
        let pool = db.pool().clone();
        let roles = RoleResolver::new(Arc::new(PgMembershipStore::new(pool.clone())));
        Self {
            jwt: JwtService::new(&config.jwt),
            email,
            encryption: EncryptionService,
            users: UserService::new(pool.clone()),
            projects: ProjectService::new(pool.clone()),
            groups: GroupService::new(pool.clone()),
            questions: QuestionService::new(pool.clone()),
            consolidations: ConsolidationService::new(pool.clone()),
            terms: TermService::new(pool),
            roles,
            config,
            db,
        }
    }
}

pub struct Application {
    port: u16,
    server: Box<dyn std::future::Future<Output = std::io::Result<()>> + Send + Unpin>,
}

impl Application {
    pub async fn build(config: CqConfig) -> Result<Self, AppError> {
        let db = Database::new(
            &config.database.url,
            config.database.max_connections,
            config.database.min_connections,
        )
        .await?;
        db.run_migrations().await?;

        let email = EmailService::new(&config.smtp)?;
        let host = config.common.host.clone();
        let port = config.common.port;
        let state = AppState::new(config, db, email);

        let app = build_router(state);

        let listener = TcpListener::bind((host.as_str(), port)).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {host}:{port}: {e}");
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        let server = axum::serve(listener, app);

        Ok(Self {
            port,
            server: Box::new(server.into_future()),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}

/// The full route table. Public so router-level tests can drive it with
/// `tower::ServiceExt::oneshot`.
pub fn build_router(state: AppState) -> Router {
    let open = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/users/register", post(handlers::users::register))
        .route("/users/login", post(handlers::users::login));

    let protected = Router::new()
        .merge(user_routes(&state))
        .merge(project_routes(&state))
        .merge(group_routes(&state))
        .merge(question_routes(&state))
        .merge(consolidation_routes(&state))
        .merge(term_routes(&state))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(open)
        .merge(protected)
        .layer(cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn user_routes(state: &AppState) -> Router<AppState> {
    let verified = Router::new()
        .route("/users", get(handlers::users::list_users))
        .route(
            "/users/email/:user_email",
            get(handlers::users::get_user_by_email),
        )
        .route_layer(middleware::from_fn_with_state(
            (state.clone(), RequiredRole::Verified),
            authz::require_role,
        ));

    let admin = Router::new()
        .route(
            "/users/:user_id",
            patch(handlers::users::update_user).delete(handlers::users::delete_user),
        )
        .route_layer(middleware::from_fn_with_state(
            (state.clone(), RequiredRole::SystemAdmin),
            authz::require_role,
        ));

    Router::new()
        .route("/users/me", get(handlers::users::me))
        .merge(verified)
        .merge(admin)
}

fn project_routes(state: &AppState) -> Router<AppState> {
    let verified = Router::new()
        .route("/projects", get(handlers::projects::list_projects))
        .route_layer(middleware::from_fn_with_state(
            (state.clone(), RequiredRole::Verified),
            authz::require_role,
        ));

    let admin = Router::new()
        .route("/projects", post(handlers::projects::create_project))
        .route(
            "/projects/:project_id",
            delete(handlers::projects::delete_project),
        )
        .route_layer(middleware::from_fn_with_state(
            (state.clone(), RequiredRole::SystemAdmin),
            authz::require_role,
        ));

    let member = Router::new()
        .route("/projects/:project_id", get(handlers::projects::get_project))
        .route_layer(middleware::from_fn_with_state(
            (state.clone(), RequiredRole::ProjectMember),
            authz::require_role,
        ));

    let manager = Router::new()
        .route("/projects/:project_id", put(handlers::projects::update_project))
        .route(
            "/projects/:project_id/managers",
            get(handlers::projects::get_managers),
        )
        .route(
            "/projects/:project_id/managers/add",
            put(handlers::projects::add_managers),
        )
        .route(
            "/projects/:project_id/managers/remove",
            put(handlers::projects::remove_managers),
        )
        .route(
            "/projects/:project_id/engineers",
            get(handlers::projects::get_engineers),
        )
        .route(
            "/projects/:project_id/engineers/add",
            put(handlers::projects::add_engineers),
        )
        .route(
            "/projects/:project_id/engineers/remove",
            put(handlers::projects::remove_engineers),
        )
        .route_layer(middleware::from_fn_with_state(
            (state.clone(), RequiredRole::ProjectManager),
            authz::require_role,
        ));

    Router::new()
        .route("/projects/my_projects", get(handlers::projects::my_projects))
        .merge(verified)
        .merge(admin)
        .merge(member)
        .merge(manager)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            authz::project_permission_headers,
        ))
}

fn group_routes(state: &AppState) -> Router<AppState> {
    let admin = Router::new()
        .route("/groups", get(handlers::groups::list_groups))
        .route_layer(middleware::from_fn_with_state(
            (state.clone(), RequiredRole::SystemAdmin),
            authz::require_role,
        ));

    let project_member = Router::new()
        .route(
            "/groups/:project_id",
            get(handlers::groups::list_project_groups),
        )
        .route_layer(middleware::from_fn_with_state(
            (state.clone(), RequiredRole::ProjectMember),
            authz::require_role,
        ));

    let manager = Router::new()
        .route("/groups/:project_id", post(handlers::groups::create_group))
        .route(
            "/groups/:project_id/:group_id",
            put(handlers::groups::update_group).delete(handlers::groups::delete_group),
        )
        .route(
            "/groups/:project_id/:group_id/members/add",
            put(handlers::groups::add_members),
        )
        .route(
            "/groups/:project_id/:group_id/members/remove",
            put(handlers::groups::remove_members),
        )
        .route_layer(middleware::from_fn_with_state(
            (state.clone(), RequiredRole::ProjectManager),
            authz::require_role,
        ));

    let group_member = Router::new()
        .route(
            "/groups/:project_id/:group_id",
            get(handlers::groups::get_group),
        )
        .route(
            "/groups/direct/:group_id",
            get(handlers::groups::get_group_direct),
        )
        .route(
            "/groups/:project_id/:group_id/members",
            get(handlers::groups::get_members),
        )
        .route_layer(middleware::from_fn_with_state(
            (state.clone(), RequiredRole::GroupMember),
            authz::require_role,
        ));

    let group_manager = Router::new()
        .route(
            "/groups/direct/:group_id/extend_members",
            post(handlers::groups::extend_members),
        )
        .route_layer(middleware::from_fn_with_state(
            (state.clone(), RequiredRole::GroupManager),
            authz::require_role,
        ));

    Router::new()
        .route("/groups/my_groups", get(handlers::groups::my_groups))
        .route(
            "/groups/my_groups/:project_id",
            get(handlers::groups::my_project_groups),
        )
        .merge(admin)
        .merge(project_member)
        .merge(manager)
        .merge(group_member)
        .merge(group_manager)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            authz::group_permission_headers,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            authz::project_permission_headers,
        ))
}

fn question_routes(state: &AppState) -> Router<AppState> {
    let group_member = Router::new()
        .route(
            "/questions/:group_id",
            get(handlers::questions::list_group_questions)
                .post(handlers::questions::create_question),
        )
        .route(
            "/questions/:group_id/:question_id",
            put(handlers::questions::new_question_version),
        )
        .route(
            "/questions/:group_id/:question_id/versions",
            get(handlers::questions::get_question_versions),
        )
        .route(
            "/questions/:group_id/:question_id/ratings",
            get(handlers::questions::get_my_rating).post(handlers::questions::rate_question),
        )
        .route(
            "/questions/:group_id/:question_id/comments",
            get(handlers::questions::list_comments).post(handlers::questions::add_comment),
        )
        .route(
            "/questions/:group_id/:question_id/annotations/:passage_id",
            put(handlers::questions::annotate_question),
        )
        .route_layer(middleware::from_fn_with_state(
            (state.clone(), RequiredRole::GroupMember),
            authz::require_role,
        ));

    let group_manager = Router::new()
        .route(
            "/questions/:group_id/:question_id",
            delete(handlers::questions::delete_question),
        )
        .route_layer(middleware::from_fn_with_state(
            (state.clone(), RequiredRole::GroupManager),
            authz::require_role,
        ));

    Router::new()
        .merge(group_member)
        .merge(group_manager)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            authz::group_permission_headers,
        ))
        // Comment removal enforces author-or-admin in the service layer.
        .route(
            "/comments/:comment_id",
            delete(handlers::questions::delete_comment),
        )
}

fn consolidation_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/consolidations/:project_id",
            get(handlers::consolidations::list_project_consolidations)
                .post(handlers::consolidations::create_consolidation),
        )
        .route(
            "/consolidations/:project_id/:consolidation_id",
            get(handlers::consolidations::get_consolidation)
                .put(handlers::consolidations::rename_consolidation)
                .delete(handlers::consolidations::delete_consolidation),
        )
        .route(
            "/consolidations/:project_id/:consolidation_id/questions",
            get(handlers::consolidations::get_consolidation_questions),
        )
        .route(
            "/consolidations/:project_id/:consolidation_id/questions/add",
            put(handlers::consolidations::add_questions),
        )
        .route(
            "/consolidations/:project_id/:consolidation_id/questions/remove",
            put(handlers::consolidations::remove_questions),
        )
        .route_layer(middleware::from_fn_with_state(
            (state.clone(), RequiredRole::ProjectEngineer),
            authz::require_role,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            authz::project_permission_headers,
        ))
}

fn term_routes(state: &AppState) -> Router<AppState> {
    let member = Router::new()
        .route("/terms/:project_id", get(handlers::terms::list_project_terms))
        .route(
            "/terms/:project_id/:term_id/passages",
            get(handlers::terms::list_passages).post(handlers::terms::add_passage),
        )
        .route_layer(middleware::from_fn_with_state(
            (state.clone(), RequiredRole::ProjectMember),
            authz::require_role,
        ));

    let engineer = Router::new()
        .route("/terms/:project_id", post(handlers::terms::create_term))
        .route(
            "/terms/:project_id/:term_id",
            delete(handlers::terms::delete_term),
        )
        .route(
            "/terms/:project_id/:term_id/passages/:passage_id",
            delete(handlers::terms::delete_passage),
        )
        .route_layer(middleware::from_fn_with_state(
            (state.clone(), RequiredRole::ProjectEngineer),
            authz::require_role,
        ));

    Router::new()
        .merge(member)
        .merge(engineer)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            authz::project_permission_headers,
        ))
}

/// CORS for browser clients; the permission headers must be exposed so UIs
/// can read them.
fn cors_layer(config: &CqConfig) -> CorsLayer {
    let exposed = [
        PROJECT_MANAGER_HEADER,
        PROJECT_ENGINEER_HEADER,
        PROJECT_MEMBER_HEADER,
        GROUP_MEMBER_HEADER,
    ]
    .map(HeaderName::from_static);

    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers(Any)
        .expose_headers(exposed);

    if config.security.allowed_origins.iter().any(|o| o == "*") {
        layer.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .security
            .allowed_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        layer.allow_origin(AllowOrigin::list(origins))
    }
}
