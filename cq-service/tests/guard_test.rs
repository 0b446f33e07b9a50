//! Router-level guard and permission header tests that run without a
//! database: a lazily-connected pool to an unreachable address proves which
//! paths never issue a membership query.

mod common;

use axum::{
    body::Body,
    extract::Request,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::get,
    Router,
};
use cq_service::authz::{
    self, RequiredRole, GROUP_MEMBER_HEADER, PROJECT_ENGINEER_HEADER, PROJECT_MANAGER_HEADER,
    PROJECT_MEMBER_HEADER,
};
use cq_service::middleware::CurrentUser;
use cq_service::services::{Database, EmailService};
use cq_service::startup::AppState;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

/// State whose pool points at a closed port; any query would error, and an
/// eager connection attempt would too.
fn unreachable_state() -> AppState {
    let config = common::test_config("postgres://nobody@127.0.0.1:1/unreachable".to_string());
    let pool = PgPool::connect_lazy(&config.database.url).expect("lazy pool");
    let email = EmailService::new(&config.smtp).expect("email service");
    AppState::new(config, Database::from_pool(pool), email)
}

fn test_user(is_verified: bool, is_system_admin: bool) -> CurrentUser {
    CurrentUser {
        id: Uuid::new_v4(),
        email: "user@example.com".to_string(),
        name: "user".to_string(),
        is_system_admin,
        is_verified,
    }
}

/// A router with one guarded route and the given acting user pre-inserted,
/// standing in for the authentication middleware.
fn guarded_router(state: AppState, path: &str, role: RequiredRole, user: CurrentUser) -> Router {
    Router::new()
        .route(path, get(|| async { "ok" }))
        .route_layer(middleware::from_fn_with_state(
            (state, role),
            authz::require_role,
        ))
        .layer(middleware::map_request(move |mut req: Request| {
            let user = user.clone();
            async move {
                req.extensions_mut().insert(user);
                req
            }
        }))
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn scoped_guard_without_its_path_parameter_is_a_server_error() {
    let router = guarded_router(
        unreachable_state(),
        "/things/:thing_id",
        RequiredRole::ProjectManager,
        test_user(true, false),
    );

    let response = router
        .oneshot(
            Request::builder()
                .uri(format!("/things/{}", Uuid::new_v4()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Configuration error");
}

#[tokio::test]
async fn admin_only_route_denies_regular_users() {
    let router = guarded_router(
        unreachable_state(),
        "/admin",
        RequiredRole::SystemAdmin,
        test_user(true, false),
    );

    let response = router
        .oneshot(Request::builder().uri("/admin").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(
        body["error"],
        "This route may only be accessed by system administrators."
    );
}

#[tokio::test]
async fn verified_guard_denies_unverified_users() {
    let router = guarded_router(
        unreachable_state(),
        "/users",
        RequiredRole::Verified,
        test_user(false, false),
    );

    let response = router
        .oneshot(Request::builder().uri("/users").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(
        body["error"],
        "This route may only be accessed by verified users."
    );
}

#[tokio::test]
async fn system_admin_short_circuits_scoped_guards_without_any_query() {
    // The pool cannot serve queries, so a 200 proves none were issued.
    let router = guarded_router(
        unreachable_state(),
        "/projects/:project_id",
        RequiredRole::ProjectManager,
        test_user(true, true),
    );

    let response = router
        .oneshot(
            Request::builder()
                .uri(format!("/projects/{}", Uuid::new_v4()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn header_middleware_leaves_unscoped_responses_untouched() {
    let router = Router::new()
        .route("/plain", get(|| async { "hello" }))
        .layer(middleware::from_fn_with_state(
            unreachable_state(),
            authz::project_permission_headers,
        ));

    let response = router
        .oneshot(Request::builder().uri("/plain").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(PROJECT_MANAGER_HEADER).is_none());
    assert!(response.headers().get(PROJECT_MEMBER_HEADER).is_none());
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"hello");
}

#[tokio::test]
async fn header_middleware_skips_error_responses() {
    let user = test_user(true, true);
    let router = Router::new()
        .route(
            "/projects/:project_id",
            get(|| async { StatusCode::NOT_FOUND.into_response() }),
        )
        .layer(middleware::from_fn_with_state(
            unreachable_state(),
            authz::project_permission_headers,
        ))
        .layer(middleware::map_request(move |mut req: Request| {
            let user = user.clone();
            async move {
                req.extensions_mut().insert(user);
                req
            }
        }));

    let response = router
        .oneshot(
            Request::builder()
                .uri(format!("/projects/{}", Uuid::new_v4()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(response.headers().get(PROJECT_MANAGER_HEADER).is_none());
}

#[tokio::test]
async fn project_headers_are_all_true_for_system_admins() {
    let user = test_user(true, true);
    let router = Router::new()
        .route("/projects/:project_id", get(|| async { "ok" }))
        .layer(middleware::from_fn_with_state(
            unreachable_state(),
            authz::project_permission_headers,
        ))
        .layer(middleware::map_request(move |mut req: Request| {
            let user = user.clone();
            async move {
                req.extensions_mut().insert(user);
                req
            }
        }));

    let response = router
        .oneshot(
            Request::builder()
                .uri(format!("/projects/{}", Uuid::new_v4()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[PROJECT_MANAGER_HEADER], "true");
    assert_eq!(response.headers()[PROJECT_ENGINEER_HEADER], "true");
    assert_eq!(response.headers()[PROJECT_MEMBER_HEADER], "true");
    assert!(response.headers().get(GROUP_MEMBER_HEADER).is_none());
}
