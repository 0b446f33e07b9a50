//! Common test utilities for cq-service integration tests.

#![allow(dead_code)]

use cq_service::config::{CqConfig, DatabaseConfig, JwtConfig, SecurityConfig, SmtpConfig};
use cq_service::models::User;
use cq_service::services::{EncryptionService, UserService};
use cq_service::startup::Application;
use service_core::config::Config as CommonConfig;
use sqlx::PgPool;
use std::sync::Once;
use uuid::Uuid;

static INIT: Once = Once::new();

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,cq_service=debug,sqlx=warn")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Configuration for a test instance bound to a random local port. The SMTP
/// relay points at localhost so mail delivery fails fast; invitation flows
/// are best-effort and must survive that.
pub fn test_config(database_url: String) -> CqConfig {
    CqConfig {
        common: CommonConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        service_name: "cq-service-test".to_string(),
        log_level: "debug".to_string(),
        database: DatabaseConfig {
            url: database_url,
            max_connections: 2,
            min_connections: 1,
        },
        jwt: JwtConfig {
            secret: "test-secret".to_string(),
            token_lifetime_hours: 1,
        },
        smtp: SmtpConfig {
            relay: "localhost".to_string(),
            user: "test".to_string(),
            password: "test".to_string(),
            from: "CQ-Manager <noreply@example.com>".to_string(),
        },
        security: SecurityConfig {
            allowed_origins: vec!["*".to_string()],
        },
    }
}

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
    pub pool: PgPool,
}

/// Spawn a test application against `TEST_DATABASE_URL` and return an HTTP
/// handle plus a direct pool for fixtures.
pub async fn spawn_app() -> TestApp {
    spawn_app_with(|_| {}).await
}

/// Like [`spawn_app`], with the configuration adjusted before startup.
pub async fn spawn_app_with(customize: impl FnOnce(&mut CqConfig)) -> TestApp {
    init_tracing();

    let database_url = std::env::var("TEST_DATABASE_URL")
        .expect("TEST_DATABASE_URL must be set for database-backed tests");

    let mut config = test_config(database_url.clone());
    customize(&mut config);

    let app = Application::build(config)
        .await
        .expect("Failed to build application");
    let port = app.port();

    tokio::spawn(async move {
        app.run_until_stopped().await.ok();
    });

    let pool = PgPool::connect(&database_url)
        .await
        .expect("Failed to connect test pool");

    TestApp {
        address: format!("http://127.0.0.1:{port}"),
        client: reqwest::Client::new(),
        pool,
    }
}

impl TestApp {
    /// Insert a user directly, bypassing the registration route. Emails and
    /// names are randomized so parallel tests do not collide.
    pub async fn create_user(
        &self,
        password: &str,
        is_verified: bool,
        is_system_admin: bool,
    ) -> User {
        let encryption = EncryptionService;
        let hashed = encryption
            .hash_password(password)
            .expect("test password must satisfy the policy");
        let suffix = Uuid::new_v4().simple().to_string();
        UserService::new(self.pool.clone())
            .create_user(
                &format!("user-{suffix}"),
                &format!("{suffix}@example.com"),
                &hashed.hash,
                &hashed.salt,
                is_verified,
                is_system_admin,
            )
            .await
            .expect("Failed to create test user")
    }

    pub async fn login(&self, email: &str, password: &str) -> String {
        let response = self
            .client
            .post(format!("{}/users/login", self.address))
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute login request");
        assert_eq!(response.status(), 200, "login must succeed for test users");
        let body: serde_json::Value = response.json().await.expect("login body must be JSON");
        body["token"].as_str().expect("token must be set").to_string()
    }

    pub async fn get(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{path}", self.address))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn post(
        &self,
        path: &str,
        token: &str,
        body: &serde_json::Value,
    ) -> reqwest::Response {
        self.client
            .post(format!("{}{path}", self.address))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn put(
        &self,
        path: &str,
        token: &str,
        body: &serde_json::Value,
    ) -> reqwest::Response {
        self.client
            .put(format!("{}{path}", self.address))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn delete(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .delete(format!("{}{path}", self.address))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to execute request")
    }
}
