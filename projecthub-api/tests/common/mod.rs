//! Common test utilities for integration tests
//!
//! This module provides shared infrastructure for integration tests:
//! - A fresh in-memory database per test, with migrations applied
//! - The full router, driven as a `tower::Service`
//! - Registration helpers that return bearer tokens

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use projecthub_api::app::{build_router, AppState};
use projecthub_api::config::{ApiConfig, Config, DatabaseConfig, JwtConfig};
use projecthub_shared::db::migrations::run_migrations;
use projecthub_shared::db::pool::{self, create_pool};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tower::Service as _;

pub const TEST_SECRET: &str = "test-secret-key-at-least-32-bytes-long";

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: SqlitePool,
    pub app: axum::Router,
    pub config: Config,
}

/// A registered user and their token
pub struct TestUser {
    pub id: i64,
    pub token: String,
}

/// Status and decoded body of a response
///
/// Non-JSON bodies are returned as a JSON string.
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestContext {
    /// Creates a new test context with a fresh database
    pub async fn new() -> anyhow::Result<Self> {
        let config = test_config();

        let db = create_pool(pool::DatabaseConfig::in_memory()).await?;
        run_migrations(&db).await?;

        let state = AppState::new(db.clone(), config.clone());
        let app = build_router(state);

        Ok(TestContext { db, app, config })
    }

    /// Sends a request through the router
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.send(request).await
    }

    /// Sends a prebuilt request (for custom headers)
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.app.clone().call(request).await.unwrap();
        let status = response.status();

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));

        TestResponse { status, body }
    }

    pub async fn get(&self, uri: &str, token: &str) -> TestResponse {
        self.request(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> TestResponse {
        self.request(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> TestResponse {
        self.request(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> TestResponse {
        self.request(Method::DELETE, uri, Some(token), None).await
    }

    /// Registers `username` with `<username>@example.com` / `secret1`
    pub async fn register(&self, username: &str) -> TestUser {
        let response = self
            .request(
                Method::POST,
                "/api/users/register",
                None,
                Some(json!({
                    "username": username,
                    "email": format!("{}@example.com", username),
                    "password": "secret1",
                })),
            )
            .await;

        assert_eq!(
            response.status,
            StatusCode::CREATED,
            "registration failed: {}",
            response.body
        );

        TestUser {
            id: response.body["user"]["id"].as_i64().unwrap(),
            token: response.body["token"].as_str().unwrap().to_string(),
        }
    }

    /// Creates a project and returns its id
    pub async fn create_project(&self, user: &TestUser, name: &str) -> i64 {
        let response = self
            .post("/api/projects", &user.token, json!({ "name": name }))
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.body["project"]["id"].as_i64().unwrap()
    }

    /// Creates a task and returns the response body's `task`
    pub async fn create_task(&self, user: &TestUser, body: Value) -> Value {
        let response = self.post("/api/tasks", &user.token, body).await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.body["task"].clone()
    }

    /// Row count of a table
    pub async fn count(&self, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(&self.db)
            .await
            .unwrap()
    }
}

/// Configuration for tests; never reads the environment
pub fn test_config() -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
        },
        database: DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
        },
        jwt: JwtConfig {
            secret: TEST_SECRET.to_string(),
            expiration_hours: 24,
        },
    }
}
