//! Common test utilities for API integration tests
//!
//! The router runs over the in-memory store, a recording notifier and a
//! manual clock, so no external services are needed.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use todolist_api::app::{build_router, AppState};
use todolist_api::config::Config;
use todolist_shared::auth::password::Argon2Hasher;
use todolist_shared::clock::ManualClock;
use todolist_shared::notify::recording::RecordingNotifier;
use todolist_shared::store::{memory::MemoryStore, Store};
use tower::Service as _;

pub const PASSWORD: &str = "password123";

/// Test context containing all necessary resources
pub struct TestContext {
    pub app: axum::Router,
    pub store: Arc<MemoryStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub clock: Arc<ManualClock>,
    pub config: Config,
}

impl TestContext {
    pub fn new() -> anyhow::Result<Self> {
        let config = Config::from_lookup(|key| match key {
            "JWT_SECRET" => Some("test-secret-key-at-least-32-bytes-long".to_string()),
            _ => None,
        })?;

        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let clock = Arc::new(ManualClock::new(Utc::now()));
        // Cheap parameters keep signup fast in tests
        let hasher = Arc::new(Argon2Hasher::new(1024, 1, 1)?);

        let state = AppState::new(
            config.clone(),
            store.clone(),
            notifier.clone(),
            hasher,
            clock.clone(),
        );

        Ok(TestContext {
            app: build_router(state),
            store,
            notifier,
            clock,
            config,
        })
    }

    /// Sends a request and returns the status with the JSON body (`Null` when empty)
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
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

        let response = self.app.clone().call(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                panic!("non-JSON body: {}", String::from_utf8_lossy(&bytes))
            })
        };
        (status, value)
    }

    /// Signs up `{username}@example.com`
    pub async fn signup(&self, username: &str) -> (StatusCode, Value) {
        self.send(
            Method::POST,
            "/v1/auth/signup",
            None,
            Some(json!({
                "username": username,
                "email": email(username),
                "password": PASSWORD,
            })),
        )
        .await
    }

    /// The pending verification code stored for `email`
    pub async fn code_for(&self, email: &str) -> String {
        let mut tx = self.store.begin().await.unwrap();
        tx.find_user_by_email(email)
            .await
            .unwrap()
            .and_then(|u| u.verification_code)
            .expect("user has no pending code")
    }

    pub async fn verify(&self, code: &str) -> (StatusCode, Value) {
        self.send(
            Method::POST,
            "/v1/auth/verify",
            None,
            Some(json!({ "verification_code": code })),
        )
        .await
    }

    pub async fn login(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.send(
            Method::POST,
            "/v1/auth/login",
            None,
            Some(json!({ "email": email, "password": password })),
        )
        .await
    }

    /// Signs up, verifies and logs in; returns the bearer token
    pub async fn register(&self, username: &str) -> String {
        let (status, _) = self.signup(username).await;
        assert_eq!(status, StatusCode::CREATED);

        let code = self.code_for(&email(username)).await;
        let (status, _) = self.verify(&code).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = self.login(&email(username), PASSWORD).await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().unwrap().to_string()
    }

    /// Creates a list and returns its id
    pub async fn create_list(&self, token: &str, title: &str) -> i64 {
        let (status, body) = self
            .send(
                Method::POST,
                "/v1/todolists",
                Some(token),
                Some(json!({ "title": title })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_i64().unwrap()
    }
}

pub fn email(username: &str) -> String {
    format!("{}@example.com", username)
}
