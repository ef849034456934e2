//! Shared harness for router tests: the full HTTP stack over in-memory storage.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use eventhub_auth::config::{PasswordConfig, TokenConfig};
use eventhub_auth::{PasswordHasher, TokenCodec};
use eventhub_core::providers::UserRepository;
use eventhub_core::{Role, UserId};
use eventhub_server::{AppState, Repositories, Services, build_router, server::routes::cors_layer};
use eventhub_testing::memory::{
    InMemoryEventRepository, InMemoryRegistrationRepository, InMemoryUserRepository,
};
use eventhub_testing::{RecordingMailer, test_clock};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

pub const PASSWORD: &str = "correct horse battery";

pub struct TestApp {
    pub router: Router,
    pub repos: Repositories,
    pub mailer: RecordingMailer,
}

/// A signed-up user.
pub struct Account {
    pub id: String,
    pub token: String,
}

pub fn app() -> TestApp {
    eventhub_testing::init_test_tracing();
    let events = InMemoryEventRepository::new();
    let registrations = InMemoryRegistrationRepository::new(&events);
    let repos = Repositories {
        users: Arc::new(InMemoryUserRepository::new()),
        events: Arc::new(events),
        registrations: Arc::new(registrations),
    };
    let mailer = RecordingMailer::new();
    let services = Services::new(
        repos.clone(),
        Arc::new(mailer.clone()),
        Arc::new(test_clock()),
        TokenCodec::new(TokenConfig::new("router-test-secret-router-test-secret")),
        PasswordHasher::new(PasswordConfig::insecure_fast()),
    );
    let router = build_router(AppState::new(services), cors_layer(None).unwrap());
    TestApp {
        router,
        repos,
        mailer,
    }
}

impl TestApp {
    /// Send a request and decode the JSON response (`Null` for empty or non-JSON bodies).
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::PATCH, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, token, None).await
    }

    /// Register through the API, then set the role directly in storage.
    pub async fn signup(&self, email: &str, role: Role) -> Account {
        let (status, body) = self
            .post(
                "/api/auth/register",
                None,
                json!({ "email": email, "name": "Test User", "password": PASSWORD }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "signup failed: {body}");

        let id = body["user"]["id"].as_str().unwrap().to_string();
        if role != Role::Attendee {
            let user_id = UserId::from_uuid(Uuid::parse_str(&id).unwrap());
            let mut user = self.repos.users.get(user_id).await.unwrap();
            user.role = role;
            self.repos.users.update(&user).await.unwrap();
        }
        Account {
            id,
            token: body["token"].as_str().unwrap().to_string(),
        }
    }

    /// Create and publish an event; returns its JSON.
    pub async fn published_event(&self, organizer: &Account, extra: Value) -> Value {
        let event = self.draft_event(organizer, extra).await;
        let id = event["id"].as_str().unwrap();
        let (status, body) = self
            .post(&format!("/api/events/{id}/publish"), Some(&organizer.token), json!({}))
            .await;
        assert_eq!(status, StatusCode::OK, "publish failed: {body}");
        body
    }

    /// Create a draft event; `extra` fields override the defaults.
    pub async fn draft_event(&self, organizer: &Account, extra: Value) -> Value {
        let mut payload = json!({
            "title": "Rust Meetup",
            "description": "Talks and pizza",
            "location": "Lisbon",
            "starts_at": "2025-03-01T18:00:00Z",
            "ends_at": "2025-03-01T21:00:00Z",
        });
        if let (Some(base), Some(extra)) = (payload.as_object_mut(), extra.as_object()) {
            for (key, value) in extra {
                base.insert(key.clone(), value.clone());
            }
        }
        let (status, body) = self
            .post("/api/events", Some(&organizer.token), payload)
            .await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {body}");
        body
    }
}
