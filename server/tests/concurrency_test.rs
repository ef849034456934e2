//! Concurrency tests for capacity and status transitions.
//!
//! Many clients hit the router at once. The repositories must keep the
//! confirmed count within capacity, apply each transition once, and never
//! let a registration or an edit outlive a concurrent event cancellation.
//!
//! Run with: `cargo test -p eventhub-server --test concurrency_test`

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect

mod common;

use axum::http::StatusCode;
use common::app;
use eventhub_core::Role;
use serde_json::json;
use std::sync::Arc;

const CAPACITY: usize = 5;
const CLIENTS: usize = 20;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_registrations_respect_capacity() {
    let app = Arc::new(app());
    let org = app.signup("org@example.com", Role::Organizer).await;
    let event = app
        .published_event(&org, json!({ "max_attendees": CAPACITY }))
        .await;
    let uri = format!("/api/events/{}/registrations", event["id"].as_str().unwrap());

    let mut tokens = Vec::with_capacity(CLIENTS);
    for i in 0..CLIENTS {
        tokens.push(app.signup(&format!("user{i}@example.com"), Role::Attendee).await.token);
    }

    let handles: Vec<_> = tokens
        .into_iter()
        .map(|token| {
            let app = Arc::clone(&app);
            let uri = uri.clone();
            tokio::spawn(async move { app.post(&uri, Some(&token), json!({})).await })
        })
        .collect();

    let mut created = 0;
    let mut full = 0;
    for handle in handles {
        let (status, body) = handle.await.unwrap();
        match status {
            StatusCode::CREATED => created += 1,
            StatusCode::CONFLICT => {
                assert_eq!(body["code"], "EVENT_FULL");
                full += 1;
            }
            other => panic!("unexpected status {other}: {body}"),
        }
    }
    assert_eq!(created, CAPACITY);
    assert_eq!(full, CLIENTS - CAPACITY);

    let (_, stats) = app
        .get(
            &format!("/api/events/{}/stats", event["id"].as_str().unwrap()),
            Some(&org.token),
        )
        .await;
    assert_eq!(stats["registrations"]["confirmed"], CAPACITY);
    assert_eq!(stats["spots_remaining"], 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_approvals_fill_capacity_once() {
    let app = Arc::new(app());
    let org = app.signup("org@example.com", Role::Organizer).await;
    let event = app
        .published_event(&org, json!({ "max_attendees": 1, "requires_approval": true }))
        .await;
    let event_id = event["id"].as_str().unwrap().to_string();

    let mut registration_ids = Vec::new();
    for i in 0..4 {
        let user = app.signup(&format!("user{i}@example.com"), Role::Attendee).await;
        let (status, body) = app
            .post(
                &format!("/api/events/{event_id}/registrations"),
                Some(&user.token),
                json!({}),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["status"], "pending");
        registration_ids.push(body["id"].as_str().unwrap().to_string());
    }

    let handles: Vec<_> = registration_ids
        .into_iter()
        .map(|id| {
            let app = Arc::clone(&app);
            let token = org.token.clone();
            tokio::spawn(async move {
                app.patch(
                    &format!("/api/registrations/{id}/status"),
                    Some(&token),
                    json!({ "status": "confirmed" }),
                )
                .await
            })
        })
        .collect();

    let mut confirmed = 0;
    for handle in handles {
        let (status, body) = handle.await.unwrap();
        if status == StatusCode::OK {
            confirmed += 1;
        } else {
            assert_eq!(status, StatusCode::CONFLICT, "{body}");
        }
    }
    assert_eq!(confirmed, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_registrations_racing_event_cancel_leave_nothing_active() {
    let app = Arc::new(app());
    let org = app.signup("org@example.com", Role::Organizer).await;
    let event = app.published_event(&org, json!({})).await;
    let event_uri = format!("/api/events/{}", event["id"].as_str().unwrap());

    let mut tokens = Vec::with_capacity(CLIENTS);
    for i in 0..CLIENTS {
        tokens.push(app.signup(&format!("user{i}@example.com"), Role::Attendee).await.token);
    }

    let mut handles: Vec<_> = tokens
        .into_iter()
        .map(|token| {
            let app = Arc::clone(&app);
            let uri = format!("{event_uri}/registrations");
            tokio::spawn(async move { app.post(&uri, Some(&token), json!({})).await })
        })
        .collect();
    let cancel = {
        let app = Arc::clone(&app);
        let uri = format!("{event_uri}/cancel");
        let token = org.token.clone();
        tokio::spawn(async move { app.post(&uri, Some(&token), json!({})).await })
    };
    handles.insert(CLIENTS / 2, cancel);

    let mut created: u64 = 0;
    for handle in handles {
        let (status, body) = handle.await.unwrap();
        match status {
            StatusCode::CREATED => created += 1,
            StatusCode::OK => assert_eq!(body["status"], "cancelled"),
            StatusCode::CONFLICT => assert_eq!(body["code"], "EVENT_NOT_OPEN"),
            other => panic!("unexpected status {other}: {body}"),
        }
    }

    let (_, stats) = app.get(&format!("{event_uri}/stats"), Some(&org.token)).await;
    assert_eq!(stats["registrations"]["confirmed"], 0);
    assert_eq!(stats["registrations"]["pending"], 0);
    assert_eq!(stats["registrations"]["cancelled"], created);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_lifecycle_requests_never_revive_a_cancelled_event() {
    let app = Arc::new(app());
    let org = app.signup("org@example.com", Role::Organizer).await;
    let event = app.draft_event(&org, json!({})).await;
    let event_uri = format!("/api/events/{}", event["id"].as_str().unwrap());

    let handles: Vec<_> = (0..24)
        .map(|i| {
            let app = Arc::clone(&app);
            let token = org.token.clone();
            let event_uri = event_uri.clone();
            tokio::spawn(async move {
                let response = match i % 3 {
                    0 => app.post(&format!("{event_uri}/publish"), Some(&token), json!({})).await,
                    1 => app.post(&format!("{event_uri}/cancel"), Some(&token), json!({})).await,
                    _ => {
                        app.patch(&event_uri, Some(&token), json!({ "description": format!("edit {i}") }))
                            .await
                    }
                };
                (i % 3, response)
            })
        })
        .collect();

    let mut published = 0;
    let mut cancelled = 0;
    for handle in handles {
        let (kind, (status, body)) = handle.await.unwrap();
        match (kind, status) {
            (0, StatusCode::OK) => published += 1,
            (1, StatusCode::OK) => cancelled += 1,
            (_, StatusCode::OK | StatusCode::CONFLICT) => {}
            (_, other) => panic!("unexpected status {other}: {body}"),
        }
    }
    assert!(published <= 1);
    assert_eq!(cancelled, 1);

    let (_, stored) = app.get(&event_uri, Some(&org.token)).await;
    assert_eq!(stored["status"], "cancelled");
}
