//! Webhook API integration tests
//!
//! Drives the axum router end to end with a recording messenger double:
//! the webhook must ack immediately and the CC semantics must hold across
//! the HTTP boundary.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tower::ServiceExt; // for `oneshot`
use trunklink::application::ports::MessengerClient;
use trunklink::application::NotificationRouter;
use trunklink::domain::notification::RecipientDirectory;
use trunklink::domain::shared::Result;
use trunklink::interface::api::{build_router, AppState};

/// Messenger double that records every send
#[derive(Default)]
struct RecordingMessenger {
    sends: Mutex<Vec<(String, String)>>,
}

impl RecordingMessenger {
    async fn sends(&self) -> Vec<(String, String)> {
        self.sends.lock().await.clone()
    }

    /// Poll until `expected` sends were recorded or the deadline passes
    async fn wait_for_sends(&self, expected: usize) -> Vec<(String, String)> {
        for _ in 0..200 {
            let sends = self.sends().await;
            if sends.len() >= expected {
                return sends;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.sends().await
    }
}

#[async_trait]
impl MessengerClient for RecordingMessenger {
    async fn send_message(&self, recipient_id: &str, text: &str) -> Result<()> {
        self.sends
            .lock()
            .await
            .push((recipient_id.to_string(), text.to_string()));
        Ok(())
    }
}

fn test_app() -> (axum::Router, Arc<RecordingMessenger>) {
    let mut directory = RecipientDirectory::new();
    directory.insert("event_manager", "Event Manager", "1001");
    directory.insert("recepcja", "Recepcja", "1002");

    let messenger = Arc::new(RecordingMessenger::default());
    let notifications = Arc::new(NotificationRouter::new(directory, messenger.clone()));
    (build_router(AppState { notifications }), messenger)
}

fn webhook_request(payload: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/webhook")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap()
}

fn analyzed_call(receiver_type: &str) -> Value {
    json!({
        "event": "call_analyzed",
        "call": {
            "from_number": "+48123456789",
            "recording_url": "https://recordings.example.com/abc",
            "call_analysis": {
                "call_summary": "Rezerwacja na sobotę",
                "custom_analysis_data": { "receiver_type": receiver_type }
            }
        }
    })
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _) = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["data"], "OK");
}

#[tokio::test]
async fn test_webhook_acks_with_empty_response() {
    let (app, _) = test_app();

    let response = app
        .oneshot(webhook_request(&analyzed_call("recepcja")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(body.is_empty());
}

#[tokio::test]
async fn test_reception_event_is_cc_d_to_manager() {
    let (app, messenger) = test_app();

    let response = app
        .oneshot(webhook_request(&analyzed_call("recepcja")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let sends = messenger.wait_for_sends(2).await;
    assert_eq!(sends.len(), 2);
    assert_eq!(sends[0].0, "1002");
    assert_eq!(sends[1].0, "1001");
    // Same body for recipient and CC
    assert_eq!(sends[0].1, sends[1].1);
    assert!(sends[0].1.contains("+48123456789"));
    assert!(sends[0].1.contains("Rezerwacja na sobotę"));
}

#[tokio::test]
async fn test_manager_event_sends_single_message() {
    let (app, messenger) = test_app();

    app.oneshot(webhook_request(&analyzed_call("event_manager")))
        .await
        .unwrap();

    let sends = messenger.wait_for_sends(1).await;
    // Give a second send a chance to appear before asserting it did not
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(messenger.sends().await.len(), 1);
    assert_eq!(sends[0].0, "1001");
}

#[tokio::test]
async fn test_unknown_receiver_type_sends_nothing() {
    let (app, messenger) = test_app();

    let response = app
        .oneshot(webhook_request(&analyzed_call("kuchnia")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(messenger.sends().await.is_empty());
}

#[tokio::test]
async fn test_non_analyzed_event_is_ignored() {
    let (app, messenger) = test_app();

    let payload = json!({
        "event": "call_started",
        "call": { "from_number": "+48123456789" }
    });
    let response = app.oneshot(webhook_request(&payload)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(messenger.sends().await.is_empty());
}

#[tokio::test]
async fn test_event_without_from_number_is_ignored() {
    let (app, messenger) = test_app();

    let payload = json!({
        "event": "call_analyzed",
        "call": {
            "recording_url": "https://recordings.example.com/abc",
            "call_analysis": {
                "custom_analysis_data": { "receiver_type": "recepcja" }
            }
        }
    });
    let response = app.oneshot(webhook_request(&payload)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(messenger.sends().await.is_empty());
}
