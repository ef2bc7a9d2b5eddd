//! Call-analysis webhook and health handlers

use super::dto::{ApiResponse, CallEventPayload};
use crate::application::NotificationRouter;
use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;
use tracing::debug;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub notifications: Arc<NotificationRouter>,
}

/// Accept a call-analysis event.
///
/// The event source is acknowledged immediately; routing runs detached so
/// delivery failures stay invisible to the caller.
pub async fn receive_call_event(
    State(state): State<AppState>,
    Json(payload): Json<CallEventPayload>,
) -> StatusCode {
    if let Some(event) = payload.into_analysis_event() {
        let notifications = state.notifications.clone();
        tokio::spawn(async move {
            notifications.route(event).await;
        });
    } else {
        debug!("ignoring non-routable call event");
    }
    StatusCode::NO_CONTENT
}

/// Health check endpoint
pub async fn health_check() -> Json<ApiResponse<&'static str>> {
    Json(ApiResponse::success("OK"))
}
