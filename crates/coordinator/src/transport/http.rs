// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Admin HTTP handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::ErrorCode;
use crate::state::{AuthRequest, AuthRequestStatus};
use crate::transport::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// `GET /health` — no auth.
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub tracker_count: usize,
    pub backend: String,
    pub uptime_s: u64,
}

/// `GET /status`
pub async fn status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let tracker_count = state.coordinator.trackers.read().await.len();
    Json(StatusResponse {
        tracker_count,
        backend: state.coordinator.config.backend.clone(),
        uptime_s: state.coordinator.started_at.elapsed().as_secs(),
    })
}

/// `GET /auth/pending` — agents poll this for outstanding requests.
pub async fn auth_pending(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.coordinator.pending_requests().await)
}

#[derive(Debug, Deserialize)]
pub struct AuthResponseRequest {
    pub request_id: String,
    pub code: String,
    pub account: String,
}

/// `POST /auth/response` — agent delivers a verification code.
///
/// Idempotent per `request_id`: a request already marked `in_progress` or
/// `completed` is accepted again without re-arming the pane injection.
pub async fn auth_response(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AuthResponseRequest>,
) -> impl IntoResponse {
    let Some(request) = state.coordinator.requests.read().await.get(&body.request_id).cloned() else {
        return ErrorCode::NotFound.to_http_response("unknown request_id");
    };
    if request.status == AuthRequestStatus::Completed {
        return axum::http::StatusCode::NO_CONTENT.into_response();
    }

    let key_str = request.pane_id.clone();
    let delivered = deliver_code_to_tracker(&state, &key_str, &body.code, &body.account).await;
    if !delivered {
        return ErrorCode::NotFound.to_http_response("pane tracker no longer exists");
    }

    state
        .coordinator
        .insert_request(AuthRequest {
            status: AuthRequestStatus::InProgress,
            ..request
        })
        .await;

    axum::http::StatusCode::NO_CONTENT.into_response()
}

async fn deliver_code_to_tracker(
    state: &AppState,
    pane_key: &str,
    code: &str,
    account: &str,
) -> bool {
    let trackers = state.coordinator.trackers.read().await;
    let Some(tracker) = trackers.iter().find(|(k, _)| k.to_string() == pane_key).map(|(_, v)| v.clone())
    else {
        return false;
    };
    drop(trackers);
    let mut guard = tracker.lock().await;
    guard.received_code = Some(code.to_owned());
    guard.used_account = Some(account.to_owned());
    true
}

#[derive(Debug, Serialize)]
pub struct TrackerSnapshot {
    pub pane: String,
    pub state: String,
    pub request_id: Option<String>,
    pub error_message: Option<String>,
    pub retry_count: u32,
}

/// `GET /trackers` — per-pane state snapshot, for UIs.
pub async fn trackers(State(state): State<Arc<AppState>>) -> Json<Vec<TrackerSnapshot>> {
    let trackers = state.coordinator.trackers.read().await;
    let mut snapshots = Vec::with_capacity(trackers.len());
    for (key, tracker) in trackers.iter() {
        let guard = tracker.lock().await;
        snapshots.push(TrackerSnapshot {
            pane: key.to_string(),
            state: guard.state.to_string(),
            request_id: guard.request_id.clone(),
            error_message: guard.error_message.clone(),
            retry_count: guard.retry_count,
        });
    }
    Json(snapshots)
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
