// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use clap::Parser;
use tokio_util::sync::CancellationToken;

use super::*;
use crate::config::Config;
use crate::pane::PaneId;
use crate::state::{AuthRequest, AuthRequestStatus, PaneKey};

fn app_state() -> Arc<AppState> {
    let config = Config::parse_from(["arc-coordinator"]);
    Arc::new(AppState {
        coordinator: Arc::new(CoordinatorState::new(config, CancellationToken::new())),
        token: "test-token".to_owned(),
    })
}

#[tokio::test]
async fn auth_response_for_unknown_request_id_is_not_found() {
    let state = app_state();
    let response = auth_response(
        State(state),
        Json(AuthResponseRequest {
            request_id: "missing".to_owned(),
            code: "123456".to_owned(),
            account: "user@x".to_owned(),
        }),
    )
    .await
    .into_response();
    assert_eq!(response.status(), axum::http::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn auth_response_delivers_code_to_the_owning_tracker() {
    let state = app_state();
    let key = PaneKey { backend: "fallback".to_owned(), pane_id: PaneId(1) };
    let tracker = state.coordinator.tracker_for(&key, Instant::now()).await;
    tracker.lock().await.request_id = Some("req-1".to_owned());
    state
        .coordinator
        .insert_request(AuthRequest {
            id: "req-1".to_owned(),
            pane_id: key.to_string(),
            url: "https://example.com/oauth/authorize".to_owned(),
            created_at: "2026-01-01T00:00:00Z".to_owned(),
            status: AuthRequestStatus::Pending,
            preferred_account: None,
        })
        .await;

    let response = auth_response(
        State(state.clone()),
        Json(AuthResponseRequest {
            request_id: "req-1".to_owned(),
            code: "123456".to_owned(),
            account: "user@x".to_owned(),
        }),
    )
    .await
    .into_response();

    assert_eq!(response.status(), axum::http::StatusCode::NO_CONTENT);
    assert_eq!(tracker.lock().await.received_code.as_deref(), Some("123456"));
    assert_eq!(
        state.coordinator.requests.read().await.get("req-1").unwrap().status,
        AuthRequestStatus::InProgress
    );
}

#[tokio::test]
async fn auth_response_is_idempotent_once_completed() {
    let state = app_state();
    state
        .coordinator
        .insert_request(AuthRequest {
            id: "req-done".to_owned(),
            pane_id: "fallback:2".to_owned(),
            url: "https://example.com/oauth/authorize".to_owned(),
            created_at: "2026-01-01T00:00:00Z".to_owned(),
            status: AuthRequestStatus::Completed,
            preferred_account: None,
        })
        .await;

    let response = auth_response(
        State(state),
        Json(AuthResponseRequest {
            request_id: "req-done".to_owned(),
            code: "000000".to_owned(),
            account: "user@x".to_owned(),
        }),
    )
    .await
    .into_response();

    assert_eq!(response.status(), axum::http::StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn trackers_snapshot_reports_state_and_request_id() {
    let state = app_state();
    let key = PaneKey { backend: "fallback".to_owned(), pane_id: PaneId(9) };
    let tracker = state.coordinator.tracker_for(&key, Instant::now()).await;
    tracker.lock().await.request_id = Some("req-9".to_owned());

    let Json(snapshots) = trackers(State(state)).await;
    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshots[0].request_id.as_deref(), Some("req-9"));
}
