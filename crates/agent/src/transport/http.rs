// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Admin HTTP handlers for the agent's own status surface.

use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

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
    pub coordinator_count: usize,
    pub healthy_coordinators: usize,
    pub account_count: usize,
    pub processing_count: usize,
    pub uptime_s: u64,
}

/// `GET /status`
pub async fn status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        coordinator_count: state.agent.coordinators.len(),
        healthy_coordinators: state.agent.healthy_coordinator_count().await,
        account_count: state.agent.accounts.read().await.len(),
        processing_count: state.agent.processing_count().await,
        uptime_s: state.agent.started_at.elapsed().as_secs(),
    })
}

#[derive(Debug, Serialize)]
pub struct CoordinatorSnapshot {
    pub name: String,
    pub url: String,
    pub display_name: Option<String>,
    pub is_healthy: bool,
    pub last_error: Option<String>,
    pub last_check: Option<String>,
}

/// `GET /coordinators` — per-endpoint health snapshot, for operator tooling.
pub async fn coordinators(State(state): State<Arc<AppState>>) -> Json<Vec<CoordinatorSnapshot>> {
    let mut snapshots = Vec::with_capacity(state.agent.coordinators.len());
    for endpoint in &state.agent.coordinators {
        let health = endpoint.health.read().await;
        snapshots.push(CoordinatorSnapshot {
            name: endpoint.name.clone(),
            url: endpoint.url.clone(),
            display_name: endpoint.display_name.clone(),
            is_healthy: health.is_healthy,
            last_error: health.last_error.clone(),
            last_check: health.last_check,
        });
    }
    Json(snapshots)
}

#[derive(Debug, Serialize)]
pub struct AccountSnapshot {
    pub email: String,
    pub last_used: Option<String>,
    pub use_count: u32,
    pub last_result: Option<crate::account::LastResult>,
}

/// `GET /accounts` — account rotation state, for operator tooling.
pub async fn accounts(State(state): State<Arc<AppState>>) -> Json<Vec<AccountSnapshot>> {
    let accounts = state.agent.accounts.read().await;
    Json(
        accounts
            .iter()
            .map(|a| AccountSnapshot {
                email: a.email.clone(),
                last_used: a.last_used,
                use_count: a.use_count,
                last_result: a.last_result,
            })
            .collect(),
    )
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
