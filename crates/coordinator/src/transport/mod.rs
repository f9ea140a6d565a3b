// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Admin HTTP surface the agent and operator tooling talk to.

pub mod auth;
pub mod http;

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::state::CoordinatorState;

/// Shared handler state: the coordinator plus the admin-API token.
pub struct AppState {
    pub coordinator: Arc<CoordinatorState>,
    pub token: String,
}

/// Build the axum `Router` serving the admin surface.
pub fn build_router(coordinator: Arc<CoordinatorState>, token: String) -> Router {
    let state = Arc::new(AppState { coordinator, token });

    Router::new()
        .route("/health", get(http::health))
        .route("/status", get(http::status))
        .route("/auth/pending", get(http::auth_pending))
        .route("/auth/response", post(http::auth_response))
        .route("/trackers", get(http::trackers))
        .layer(middleware::from_fn_with_state(state.clone(), auth::auth_layer))
        .layer(loopback_cors())
        .with_state(state)
}

/// CORS permitted only for localhost and loopback-IP origins, a
/// deliberate departure from a permissive `CorsLayer::permissive()`
/// default since this admin surface carries a bearer token worth
/// protecting from arbitrary browser origins.
fn loopback_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_headers([axum::http::header::AUTHORIZATION, axum::http::header::CONTENT_TYPE])
        .allow_origin(AllowOrigin::predicate(|origin: &HeaderValue, _| is_loopback_origin(origin)))
}

fn is_loopback_origin(origin: &HeaderValue) -> bool {
    let Ok(origin) = origin.to_str() else { return false };
    let Some(host_port) = origin.split("://").nth(1) else { return false };
    let host = host_port.split(':').next().unwrap_or(host_port);
    host == "localhost" || host == "127.0.0.1" || host == "::1"
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
