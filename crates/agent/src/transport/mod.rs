// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The agent's own admin HTTP surface: reuses the coordinator's axum +
//! bearer-auth + loopback-CORS layering, duplicated per binary since the
//! two daemons do not share a crate.

pub mod auth;
pub mod http;

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::middleware;
use axum::routing::get;
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::state::AgentState;

/// Shared handler state: the agent plus the admin-API token.
pub struct AppState {
    pub agent: Arc<AgentState>,
    pub token: String,
}

/// Build the axum `Router` serving the agent's admin surface.
pub fn build_router(agent: Arc<AgentState>, token: String) -> Router {
    let state = Arc::new(AppState { agent, token });

    Router::new()
        .route("/health", get(http::health))
        .route("/status", get(http::status))
        .route("/coordinators", get(http::coordinators))
        .route("/accounts", get(http::accounts))
        .layer(middleware::from_fn_with_state(state.clone(), auth::auth_layer))
        .layer(loopback_cors())
        .with_state(state)
}

fn loopback_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_methods([axum::http::Method::GET])
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
