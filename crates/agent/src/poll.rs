// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The agent's multi-coordinator polling, de-duplication, and OAuth
//! dispatch loop.
//!
//! Follows the `upstream::poller::spawn_screen_poller` pattern: one
//! ticker task per remote endpoint, each with its own `reqwest::Client`.
//! The dispatch side (de-duplicate, call the browser, report back) is
//! new logic shaped by the browser-driver/PaneClient capability-trait
//! symmetry.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::browser::BrowserDriver;
use crate::state::{AgentState, CoordinatorEndpoint};

/// Wire shape of one entry from a coordinator's `GET /auth/pending`.
#[derive(Debug, Clone, Deserialize)]
pub struct PendingAuthRequest {
    pub id: String,
    pub pane_id: String,
    pub url: String,
    pub created_at: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize)]
struct AuthResponseBody<'a> {
    request_id: &'a str,
    code: &'a str,
    account: &'a str,
}

/// Spawn one ticker-driven poll task per configured coordinator. Each
/// returns immediately; the tasks run until `state.shutdown` is
/// cancelled.
pub fn spawn_poll_loop(state: Arc<AgentState>, browser: Arc<dyn BrowserDriver>) {
    for endpoint in state.coordinators.clone() {
        let state = Arc::clone(&state);
        let browser = Arc::clone(&browser);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(state.config.poll_interval());
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = state.shutdown.cancelled() => break,
                    _ = interval.tick() => {}
                }

                if let Err(error) = poll_coordinator_once(&state, &endpoint, &browser).await {
                    tracing::debug!(coordinator = %endpoint.name, %error, "poll tick failed");
                }
            }
        });
    }
}

fn apply_auth(req: reqwest::RequestBuilder, endpoint: &CoordinatorEndpoint) -> reqwest::RequestBuilder {
    match &endpoint.token {
        Some(token) => req.bearer_auth(token),
        None => req,
    }
}

/// Poll one coordinator's `/auth/pending`, updating its health, and spawn
/// a dispatch task for every request this agent is not already
/// processing.
pub async fn poll_coordinator_once(
    state: &Arc<AgentState>,
    endpoint: &Arc<CoordinatorEndpoint>,
    browser: &Arc<dyn BrowserDriver>,
) -> anyhow::Result<()> {
    let url = format!("{}/auth/pending", endpoint.url);
    let req = apply_auth(state.http.get(&url), endpoint);

    let result = req.send().await;
    let response = match result {
        Ok(resp) => resp,
        Err(error) => {
            endpoint.mark_unhealthy(error.to_string()).await;
            anyhow::bail!(error);
        }
    };

    if !response.status().is_success() {
        let status = response.status();
        endpoint.mark_unhealthy(format!("status {status}")).await;
        anyhow::bail!("unexpected status {status} from {url}");
    }

    let pending: Vec<PendingAuthRequest> = match response.json().await {
        Ok(body) => body,
        Err(error) => {
            endpoint.mark_unhealthy(error.to_string()).await;
            anyhow::bail!(error);
        }
    };
    endpoint.mark_healthy().await;

    for request in pending {
        if request.status != "pending" {
            continue;
        }
        // Atomic test-and-insert: only the caller that wins spawns a
        // dispatch task, so two polls observing the same request_id
        // never race.
        if !state.try_start_processing(&request.id).await {
            continue;
        }

        let state = Arc::clone(state);
        let endpoint = Arc::clone(endpoint);
        let browser = Arc::clone(browser);
        tokio::spawn(async move {
            dispatch(&state, &endpoint, browser.as_ref(), request).await;
        });
    }

    Ok(())
}

/// Drive one request's browser completion end-to-end and report the
/// result back to the owning coordinator.
async fn dispatch(
    state: &Arc<AgentState>,
    endpoint: &Arc<CoordinatorEndpoint>,
    browser: &dyn BrowserDriver,
    request: PendingAuthRequest,
) {
    let _permit = state.dispatch_slots.acquire().await;
    let account = state.select_account().await;

    let outcome = tokio::time::timeout(state.config.browser_timeout(), browser.complete(&request.url)).await;
    let code = match outcome {
        Ok(Ok(code)) => Some(code),
        Ok(Err(error)) => {
            tracing::warn!(request_id = %request.id, %error, "browser completion failed");
            None
        }
        Err(_) => {
            tracing::warn!(request_id = %request.id, "browser completion timed out");
            None
        }
    };

    let success = code.is_some();
    let body =
        AuthResponseBody { request_id: &request.id, code: code.as_deref().unwrap_or(""), account: &account };

    if let Err(error) = post_response(state, endpoint, &body).await {
        tracing::warn!(request_id = %request.id, %error, "failed to report auth response to coordinator");
        endpoint.mark_unhealthy(error.to_string()).await;
    } else {
        endpoint.mark_healthy().await;
    }

    if !account.is_empty() {
        state.record_usage(&account, success).await;
    }

    state.finish_processing(&request.id).await;
}

async fn post_response(
    state: &AgentState,
    endpoint: &CoordinatorEndpoint,
    body: &AuthResponseBody<'_>,
) -> anyhow::Result<()> {
    let url = format!("{}/auth/response", endpoint.url);
    let req = apply_auth(state.http.post(&url), endpoint).json(body).timeout(Duration::from_secs(30));
    let resp = req.send().await?;
    if !resp.status().is_success() {
        anyhow::bail!("unexpected status {} from {url}", resp.status());
    }
    Ok(())
}

#[cfg(test)]
#[path = "poll_tests.rs"]
mod tests;
