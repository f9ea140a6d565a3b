// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end smoke tests that spawn the real `arc-coordinator` and
//! `arc-agent` binaries and exercise their admin HTTP surfaces.

use std::time::Duration;

use arc_specs::{AgentProcess, CoordinatorProcess};
use axum::routing::{get, post};
use axum::{Json, Router};
use tokio::net::TcpListener;

const TIMEOUT: Duration = Duration::from_secs(10);

/// A minimal "rich" pane-multiplexer backend: no panes, always healthy.
/// Enough for the coordinator's startup probe and poll loop to succeed
/// against an empty pane set.
async fn spawn_empty_rich_backend() -> anyhow::Result<String> {
    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/panes", get(|| async { Json(Vec::<serde_json::Value>::new()) }))
        .route("/panes/{id}/text", get(|| async { Json(serde_json::json!({ "text": "" })) }))
        .route("/panes/{id}/input", post(|| async { axum::http::StatusCode::NO_CONTENT }));

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    Ok(format!("http://{addr}"))
}

#[tokio::test]
async fn coordinator_health_requires_no_auth() -> anyhow::Result<()> {
    let backend_url = spawn_empty_rich_backend().await?;
    let coordinator = CoordinatorProcess::start(&backend_url)?;
    coordinator.wait_healthy(TIMEOUT).await?;

    let resp: serde_json::Value =
        reqwest::get(format!("{}/health", coordinator.base_url())).await?.json().await?;
    assert_eq!(resp["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn coordinator_status_requires_bearer_token() -> anyhow::Result<()> {
    let backend_url = spawn_empty_rich_backend().await?;
    let coordinator = CoordinatorProcess::start(&backend_url)?;
    coordinator.wait_healthy(TIMEOUT).await?;

    let unauthenticated = reqwest::get(format!("{}/status", coordinator.base_url())).await?;
    assert_eq!(unauthenticated.status(), reqwest::StatusCode::UNAUTHORIZED);

    let client = reqwest::Client::new();
    let resp: serde_json::Value = client
        .get(format!("{}/status", coordinator.base_url()))
        .bearer_auth(coordinator.token())
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(resp["tracker_count"], 0);
    assert_eq!(resp["backend"], "rich");
    Ok(())
}

#[tokio::test]
async fn coordinator_reports_no_pending_auth_requests_with_an_empty_pane_set() -> anyhow::Result<()> {
    let backend_url = spawn_empty_rich_backend().await?;
    let coordinator = CoordinatorProcess::start(&backend_url)?;
    coordinator.wait_healthy(TIMEOUT).await?;

    let client = reqwest::Client::new();
    let resp: serde_json::Value = client
        .get(format!("{}/auth/pending", coordinator.base_url()))
        .bearer_auth(coordinator.token())
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(resp.as_array().map(Vec::len), Some(0));
    Ok(())
}

#[tokio::test]
async fn agent_health_requires_no_auth() -> anyhow::Result<()> {
    let backend_url = spawn_empty_rich_backend().await?;
    let coordinator = CoordinatorProcess::start(&backend_url)?;
    coordinator.wait_healthy(TIMEOUT).await?;

    let coordinators_json = serde_json::json!([
        { "name": "primary", "url": coordinator.base_url(), "token": coordinator.token() }
    ])
    .to_string();
    let agent = AgentProcess::start(&coordinators_json)?;
    agent.wait_healthy(TIMEOUT).await?;

    let resp: serde_json::Value = reqwest::get(format!("{}/health", agent.base_url())).await?.json().await?;
    assert_eq!(resp["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn agent_marks_a_reachable_coordinator_healthy_after_polling() -> anyhow::Result<()> {
    let backend_url = spawn_empty_rich_backend().await?;
    let coordinator = CoordinatorProcess::start(&backend_url)?;
    coordinator.wait_healthy(TIMEOUT).await?;

    let coordinators_json = serde_json::json!([
        { "name": "primary", "url": coordinator.base_url(), "token": coordinator.token() }
    ])
    .to_string();
    let agent = AgentProcess::start(&coordinators_json)?;
    agent.wait_healthy(TIMEOUT).await?;

    let client = reqwest::Client::new();
    let deadline = tokio::time::Instant::now() + TIMEOUT;
    loop {
        let resp: serde_json::Value = client
            .get(format!("{}/status", agent.base_url()))
            .bearer_auth(agent.token())
            .send()
            .await?
            .json()
            .await?;
        if resp["healthy_coordinators"] == 1 {
            assert_eq!(resp["coordinator_count"], 1);
            return Ok(());
        }
        if tokio::time::Instant::now() > deadline {
            anyhow::bail!("agent never marked the coordinator healthy: {resp}");
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

#[tokio::test]
async fn agent_status_requires_bearer_token() -> anyhow::Result<()> {
    let backend_url = spawn_empty_rich_backend().await?;
    let coordinator = CoordinatorProcess::start(&backend_url)?;
    coordinator.wait_healthy(TIMEOUT).await?;

    let coordinators_json = serde_json::json!([
        { "name": "primary", "url": coordinator.base_url(), "token": coordinator.token() }
    ])
    .to_string();
    let agent = AgentProcess::start(&coordinators_json)?;
    agent.wait_healthy(TIMEOUT).await?;

    let resp = reqwest::get(format!("{}/status", agent.base_url())).await?;
    assert_eq!(resp.status(), reqwest::StatusCode::UNAUTHORIZED);
    Ok(())
}
