// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use axum_test::TestServer;
use clap::Parser;
use tokio_util::sync::CancellationToken;

use super::*;
use crate::config::Config;

#[test]
fn loopback_predicate_accepts_localhost_and_loop_ip_only() {
    assert!(is_loopback_origin(&HeaderValue::from_static("http://localhost:3000")));
    assert!(is_loopback_origin(&HeaderValue::from_static("http://127.0.0.1:3000")));
    assert!(!is_loopback_origin(&HeaderValue::from_static("https://evil.example")));
}

fn test_server() -> TestServer {
    let config = Config::parse_from(["arc-agent", "--coordinators-config", "/tmp/unused.json"]);
    let agent = Arc::new(AgentState::new(config, vec![], vec![], CancellationToken::new()).unwrap());
    let router = build_router(agent, "test-token".to_owned());
    TestServer::new(router).unwrap()
}

#[tokio::test]
async fn health_requires_no_auth() {
    let server = test_server();
    let response = server.get("/health").await;
    response.assert_status_ok();
}

#[tokio::test]
async fn status_without_bearer_token_is_unauthorized() {
    let server = test_server();
    let response = server.get("/status").await;
    response.assert_status(axum::http::StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn status_with_bearer_token_succeeds() {
    let server = test_server();
    let response =
        server.get("/status").add_header(axum::http::header::AUTHORIZATION, "Bearer test-token").await;
    response.assert_status_ok();
}

#[tokio::test]
async fn coordinators_and_accounts_require_auth() {
    let server = test_server();
    server.get("/coordinators").await.assert_status(axum::http::StatusCode::UNAUTHORIZED);
    server.get("/accounts").await.assert_status(axum::http::StatusCode::UNAUTHORIZED);
}
