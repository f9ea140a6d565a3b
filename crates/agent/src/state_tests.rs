// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::Parser;

use super::*;
use crate::config::{AccountConfigEntry, Config};

fn config() -> Config {
    Config::parse_from(["arc-agent", "--coordinators-config", "/tmp/unused.json"])
}

fn coordinators() -> Vec<CoordinatorConfigEntry> {
    vec![
        CoordinatorConfigEntry { name: "host-a".to_owned(), url: "http://127.0.0.1:8900/".to_owned(), display_name: None, token: None },
        CoordinatorConfigEntry { name: "host-b".to_owned(), url: "http://127.0.0.1:8910".to_owned(), display_name: Some("Host B".to_owned()), token: Some("secret".to_owned()) },
    ]
}

#[test]
fn trailing_slash_is_trimmed_from_endpoint_url() {
    let endpoint = CoordinatorEndpoint::new(coordinators().remove(0));
    assert_eq!(endpoint.url, "http://127.0.0.1:8900");
}

#[tokio::test]
async fn new_endpoints_start_unhealthy_with_no_check() {
    let endpoint = CoordinatorEndpoint::new(coordinators().remove(0));
    let health = endpoint.health.read().await;
    assert!(!health.is_healthy);
    assert!(health.last_check.is_none());
}

#[tokio::test]
async fn mark_healthy_then_unhealthy_round_trips() {
    let endpoint = CoordinatorEndpoint::new(coordinators().remove(0));
    endpoint.mark_healthy().await;
    assert!(endpoint.health.read().await.is_healthy);

    endpoint.mark_unhealthy("connection refused").await;
    let health = endpoint.health.read().await;
    assert!(!health.is_healthy);
    assert_eq!(health.last_error.as_deref(), Some("connection refused"));
}

#[tokio::test]
async fn try_start_processing_is_exclusive() {
    let state = AgentState::new(
        config(),
        coordinators(),
        vec![],
        CancellationToken::new(),
    )
    .unwrap();

    assert!(state.try_start_processing("req-1").await);
    assert!(!state.try_start_processing("req-1").await, "second caller must not also win");
    assert_eq!(state.processing_count().await, 1);

    state.finish_processing("req-1").await;
    assert_eq!(state.processing_count().await, 0);
    assert!(state.try_start_processing("req-1").await, "freed id can be claimed again");
}

#[tokio::test]
async fn healthy_coordinator_count_reflects_health() {
    let state = AgentState::new(config(), coordinators(), vec![], CancellationToken::new()).unwrap();
    assert_eq!(state.healthy_coordinator_count().await, 0);

    state.coordinators[0].mark_healthy().await;
    assert_eq!(state.healthy_coordinator_count().await, 1);

    state.coordinators[1].mark_healthy().await;
    assert_eq!(state.healthy_coordinator_count().await, 2);
}

#[tokio::test]
async fn select_and_record_usage_round_trip_through_state() {
    let accounts = vec![AccountConfigEntry { email: "a@x".to_owned() }, AccountConfigEntry { email: "b@x".to_owned() }];
    let state = AgentState::new(config(), coordinators(), accounts, CancellationToken::new()).unwrap();

    assert_eq!(state.select_account().await, "a@x");
    state.record_usage("a@x", true).await;
    assert_eq!(state.select_account().await, "b@x");
}
