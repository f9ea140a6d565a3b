// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn publish_without_subscribers_does_not_panic() {
    let bus = EventBus::new();
    bus.transition("fallback:1", "idle", "rate_limited");
}

#[test]
fn subscriber_receives_published_events() {
    let bus = EventBus::new();
    let mut rx = bus.subscribe();
    bus.injection("fallback:1", "/login\n");
    let event = rx.try_recv().expect("event should be immediately available");
    match event {
        CoordinatorEvent::Injection { pane, text, .. } => {
            assert_eq!(pane, "fallback:1");
            assert_eq!(text, "/login\n");
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[test]
fn lagging_subscriber_drops_instead_of_blocking_publisher() {
    let bus = EventBus::new();
    let mut rx = bus.subscribe();
    for i in 0..300 {
        bus.failure("fallback:1", &format!("err-{i}"));
    }
    // The publisher never blocked; the slow subscriber just lost entries.
    assert!(matches!(rx.try_recv(), Err(tokio::sync::broadcast::error::TryRecvError::Lagged(_))));
}
