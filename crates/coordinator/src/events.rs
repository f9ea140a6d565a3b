// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Non-blocking structured-event emission.
//!
//! Follows the `Aggregator` in `crates/mux/src/state.rs`: a `broadcast`
//! channel with drop-on-lag semantics so a slow or absent subscriber
//! never stalls the poll loop.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::state::now_rfc3339;

/// Structured events emitted for state transitions, injections, and
/// failures. Emission must never block the poll loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CoordinatorEvent {
    Transition { pane: String, from: String, to: String, at: String },
    Injection { pane: String, text: String, at: String },
    Failure { pane: String, error: String, at: String },
}

/// Broadcast hub for [`CoordinatorEvent`]s. Out of scope beyond this
/// emission point (no SSE/UI fan-out is implemented here).
pub struct EventBus {
    tx: broadcast::Sender<CoordinatorEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(256);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CoordinatorEvent> {
        self.tx.subscribe()
    }

    /// Publish an event. A full channel (no subscribers keeping up) drops
    /// the oldest entries rather than blocking the caller; an absent
    /// subscriber is simply a no-op send error, ignored here.
    pub fn publish(&self, event: CoordinatorEvent) {
        let _ = self.tx.send(event);
    }

    pub fn transition(&self, pane: &str, from: &str, to: &str) {
        self.publish(CoordinatorEvent::Transition {
            pane: pane.to_owned(),
            from: from.to_owned(),
            to: to.to_owned(),
            at: now_rfc3339(),
        });
    }

    pub fn injection(&self, pane: &str, text: &str) {
        self.publish(CoordinatorEvent::Injection {
            pane: pane.to_owned(),
            text: text.to_owned(),
            at: now_rfc3339(),
        });
    }

    pub fn failure(&self, pane: &str, error: &str) {
        self.publish(CoordinatorEvent::Failure {
            pane: pane.to_owned(),
            error: error.to_owned(),
            at: now_rfc3339(),
        });
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;
