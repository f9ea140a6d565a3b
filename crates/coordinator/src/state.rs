// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Coordinator-wide shared state: the tracker and auth-request maps, plus
//! the event bus both are mutated through.
//!
//! Follows the `MuxState`/`SessionEntry` split in `crates/mux/src/state.rs`:
//! a per-aggregate lock on the outer map, a per-entry lock on mutable
//! fields.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::events::EventBus;
use crate::pane::PaneId;
use crate::tracker::{PaneTracker, TrackerTiming};

/// Identity of a monitored pane: the pair (backend name, PaneID), per
/// the data model's note that PaneID alone is only unique within its
/// backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PaneKey {
    pub backend: String,
    pub pane_id: PaneId,
}

impl std::fmt::Display for PaneKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.backend, self.pane_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthRequestStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

/// Coordinator-side record of an in-flight re-login.
///
/// Owned exclusively by [`CoordinatorState::requests`]; a tracker holds
/// only the `id` as a lookup key, never a shared reference, so there is
/// no ownership cycle between tracker and request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthRequest {
    pub id: String,
    pub pane_id: String,
    pub url: String,
    pub created_at: String,
    pub status: AuthRequestStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_account: Option<String>,
}

/// Current time as an RFC 3339 string, for wire-facing timestamps.
pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Shared coordinator state.
pub struct CoordinatorState {
    pub trackers: RwLock<IndexMap<PaneKey, Arc<Mutex<PaneTracker>>>>,
    pub requests: RwLock<HashMap<String, AuthRequest>>,
    pub config: Config,
    pub timing: TrackerTiming,
    pub events: EventBus,
    pub shutdown: CancellationToken,
    pub started_at: Instant,
}

impl CoordinatorState {
    pub fn new(config: Config, shutdown: CancellationToken) -> Self {
        let timing = TrackerTiming::from(&config);
        Self {
            trackers: RwLock::new(IndexMap::new()),
            requests: RwLock::new(HashMap::new()),
            config,
            timing,
            events: EventBus::new(),
            shutdown,
            started_at: Instant::now(),
        }
    }

    /// Register (or return the existing) tracker for `key`, starting new
    /// trackers in IDLE.
    pub async fn tracker_for(&self, key: &PaneKey, now: Instant) -> Arc<Mutex<PaneTracker>> {
        if let Some(existing) = self.trackers.read().await.get(key) {
            return existing.clone();
        }
        let mut trackers = self.trackers.write().await;
        trackers
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(PaneTracker::new(now))))
            .clone()
    }

    /// Drop trackers for panes no longer reported by `ListPanes`, releasing
    /// any AuthRequest each held.
    pub async fn retire_missing(&self, seen: &std::collections::HashSet<PaneKey>) {
        let removed: Vec<(PaneKey, Arc<Mutex<PaneTracker>>)> = {
            let mut trackers = self.trackers.write().await;
            let gone: Vec<PaneKey> =
                trackers.keys().filter(|k| !seen.contains(*k)).cloned().collect();
            gone.into_iter().filter_map(|k| trackers.shift_remove(&k).map(|t| (k, t))).collect()
        };
        for (key, tracker) in removed {
            let request_id = tracker.lock().await.request_id.clone();
            if let Some(request_id) = request_id {
                self.requests.write().await.remove(&request_id);
            }
            tracing::info!(pane = %key, "retired tracker for pane no longer listed");
        }
    }

    pub async fn insert_request(&self, request: AuthRequest) {
        self.requests.write().await.insert(request.id.clone(), request);
    }

    pub async fn remove_request(&self, request_id: &str) {
        self.requests.write().await.remove(request_id);
    }

    pub async fn pending_requests(&self) -> Vec<AuthRequest> {
        self.requests
            .read()
            .await
            .values()
            .filter(|r| r.status == AuthRequestStatus::Pending)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
