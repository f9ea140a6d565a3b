// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent-wide shared state: coordinator endpoints, account usage, and the
//! in-flight-request de-duplication set.
//!
//! Follows the `MuxState` aggregate-lock discipline in
//! `crates/mux/src/state.rs`: one lock per aggregate (coordinators get
//! their own per-endpoint health lock, accounts and the dedup set each
//! get one lock over the whole collection since both are small and
//! mutated as a unit), never a single global lock held across I/O.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{Mutex, RwLock, Semaphore};
use tokio_util::sync::CancellationToken;

use crate::account::{record_usage, select_account, AccountUsage};
use crate::config::{AccountConfigEntry, AccountStrategy, Config, CoordinatorConfigEntry};

/// Current time as an RFC 3339 string, for wire-facing timestamps.
pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Mutable health for one coordinator endpoint, guarded by its own lock
/// so a slow poll of one coordinator never blocks reads of another's
/// health.
#[derive(Debug, Clone, Default)]
pub struct CoordinatorHealth {
    pub is_healthy: bool,
    pub last_error: Option<String>,
    pub last_check: Option<String>,
}

/// One configured coordinator the agent polls.
pub struct CoordinatorEndpoint {
    pub name: String,
    pub url: String,
    pub display_name: Option<String>,
    pub token: Option<String>,
    pub health: RwLock<CoordinatorHealth>,
}

impl CoordinatorEndpoint {
    pub fn new(entry: CoordinatorConfigEntry) -> Self {
        Self {
            name: entry.name,
            url: entry.url.trim_end_matches('/').to_owned(),
            display_name: entry.display_name,
            token: entry.token,
            health: RwLock::new(CoordinatorHealth::default()),
        }
    }

    /// Record a successful poll: marks the endpoint healthy.
    pub async fn mark_healthy(&self) {
        let mut health = self.health.write().await;
        health.is_healthy = true;
        health.last_error = None;
        health.last_check = Some(now_rfc3339());
    }

    /// Record a failed poll: marks the endpoint unhealthy with `error`.
    pub async fn mark_unhealthy(&self, error: impl Into<String>) {
        let mut health = self.health.write().await;
        health.is_healthy = false;
        health.last_error = Some(error.into());
        health.last_check = Some(now_rfc3339());
    }
}

/// Shared agent state.
pub struct AgentState {
    pub coordinators: Vec<Arc<CoordinatorEndpoint>>,
    pub accounts: RwLock<Vec<AccountUsage>>,
    pub account_strategy: AccountStrategy,
    /// `RequestID -> in flight`, guarded by one lock; the test-and-insert
    /// and the delete are each atomic, never held across the browser call.
    processing: Mutex<HashSet<String>>,
    /// Bounds the number of concurrently in-flight browser-completion
    /// tasks to `config.max_concurrent`.
    pub dispatch_slots: Semaphore,
    pub http: reqwest::Client,
    pub config: Config,
    pub shutdown: CancellationToken,
    pub started_at: Instant,
}

impl AgentState {
    pub fn new(
        config: Config,
        coordinators: Vec<CoordinatorConfigEntry>,
        accounts: Vec<AccountConfigEntry>,
        shutdown: CancellationToken,
    ) -> anyhow::Result<Self> {
        let account_strategy = config.account_strategy()?;
        let max_concurrent = config.max_concurrent.max(1);
        let http = reqwest::Client::builder()
            .timeout(config.poll_timeout())
            .build()
            .unwrap_or_default();
        Ok(Self {
            coordinators: coordinators.into_iter().map(|c| Arc::new(CoordinatorEndpoint::new(c))).collect(),
            accounts: RwLock::new(accounts.into_iter().map(|a| AccountUsage::new(a.email)).collect()),
            account_strategy,
            processing: Mutex::new(HashSet::new()),
            dispatch_slots: Semaphore::new(max_concurrent),
            http,
            config,
            shutdown,
            started_at: Instant::now(),
        })
    }

    /// Atomically test-and-insert `request_id` into the processing set.
    /// Returns `true` if this call won the race and should start the
    /// browser-completion task; `false` if another task already owns it.
    pub async fn try_start_processing(&self, request_id: &str) -> bool {
        self.processing.lock().await.insert(request_id.to_owned())
    }

    /// Release `request_id`, whether the task succeeded or failed.
    pub async fn finish_processing(&self, request_id: &str) {
        self.processing.lock().await.remove(request_id);
    }

    pub async fn processing_count(&self) -> usize {
        self.processing.lock().await.len()
    }

    pub async fn healthy_coordinator_count(&self) -> usize {
        let mut count = 0;
        for endpoint in &self.coordinators {
            if endpoint.health.read().await.is_healthy {
                count += 1;
            }
        }
        count
    }

    /// Select the next account to use per the configured strategy.
    pub async fn select_account(&self) -> String {
        let accounts = self.accounts.read().await;
        select_account(&accounts, self.account_strategy)
    }

    /// Record the outcome of using `email`.
    pub async fn record_usage(&self, email: &str, success: bool) {
        let mut accounts = self.accounts.write().await;
        record_usage(&mut accounts, email, success);
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
