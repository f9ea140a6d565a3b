// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Account-usage bookkeeping and the LRU / RoundRobin selection policies.
//!
//! `CredentialBroker` (`crates/mux/src/credential/broker.rs`) tracks
//! per-account token freshness rather than selection-by-recency, but its
//! `AccountState` shape grounds the field layout here, and its
//! `session_counts: RwLock<HashMap<String, AtomicU32>>` grounds the choice
//! of a plain `Vec` guarded by one lock over per-account locks: accounts
//! are few and selection reads/writes the whole set atomically.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::config::AccountStrategy;
use crate::state::now_rfc3339;

/// Monotonic counter breaking ties between accounts used in rapid
/// succession. `last_used` (wall-clock, reported over the admin surface)
/// can tie under rapid successive use; `seq` cannot, so selection always
/// orders strictly by actual use order.
static USE_SEQ: AtomicU64 = AtomicU64::new(0);

/// Outcome of the most recent use of an account, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LastResult {
    Success,
    Failure,
}

/// Per-account usage record.
#[derive(Debug, Clone, Serialize)]
pub struct AccountUsage {
    pub email: String,
    pub last_used: Option<String>,
    pub use_count: u32,
    pub last_result: Option<LastResult>,
    /// Ordering tie-breaker, not part of the wire format.
    #[serde(skip)]
    seq: Option<u64>,
}

impl AccountUsage {
    pub fn new(email: impl Into<String>) -> Self {
        Self { email: email.into(), last_used: None, use_count: 0, last_result: None, seq: None }
    }
}

/// Select an account per `strategy` from `accounts`, in configured order.
/// Returns an empty string when no accounts are configured.
pub fn select_account(accounts: &[AccountUsage], strategy: AccountStrategy) -> String {
    match strategy {
        AccountStrategy::Lru => select_lru(accounts),
        AccountStrategy::RoundRobin => select_round_robin(accounts),
    }
}

/// LRU: any never-used account wins, in configured order; otherwise the
/// account used longest ago, ties broken by configured order.
fn select_lru(accounts: &[AccountUsage]) -> String {
    if accounts.is_empty() {
        return String::new();
    }
    if let Some(never_used) = accounts.iter().find(|a| a.seq.is_none()) {
        return never_used.email.clone();
    }

    let mut best: Option<&AccountUsage> = None;
    for candidate in accounts {
        let candidate_seq = candidate.seq.unwrap_or(u64::MAX);
        let replace = match best {
            None => true,
            Some(current) => candidate_seq < current.seq.unwrap_or(u64::MAX),
        };
        if replace {
            best = Some(candidate);
        }
    }
    best.map(|a| a.email.clone()).unwrap_or_default()
}

/// RoundRobin: find the most recently used account (ties broken by
/// configured order), return the account that follows it, wrapping. If no
/// account has ever been used, return the first configured account.
fn select_round_robin(accounts: &[AccountUsage]) -> String {
    if accounts.is_empty() {
        return String::new();
    }

    let mut most_recent: Option<usize> = None;
    for (idx, candidate) in accounts.iter().enumerate() {
        let Some(candidate_seq) = candidate.seq else { continue };
        let replace = match most_recent {
            None => true,
            Some(current_idx) => candidate_seq > accounts[current_idx].seq.unwrap_or(0),
        };
        if replace {
            most_recent = Some(idx);
        }
    }

    match most_recent {
        None => accounts[0].email.clone(),
        Some(idx) => accounts[(idx + 1) % accounts.len()].email.clone(),
    }
}

/// Record the outcome of using `email`, updating `last_used`, `use_count`,
/// and `last_result` together.
pub fn record_usage(accounts: &mut [AccountUsage], email: &str, success: bool) {
    let Some(account) = accounts.iter_mut().find(|a| a.email == email) else { return };
    account.last_used = Some(now_rfc3339());
    account.seq = Some(USE_SEQ.fetch_add(1, Ordering::Relaxed));
    account.use_count += 1;
    account.last_result = Some(if success { LastResult::Success } else { LastResult::Failure });
}

#[cfg(test)]
#[path = "account_tests.rs"]
mod tests;
