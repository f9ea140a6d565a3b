// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// One configured coordinator endpoint, loaded from `--coordinators-config`.
#[derive(Debug, Clone, Deserialize)]
pub struct CoordinatorConfigEntry {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub display_name: Option<String>,
    /// Bearer token for this coordinator's admin surface. Each coordinator
    /// generates its own token, so it is configured per entry rather than
    /// shared agent-wide.
    #[serde(default)]
    pub token: Option<String>,
}

/// One configured account, loaded from `--accounts-config`.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountConfigEntry {
    pub email: String,
}

/// Account-selection policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountStrategy {
    Lru,
    RoundRobin,
}

impl AccountStrategy {
    fn parse(raw: &str) -> anyhow::Result<Self> {
        match raw {
            "lru" => Ok(Self::Lru),
            "round_robin" | "round-robin" => Ok(Self::RoundRobin),
            other => anyhow::bail!("unknown account strategy {other:?}, expected \"lru\" or \"round_robin\""),
        }
    }
}

/// Configuration for the auth recovery agent.
#[derive(Debug, Clone, clap::Parser)]
pub struct Config {
    /// Host to bind the agent's own admin HTTP surface on.
    #[arg(long, default_value = "127.0.0.1", env = "ARC_AGENT_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 8901, env = "ARC_AGENT_PORT")]
    pub port: u16,

    /// Path to the bearer-token file for this agent's own admin surface.
    /// If missing, a fresh token is generated and written with owner-only
    /// (0600) permissions. The token(s) this agent presents *to* each
    /// coordinator it polls are configured separately, per entry, via
    /// `CoordinatorConfigEntry::token`.
    #[arg(long, env = "ARC_AGENT_TOKEN_PATH")]
    pub token_path: Option<PathBuf>,

    /// Path to a JSON file listing `[{name, url, display_name?}]`
    /// coordinator endpoints to poll.
    #[arg(long, env = "ARC_AGENT_COORDINATORS_CONFIG")]
    pub coordinators_config: PathBuf,

    /// Path to a JSON file listing `[{email}]` configured accounts.
    /// Omitted entirely disables account rotation (selection returns "").
    #[arg(long, env = "ARC_AGENT_ACCOUNTS_CONFIG")]
    pub accounts_config: Option<PathBuf>,

    /// Account-selection strategy: "lru" or "round_robin".
    #[arg(long, default_value = "lru", env = "ARC_AGENT_ACCOUNT_STRATEGY")]
    pub account_strategy: String,

    /// Interval between polls of each coordinator's `/auth/pending`, in
    /// milliseconds.
    #[arg(long, default_value_t = 2_000, env = "ARC_AGENT_POLL_MS")]
    pub poll_ms: u64,

    /// Deadline for a single coordinator poll HTTP call, in milliseconds.
    #[arg(long, default_value_t = 5_000, env = "ARC_AGENT_POLL_TIMEOUT_MS")]
    pub poll_timeout_ms: u64,

    /// End-to-end deadline for one browser-completion task, in milliseconds.
    #[arg(long, default_value_t = 90_000, env = "ARC_AGENT_BROWSER_TIMEOUT_MS")]
    pub browser_timeout_ms: u64,

    /// Maximum number of concurrently in-flight browser-completion tasks.
    #[arg(long, default_value_t = 4, env = "ARC_AGENT_MAX_CONCURRENT")]
    pub max_concurrent: usize,

    /// Log format ("text" or "json").
    #[arg(long, default_value = "text", env = "ARC_AGENT_LOG_FORMAT")]
    pub log_format: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "ARC_AGENT_LOG_LEVEL")]
    pub log_level: String,
}

impl Config {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_ms)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }

    pub fn browser_timeout(&self) -> Duration {
        Duration::from_millis(self.browser_timeout_ms)
    }

    pub fn account_strategy(&self) -> anyhow::Result<AccountStrategy> {
        AccountStrategy::parse(&self.account_strategy)
    }
}

/// Load the configured coordinator endpoints from `path`.
///
/// Follows `crates/mux/src/lib.rs::run`'s `CredentialConfig` file-load
/// pattern: a plain `serde_json::from_str` over the file contents.
pub fn load_coordinators(path: &Path) -> anyhow::Result<Vec<CoordinatorConfigEntry>> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("reading coordinators config {}: {e}", path.display()))?;
    let entries: Vec<CoordinatorConfigEntry> = serde_json::from_str(&raw)
        .map_err(|e| anyhow::anyhow!("parsing coordinators config {}: {e}", path.display()))?;
    anyhow::ensure!(!entries.is_empty(), "coordinators config {} lists no endpoints", path.display());
    Ok(entries)
}

/// Load the configured accounts from `path`, if given. An absent path
/// yields an empty account list (account rotation disabled).
pub fn load_accounts(path: Option<&Path>) -> anyhow::Result<Vec<AccountConfigEntry>> {
    let Some(path) = path else { return Ok(Vec::new()) };
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("reading accounts config {}: {e}", path.display()))?;
    let entries: Vec<AccountConfigEntry> = serde_json::from_str(&raw)
        .map_err(|e| anyhow::anyhow!("parsing accounts config {}: {e}", path.display()))?;
    Ok(entries)
}

/// Initialise tracing from `config`. Uses `try_init` so repeated calls
/// (e.g. from tests) are harmless. Mirrors `arc_coordinator::config::init_tracing`.
pub fn init_tracing(config: &Config) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = if std::env::var("RUST_LOG").is_err() {
        EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let result = match config.log_format.as_str() {
        "json" => fmt::fmt().with_env_filter(filter).json().try_init(),
        _ => fmt::fmt().with_env_filter(filter).try_init(),
    };
    drop(result);
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
