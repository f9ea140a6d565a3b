// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the auth recovery coordinator.
#[derive(Debug, Clone, clap::Parser)]
pub struct Config {
    /// Host to bind the admin HTTP surface on.
    #[arg(long, default_value = "127.0.0.1", env = "ARC_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 8900, env = "ARC_PORT")]
    pub port: u16,

    /// Path to the bearer-token file. If missing, a fresh token is
    /// generated and written with owner-only (0600) permissions.
    #[arg(long, env = "ARC_TOKEN_PATH")]
    pub token_path: Option<PathBuf>,

    /// Pane multiplexer backend: "rich" or "fallback".
    #[arg(long, default_value = "fallback", env = "ARC_BACKEND")]
    pub backend: String,

    /// Base URL of the rich backend's native RPC endpoint (ignored for fallback).
    #[arg(long, env = "ARC_BACKEND_URL")]
    pub backend_url: Option<String>,

    /// Path to the fallback backend's multiplexer CLI binary.
    #[arg(long, default_value = "tmux", env = "ARC_MUX_BIN")]
    pub mux_bin: String,

    /// Poll loop interval in milliseconds.
    #[arg(long, default_value_t = 500, env = "ARC_POLL_MS")]
    pub poll_ms: u64,

    /// Maximum residency in AUTH_PENDING/CODE_RECEIVED/AWAITING_CONFIRM
    /// before a tracker transitions to FAILED, in milliseconds.
    #[arg(long, default_value_t = 120_000, env = "ARC_AUTH_TIMEOUT_MS")]
    pub auth_timeout_ms: u64,

    /// Maximum residency in any other non-IDLE, non-FAILED state, in milliseconds.
    #[arg(long, default_value_t = 60_000, env = "ARC_STATE_TIMEOUT_MS")]
    pub state_timeout_ms: u64,

    /// Maximum residency in FAILED before Reset, in milliseconds.
    #[arg(long, default_value_t = 30_000, env = "ARC_FAILED_TIMEOUT_MS")]
    pub failed_timeout_ms: u64,

    /// Cooldown after a resume-prompt injection, in milliseconds.
    #[arg(long, default_value_t = 5_000, env = "ARC_RESUME_COOLDOWN_MS")]
    pub resume_cooldown_ms: u64,

    /// Cooldown after a compaction-reminder injection, in milliseconds.
    #[arg(long, default_value_t = 60_000, env = "ARC_COMPACTION_COOLDOWN_MS")]
    pub compaction_reminder_cooldown_ms: u64,

    /// Whether to inject a reminder after a compacting banner is observed.
    #[arg(long, default_value_t = true, env = "ARC_COMPACTION_REMINDER_ENABLED")]
    pub compaction_reminder_enabled: bool,

    /// Reminder text injected after a compacting banner, absent a more
    /// recent reminder already visible in the pane tail.
    #[arg(
        long,
        default_value = "Please continue where you left off.",
        env = "ARC_COMPACTION_REMINDER_PROMPT"
    )]
    pub compaction_reminder_prompt: String,

    /// Prompt injected after a successful re-login to resume prior work.
    #[arg(long, default_value = "Please continue.", env = "ARC_RESUME_PROMPT")]
    pub resume_prompt: String,

    /// Number of trailing scrollback lines requested from GetText polls.
    #[arg(long, default_value_t = 200, env = "ARC_TAIL_LINES")]
    pub tail_lines: i64,

    /// Cooldown after injecting `/login`, in milliseconds.
    #[arg(long, default_value_t = 2_000, env = "ARC_LOGIN_COOLDOWN_MS")]
    pub login_cooldown_ms: u64,

    /// Cooldown after confirming the first login-method option, in milliseconds.
    #[arg(long, default_value_t = 2_000, env = "ARC_METHOD_SELECT_COOLDOWN_MS")]
    pub method_select_cooldown_ms: u64,

    /// Log format ("text" or "json").
    #[arg(long, default_value = "text", env = "ARC_LOG_FORMAT")]
    pub log_format: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "ARC_LOG_LEVEL")]
    pub log_level: String,
}

/// Initialise tracing from `config`. Uses `try_init` so repeated calls
/// (e.g. from tests) are harmless.
///
/// Priority: `--log-level`/`ARC_LOG_LEVEL` takes effect only when `RUST_LOG`
/// is unset.
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

impl Config {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_ms)
    }

    pub fn auth_timeout(&self) -> Duration {
        Duration::from_millis(self.auth_timeout_ms)
    }

    pub fn state_timeout(&self) -> Duration {
        Duration::from_millis(self.state_timeout_ms)
    }

    pub fn failed_timeout(&self) -> Duration {
        Duration::from_millis(self.failed_timeout_ms)
    }

    pub fn resume_cooldown(&self) -> Duration {
        Duration::from_millis(self.resume_cooldown_ms)
    }

    pub fn compaction_reminder_cooldown(&self) -> Duration {
        Duration::from_millis(self.compaction_reminder_cooldown_ms)
    }

    pub fn login_cooldown(&self) -> Duration {
        Duration::from_millis(self.login_cooldown_ms)
    }

    pub fn method_select_cooldown(&self) -> Duration {
        Duration::from_millis(self.method_select_cooldown_ms)
    }
}

impl From<&Config> for crate::tracker::TrackerTiming {
    fn from(cfg: &Config) -> Self {
        Self {
            auth_timeout: cfg.auth_timeout(),
            state_timeout: cfg.state_timeout(),
            failed_timeout: cfg.failed_timeout(),
            resume_cooldown: cfg.resume_cooldown(),
            compaction_reminder_cooldown: cfg.compaction_reminder_cooldown(),
            compaction_reminder_enabled: cfg.compaction_reminder_enabled,
            compaction_reminder_prompt: cfg.compaction_reminder_prompt.clone(),
            resume_prompt: cfg.resume_prompt.clone(),
            login_cooldown: cfg.login_cooldown(),
            method_select_cooldown: cfg.method_select_cooldown(),
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
