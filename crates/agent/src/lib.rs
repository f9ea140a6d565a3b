// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Auth Agent: the companion daemon that polls one or more Auth Recovery
//! Coordinators for outstanding re-login requests, drives the browser-side
//! OAuth completion, and reports the resulting code back.

pub mod account;
pub mod browser;
pub mod config;
pub mod error;
pub mod poll;
pub mod state;
pub mod token;
pub mod transport;

use std::path::PathBuf;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::browser::{BrowserDriver, UnimplementedBrowserDriver};
use crate::config::{load_accounts, load_coordinators, Config};
use crate::poll::spawn_poll_loop;
use crate::state::AgentState;
use crate::transport::build_router;

fn default_token_path() -> PathBuf {
    PathBuf::from(
        std::env::var("HOME").map(|home| format!("{home}/.config/arc-agent/token")).unwrap_or_else(
            |_| "./arc-agent-token".to_owned(),
        ),
    )
}

/// Run the agent until shutdown.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let shutdown = CancellationToken::new();

    let coordinators = load_coordinators(&config.coordinators_config)?;
    let accounts = load_accounts(config.accounts_config.as_deref())?;

    let token_path = config.token_path.clone().unwrap_or_else(default_token_path);
    let token = token::load_or_generate(&token_path)?;

    let coordinator_count = coordinators.len();
    let state = Arc::new(AgentState::new(config, coordinators, accounts, shutdown.clone())?);

    let browser: Arc<dyn BrowserDriver> = Arc::new(UnimplementedBrowserDriver);

    tracing::info!(%addr, coordinators = coordinator_count, "arc-agent listening");
    spawn_poll_loop(Arc::clone(&state), browser);

    let router = build_router(state, token);
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, router).with_graceful_shutdown(shutdown.cancelled_owned()).await?;

    Ok(())
}
