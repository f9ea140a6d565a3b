// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Auth Recovery Coordinator: watches terminal-multiplexer panes, drives
//! the re-login dialog when a provider rate-limits an assistant session,
//! and hands the OAuth URL off to a companion agent.

pub mod config;
pub mod error;
pub mod events;
pub mod pane;
pub mod pattern;
pub mod poll;
pub mod state;
pub mod token;
pub mod tracker;
pub mod transport;

use std::path::PathBuf;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::pane::PaneClient;
use crate::pane::fallback::FallbackPaneClient;
use crate::pane::rich::RichPaneClient;
use crate::poll::spawn_poll_loop;
use crate::state::CoordinatorState;
use crate::transport::build_router;

/// Construct the configured `PaneClient` backend.
fn build_pane_client(config: &Config) -> anyhow::Result<Arc<dyn PaneClient>> {
    match config.backend.as_str() {
        "fallback" => Ok(Arc::new(FallbackPaneClient::new(&config.mux_bin))),
        "rich" => {
            let url = config
                .backend_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("--backend-url is required for the rich backend"))?;
            Ok(Arc::new(RichPaneClient::new(url)))
        }
        other => Err(anyhow::anyhow!("unknown backend {other:?}, expected \"rich\" or \"fallback\"")),
    }
}

fn default_token_path() -> PathBuf {
    PathBuf::from(
        std::env::var("HOME").map(|home| format!("{home}/.config/arc-coordinator/token")).unwrap_or_else(
            |_| "./arc-coordinator-token".to_owned(),
        ),
    )
}

/// Run the coordinator until shutdown.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let shutdown = CancellationToken::new();

    let client = build_pane_client(&config)?;
    if !client.is_available().await {
        anyhow::bail!("backend {:?} is unavailable", client.backend_name());
    }

    let token_path = config.token_path.clone().unwrap_or_else(default_token_path);
    let token = token::load_or_generate(&token_path)?;

    let state = Arc::new(CoordinatorState::new(config, shutdown.clone()));

    tracing::info!(backend = %client.backend_name(), %addr, "arc-coordinator listening");
    spawn_poll_loop(Arc::clone(&state), client);

    let router = build_router(state, token);
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, router).with_graceful_shutdown(shutdown.cancelled_owned()).await?;

    Ok(())
}
