// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The coordinator's single ticker-driven poll loop.
//!
//! Follows the `upstream::poller::spawn_screen_poller` ticker idiom,
//! generalised from "poll N sessions' cached screens" to "poll every
//! known pane and drive its tracker's state machine".

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use uuid::Uuid;

use crate::pane::PaneClient;
use crate::state::{now_rfc3339, AuthRequest, AuthRequestStatus, CoordinatorState, PaneKey};
use crate::tracker::{process_pane_state, Action};

/// Spawn the poll loop as a background task. Returns immediately; the
/// task runs until `state.shutdown` is cancelled.
pub fn spawn_poll_loop(state: Arc<CoordinatorState>, client: Arc<dyn PaneClient>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(state.config.poll_interval());
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = state.shutdown.cancelled() => break,
                _ = interval.tick() => {}
            }

            if let Err(error) = poll_once(&state, client.as_ref()).await {
                tracing::warn!(%error, "poll tick failed");
            }
        }
    });
}

/// Run a single poll tick: list panes, diff against known trackers, and
/// drive `processPaneState` for each live pane.
pub async fn poll_once(
    state: &CoordinatorState,
    client: &dyn PaneClient,
) -> anyhow::Result<()> {
    let backend = client.backend_name().to_owned();
    let panes = client.list_panes().await?;
    let seen: HashSet<PaneKey> = panes
        .iter()
        .map(|pane| PaneKey { backend: backend.clone(), pane_id: pane.id })
        .collect();

    state.retire_missing(&seen).await;

    for pane in panes {
        let key = PaneKey { backend: backend.clone(), pane_id: pane.id };
        let now = Instant::now();
        let tracker = state.tracker_for(&key, now).await;

        let text = match client.get_text(pane.id, -state.config.tail_lines).await {
            Ok(text) => text,
            Err(error) => {
                tracing::debug!(pane = %key, %error, "get_text failed, skipping this tick");
                continue;
            }
        };

        let prev_state;
        let actions = {
            let mut guard = tracker.lock().await;
            prev_state = guard.state;
            process_pane_state(&mut guard, &text, now, &state.timing, &|| Uuid::new_v4().to_string())
        };
        let next_state = tracker.lock().await.state;
        if next_state != prev_state {
            state.events.transition(&key.to_string(), prev_state.as_str(), next_state.as_str());
        }

        execute_actions(state, client, &key, pane.id, actions).await;
    }

    Ok(())
}

/// Execute the side effects `processPaneState` requested, outside any
/// tracker lock: the poll loop holds no locks while calling `SendText`.
async fn execute_actions(
    state: &CoordinatorState,
    client: &dyn PaneClient,
    key: &PaneKey,
    pane_id: crate::pane::PaneId,
    actions: Vec<Action>,
) {
    for action in actions {
        match action {
            Action::SendText { text, no_paste } => {
                state.events.injection(&key.to_string(), &text);
                if let Err(error) = client.send_text(pane_id, &text, no_paste).await {
                    tracing::warn!(pane = %key, %error, "send_text failed");
                    state.events.failure(&key.to_string(), &error.to_string());
                }
            }
            Action::PublishAuthRequest { request_id, url } => {
                state
                    .insert_request(AuthRequest {
                        id: request_id,
                        pane_id: key.to_string(),
                        url,
                        created_at: now_rfc3339(),
                        status: AuthRequestStatus::Pending,
                        preferred_account: None,
                    })
                    .await;
            }
            Action::ReleaseAuthRequest { request_id } => {
                state.remove_request(&request_id).await;
            }
        }
    }
}

#[cfg(test)]
#[path = "poll_tests.rs"]
mod tests;
