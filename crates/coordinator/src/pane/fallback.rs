// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fallback `PaneClient`: shells out to a generic multiplexer CLI (tmux).

use async_trait::async_trait;

use crate::error::PaneError;
use crate::pane::client::{Pane, PaneClient, PaneId};

/// Multiplexer fields requested per pane, in order, from `list-panes -F`.
const LIST_FORMAT: &str =
    "#{pane_id}\t#{window_name}\t#{pane_title}\t#{pane_current_path}\t#{pane_active}\t#{pane_width}\t#{pane_height}";

/// `PaneClient` backed by shelling out to a generic multiplexer binary
/// (default `tmux`). Produces `Pane`s with narrower metadata than the
/// rich backend: `workspace`, `domain`, and `pid` are always `None`.
pub struct FallbackPaneClient {
    mux_bin: String,
}

impl FallbackPaneClient {
    pub fn new(mux_bin: impl Into<String>) -> Self {
        Self { mux_bin: mux_bin.into() }
    }

    async fn run(&self, args: &[&str]) -> Result<std::process::Output, PaneError> {
        tokio::process::Command::new(&self.mux_bin)
            .args(args)
            .output()
            .await
            .map_err(|e| PaneError::Unavailable(e.to_string()))
    }

    /// Parse tab-separated `list-panes -a -F <LIST_FORMAT>` output.
    fn parse_list_output(raw: &str) -> Vec<Pane> {
        let mut panes = Vec::new();
        for line in raw.lines() {
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() < 7 {
                continue;
            }
            // Pane ids come back as e.g. "%3"; strip the sigil.
            let id_str = fields[0].trim_start_matches('%');
            let Ok(id) = id_str.parse::<i64>() else { continue };

            panes.push(Pane {
                id: PaneId(id),
                window: fields[1].to_owned(),
                title: fields[2].to_owned(),
                cwd: fields[3].to_owned(),
                active: fields[4] == "1",
                cols: fields[5].parse().unwrap_or(80),
                rows: fields[6].parse().unwrap_or(24),
                workspace: None,
                domain: None,
                pid: None,
            });
        }
        panes
    }
}

#[async_trait]
impl PaneClient for FallbackPaneClient {
    fn backend_name(&self) -> &'static str {
        "fallback"
    }

    async fn list_panes(&self) -> Result<Vec<Pane>, PaneError> {
        let output = self.run(&["list-panes", "-a", "-F", LIST_FORMAT]).await?;
        if !output.status.success() {
            return Err(PaneError::CommandFailed(String::from_utf8_lossy(&output.stderr).into_owned()));
        }
        Ok(Self::parse_list_output(&String::from_utf8_lossy(&output.stdout)))
    }

    async fn get_text(&self, pane: PaneId, start_line: i64) -> Result<String, PaneError> {
        let target = format!("%{}", pane.0);
        let start = start_line.to_string();
        let output =
            self.run(&["capture-pane", "-t", &target, "-p", "-e", "-S", &start]).await?;
        if !output.status.success() {
            return Err(PaneError::NotFound(target));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn send_text(&self, pane: PaneId, text: &str, no_paste: bool) -> Result<(), PaneError> {
        let target = format!("%{}", pane.0);
        let mut args: Vec<&str> = vec!["send-keys", "-t", &target];
        if no_paste {
            args.push("-l");
        }
        args.push(text);
        let output = self.run(&args).await?;
        if !output.status.success() {
            return Err(PaneError::CommandFailed(String::from_utf8_lossy(&output.stderr).into_owned()));
        }
        Ok(())
    }

    async fn is_available(&self) -> bool {
        matches!(self.run(&["list-sessions"]).await, Ok(out) if out.status.success() || out.status.code() == Some(1))
    }
}

#[cfg(test)]
#[path = "fallback_tests.rs"]
mod tests;
