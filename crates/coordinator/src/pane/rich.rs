// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Rich `PaneClient`: speaks a multiplexer's native JSON RPC over HTTP.
//!
//! Follows the upstream JSON client idiom of `UpstreamClient`: a thin
//! `reqwest::Client` wrapper, one method per verb, deserializing into
//! fully-populated domain structs.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::error::PaneError;
use crate::pane::client::{Pane, PaneClient, PaneId};

#[derive(Debug, Deserialize)]
struct RichPane {
    id: i64,
    window: String,
    title: String,
    cwd: String,
    active: bool,
    cols: u16,
    rows: u16,
    workspace: Option<String>,
    domain: Option<String>,
    pid: Option<u32>,
}

impl From<RichPane> for Pane {
    fn from(p: RichPane) -> Self {
        Pane {
            id: PaneId(p.id),
            window: p.window,
            title: p.title,
            cwd: p.cwd,
            active: p.active,
            cols: p.cols,
            rows: p.rows,
            workspace: p.workspace,
            domain: p.domain,
            pid: p.pid,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TextResponse {
    text: String,
}

/// `PaneClient` backed by an integrated multiplexer's native JSON RPC.
pub struct RichPaneClient {
    base_url: String,
    http: reqwest::Client,
}

impl RichPaneClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(5))
                .build()
                .unwrap_or_default(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl PaneClient for RichPaneClient {
    fn backend_name(&self) -> &'static str {
        "rich"
    }

    async fn list_panes(&self) -> Result<Vec<Pane>, PaneError> {
        let resp = self
            .http
            .get(self.url("/panes"))
            .send()
            .await
            .map_err(|e| PaneError::Unavailable(e.to_string()))?;
        let panes: Vec<RichPane> = resp
            .json()
            .await
            .map_err(|e| PaneError::MalformedOutput(e.to_string()))?;
        Ok(panes.into_iter().map(Pane::from).collect())
    }

    async fn get_text(&self, pane: PaneId, start_line: i64) -> Result<String, PaneError> {
        let resp = self
            .http
            .get(self.url(&format!("/panes/{pane}/text")))
            .query(&[("start_line", start_line)])
            .send()
            .await
            .map_err(|e| PaneError::Unavailable(e.to_string()))?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(PaneError::NotFound(pane.to_string()));
        }
        let body: TextResponse =
            resp.json().await.map_err(|e| PaneError::MalformedOutput(e.to_string()))?;
        Ok(body.text)
    }

    async fn send_text(&self, pane: PaneId, text: &str, no_paste: bool) -> Result<(), PaneError> {
        let body = serde_json::json!({ "text": text, "no_paste": no_paste });
        let resp = self
            .http
            .post(self.url(&format!("/panes/{pane}/input")))
            .json(&body)
            .send()
            .await
            .map_err(|e| PaneError::Unavailable(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(PaneError::CommandFailed(format!("status {}", resp.status())));
        }
        Ok(())
    }

    async fn is_available(&self) -> bool {
        self.http
            .get(self.url("/health"))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }
}

#[cfg(test)]
#[path = "rich_tests.rs"]
mod tests;
