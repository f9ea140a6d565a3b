// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::PaneError;

/// Opaque pane identifier, stable for the lifetime of the pane within its
/// backend. Identity of a pane is the pair `(backend_name, PaneId)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PaneId(pub i64);

impl fmt::Display for PaneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Descriptive metadata for one multiplexer pane.
///
/// The "rich" backend populates every field; the "fallback" backend may
/// leave `workspace`, `domain`, and `pid` as `None` when its CLI does not
/// expose them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pane {
    pub id: PaneId,
    pub window: String,
    pub title: String,
    pub cwd: String,
    pub active: bool,
    pub cols: u16,
    pub rows: u16,
    pub workspace: Option<String>,
    pub domain: Option<String>,
    pub pid: Option<u32>,
}

/// Capability-based abstraction over a terminal-multiplexer backend.
///
/// Object-safe so callers hold `Box<dyn PaneClient>` and swap backends
/// without the rest of the coordinator caring which one is in use.
#[async_trait]
pub trait PaneClient: Send + Sync {
    /// Stable name of this backend, used in pane identity and logs.
    fn backend_name(&self) -> &'static str;

    /// Enumerate all panes across all windows/tabs/sessions.
    async fn list_panes(&self) -> Result<Vec<Pane>, PaneError>;

    /// Read scrollback text for one pane.
    ///
    /// `start_line` is negative to request the last `-start_line` lines
    /// from the tail of the scrollback buffer.
    async fn get_text(&self, pane: PaneId, start_line: i64) -> Result<String, PaneError>;

    /// Write `text` into the pane.
    ///
    /// When `no_paste` is true the backend must deliver the text as if
    /// typed (no bracketed paste), required for codes and menu selections
    /// that some interactive prompts reject when pasted.
    async fn send_text(&self, pane: PaneId, text: &str, no_paste: bool) -> Result<(), PaneError>;

    /// Cheap startup probe. An unreachable backend is a fatal condition
    /// for the coordinator (see `error` module policy table).
    async fn is_available(&self) -> bool;
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
