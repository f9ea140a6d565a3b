// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Browser-side OAuth completion, represented as a swappable capability
//! trait. Browser-automation internals are an external collaborator this
//! crate deliberately does not implement.
//!
//! Object-safe like `arc_coordinator::pane::PaneClient`, so the agent's
//! dispatch loop never needs to know whether it is driving a real Chrome
//! instance or a test double. `CredentialBroker`
//! (`crates/mux/src/credential/broker.rs`) treats token-exchange URLs as
//! isolated, swappable functions the same way.

use async_trait::async_trait;

use crate::error::BrowserError;

/// Drives the browser-side half of an OAuth re-login and returns the
/// short verification code the provider displays on completion.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    /// Navigate to `url`, complete the login, and return the
    /// provider-issued verification code.
    async fn complete(&self, url: &str) -> Result<String, BrowserError>;
}

/// A `BrowserDriver` that never actually drives a browser: it always
/// reports [`BrowserError::NavigationFailed`]. Real browser automation is
/// out of scope for this crate; callers wire in their own implementation
/// (headless Chrome, a remote automation service, …).
/// Provided so the agent's dispatch loop and its tests have a concrete
/// type to exercise without a live browser.
pub struct UnimplementedBrowserDriver;

#[async_trait]
impl BrowserDriver for UnimplementedBrowserDriver {
    async fn complete(&self, _url: &str) -> Result<String, BrowserError> {
        Err(BrowserError::NavigationFailed("no browser driver configured".to_owned()))
    }
}

/// A `BrowserDriver` double that returns a fixed code, for tests that
/// exercise the dispatch loop without touching the network.
#[cfg(test)]
pub struct FixedCodeDriver {
    pub code: String,
}

#[cfg(test)]
#[async_trait]
impl BrowserDriver for FixedCodeDriver {
    async fn complete(&self, _url: &str) -> Result<String, BrowserError> {
        Ok(self.code.clone())
    }
}

#[cfg(test)]
#[path = "browser_tests.rs"]
mod tests;
