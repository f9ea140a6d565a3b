// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test harness for end-to-end binary smoke tests.
//!
//! Spawns the real `arc-coordinator` and `arc-agent` binaries as
//! subprocesses and exercises their admin HTTP surfaces.

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::Once;
use std::time::Duration;

static CRYPTO_INIT: Once = Once::new();

/// Install the ring crypto provider for reqwest/rustls.
/// Safe to call multiple times — only the first call has effect.
pub fn ensure_crypto() {
    CRYPTO_INIT.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

/// Resolve the path to a compiled workspace binary.
pub fn binary_path(name: &str) -> PathBuf {
    let manifest = Path::new(env!("CARGO_MANIFEST_DIR"));
    // tests/specs → tests → workspace root
    let workspace = manifest.parent().and_then(|p| p.parent()).unwrap_or(manifest);
    workspace.join("target").join("debug").join(name)
}

/// Find a free TCP port by binding to :0 then releasing.
pub fn free_port() -> anyhow::Result<u16> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    Ok(listener.local_addr()?.port())
}

async fn wait_for_health(base_url: &str, timeout: Duration) -> anyhow::Result<()> {
    let client = reqwest::Client::new();
    let url = format!("{base_url}/health");
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if tokio::time::Instant::now() > deadline {
            anyhow::bail!("{base_url} did not become healthy within {timeout:?}");
        }
        if let Ok(resp) = client.get(&url).send().await {
            if resp.status().is_success() {
                return Ok(());
            }
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

async fn wait_for_exit(child: &mut Child, timeout: Duration) -> anyhow::Result<std::process::ExitStatus> {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if tokio::time::Instant::now() > deadline {
            anyhow::bail!("process did not exit within {timeout:?}");
        }
        if let Some(status) = child.try_wait()? {
            return Ok(status);
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

/// A running `arc-coordinator` process that is killed on drop.
pub struct CoordinatorProcess {
    child: Child,
    port: u16,
    token: String,
    _token_dir: tempfile::TempDir,
}

impl CoordinatorProcess {
    /// Spawn `arc-coordinator` against a rich-backend mock listening at
    /// `backend_url`, with a fixed bearer token so callers can construct
    /// authenticated requests without reading the generated-token file.
    pub fn start(backend_url: &str) -> anyhow::Result<Self> {
        ensure_crypto();
        let binary = binary_path("arc-coordinator");
        anyhow::ensure!(binary.exists(), "arc-coordinator binary not found at {}", binary.display());

        let port = free_port()?;
        let token_dir = tempfile::tempdir()?;
        let token_path = token_dir.path().join("token");
        let token = "test-coordinator-token-0123456789abcdef".to_owned();
        std::fs::write(&token_path, &token)?;

        let child = Command::new(&binary)
            .args([
                "--host",
                "127.0.0.1",
                "--port",
                &port.to_string(),
                "--token-path",
                &token_path.to_string_lossy(),
                "--backend",
                "rich",
                "--backend-url",
                backend_url,
                "--log-format",
                "text",
                "--log-level",
                "warn",
            ])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        Ok(Self { child, port, token, _token_dir: token_dir })
    }

    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub async fn wait_healthy(&self, timeout: Duration) -> anyhow::Result<()> {
        wait_for_health(&self.base_url(), timeout).await
    }
}

impl Drop for CoordinatorProcess {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// A running `arc-agent` process that is killed on drop.
pub struct AgentProcess {
    child: Child,
    port: u16,
    token: String,
    _state_dir: tempfile::TempDir,
}

impl AgentProcess {
    /// Spawn `arc-agent` configured to poll the coordinators described by
    /// `coordinators_json` (already-serialized `[{name,url,token}, ...]`).
    pub fn start(coordinators_json: &str) -> anyhow::Result<Self> {
        ensure_crypto();
        let binary = binary_path("arc-agent");
        anyhow::ensure!(binary.exists(), "arc-agent binary not found at {}", binary.display());

        let port = free_port()?;
        let state_dir = tempfile::tempdir()?;
        let coordinators_path = state_dir.path().join("coordinators.json");
        std::fs::write(&coordinators_path, coordinators_json)?;
        let token_path = state_dir.path().join("token");
        let token = "test-agent-token-0123456789abcdef".to_owned();
        std::fs::write(&token_path, &token)?;

        let child = Command::new(&binary)
            .args([
                "--host",
                "127.0.0.1",
                "--port",
                &port.to_string(),
                "--token-path",
                &token_path.to_string_lossy(),
                "--coordinators-config",
                &coordinators_path.to_string_lossy(),
                "--poll-ms",
                "100",
                "--log-format",
                "text",
                "--log-level",
                "warn",
            ])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        Ok(Self { child, port, token, _state_dir: state_dir })
    }

    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub async fn wait_healthy(&self, timeout: Duration) -> anyhow::Result<()> {
        wait_for_health(&self.base_url(), timeout).await
    }

    pub async fn wait_exit(&mut self, timeout: Duration) -> anyhow::Result<std::process::ExitStatus> {
        wait_for_exit(&mut self.child, timeout).await
    }
}

impl Drop for AgentProcess {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
