// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Admin-API bearer token: loaded from an owner-only file, or generated
//! and persisted on first run. Duplicated from `arc_coordinator::token`
//! since the two daemons do not share a crate.

use std::path::Path;

use rand::RngCore;

/// Load the admin-API token from `path`, generating and persisting a
/// fresh 32-byte random token (hex-encoded) if the file is absent.
pub fn load_or_generate(path: &Path) -> anyhow::Result<String> {
    if path.exists() {
        let contents = std::fs::read_to_string(path)?;
        return Ok(contents.trim().to_owned());
    }

    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    let token = hex_encode(&bytes);

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, &token)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    }

    Ok(token)
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

#[cfg(test)]
#[path = "token_tests.rs"]
mod tests;
