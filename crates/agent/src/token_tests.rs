// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn generates_and_persists_a_fresh_token() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("token");

    let token = load_or_generate(&path).unwrap();
    assert_eq!(token.len(), 64, "32 random bytes hex-encoded");
    assert!(path.exists());

    let reloaded = load_or_generate(&path).unwrap();
    assert_eq!(token, reloaded, "an existing token file is reused verbatim");
}

#[cfg(unix)]
#[test]
fn persisted_token_file_is_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested/token");
    load_or_generate(&path).unwrap();

    let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, 0o600);
}
