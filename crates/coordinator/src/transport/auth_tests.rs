// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use axum::http::HeaderMap;

use super::*;

fn headers_with_bearer(token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("authorization", format!("Bearer {token}").parse().unwrap());
    headers
}

#[test]
fn valid_bearer_token_passes() {
    assert!(validate_bearer(&headers_with_bearer("secret"), "secret").is_ok());
}

#[test]
fn mismatched_bearer_token_is_unauthorized() {
    assert_eq!(validate_bearer(&headers_with_bearer("wrong"), "secret"), Err(ErrorCode::Unauthorized));
}

#[test]
fn missing_header_is_unauthorized() {
    assert_eq!(validate_bearer(&HeaderMap::new(), "secret"), Err(ErrorCode::Unauthorized));
}

#[test]
fn non_bearer_scheme_is_unauthorized() {
    let mut headers = HeaderMap::new();
    headers.insert("authorization", "Basic secret".parse().unwrap());
    assert_eq!(validate_bearer(&headers, "secret"), Err(ErrorCode::Unauthorized));
}
