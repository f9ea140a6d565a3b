// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn http_status_matches_code() {
    assert_eq!(ErrorCode::Unauthorized.http_status(), 401);
    assert_eq!(ErrorCode::BadRequest.http_status(), 400);
    assert_eq!(ErrorCode::NotFound.http_status(), 404);
    assert_eq!(ErrorCode::Internal.http_status(), 500);
}

#[test]
fn display_matches_as_str() {
    for code in [ErrorCode::Unauthorized, ErrorCode::BadRequest, ErrorCode::NotFound, ErrorCode::Internal] {
        assert_eq!(code.to_string(), code.as_str());
    }
}

#[test]
fn pane_error_display_includes_detail() {
    let err = PaneError::CommandFailed("exit 1".to_owned());
    assert!(err.to_string().contains("exit 1"));
}

#[test]
fn error_body_carries_code_and_message() {
    let body = ErrorCode::Unauthorized.to_error_body("missing bearer token");
    assert_eq!(body.code, "UNAUTHORIZED");
    assert_eq!(body.message, "missing bearer token");
}
