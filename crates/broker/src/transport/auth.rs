// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::error::ErrorCode;
use crate::transport::state::BrokerState;

/// Header carrying the shared secret.
pub const AUTH_HEADER: &str = "x-auth-token";

/// Constant-time string comparison to prevent timing side-channel attacks.
fn constant_time_eq(a: &str, b: &str) -> bool {
    let a = a.as_bytes();
    let b = b.as_bytes();
    if a.len() != b.len() {
        return false;
    }
    let mut acc = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        acc |= x ^ y;
    }
    acc == 0
}

/// Pull the presented secret from `X-Auth-Token`, falling back to
/// `Authorization: Bearer` (scheme matched case-insensitively).
fn presented_token(headers: &HeaderMap) -> Option<&str> {
    if let Some(token) = headers.get(AUTH_HEADER).and_then(|v| v.to_str().ok()) {
        return Some(token);
    }
    let header = headers.get("authorization").and_then(|v| v.to_str().ok())?;
    let (scheme, token) = header.split_once(' ')?;
    scheme.eq_ignore_ascii_case("bearer").then(|| token.trim_start())
}

/// Validate the shared secret.
///
/// A missing secret is `Unauthorized`; a wrong one is `Forbidden`.
pub fn validate_secret(headers: &HeaderMap, expected: &str) -> Result<(), ErrorCode> {
    let token = presented_token(headers).ok_or(ErrorCode::Unauthorized)?;
    if constant_time_eq(token, expected) {
        Ok(())
    } else {
        Err(ErrorCode::Forbidden)
    }
}

/// Axum middleware that enforces the shared secret on every route.
pub async fn auth_layer(
    State(state): State<Arc<BrokerState>>,
    req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    if let Err(code) = validate_secret(req.headers(), &state.config.auth_token) {
        tracing::warn!(path = %req.uri().path(), code = %code, "rejected request");
        let message = match code {
            ErrorCode::Unauthorized => "missing auth token",
            _ => "invalid auth token",
        };
        return code.to_http_response(message).into_response();
    }

    next.run(req).await
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
