// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fmt;
use std::time::Duration;

use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

/// Error codes for the broker API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    Unauthorized,
    Forbidden,
    BadRequest,
    NotFound,
    Internal,
}

impl ErrorCode {
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Unauthorized => 401,
            Self::Forbidden => 403,
            Self::BadRequest => 400,
            Self::NotFound => 404,
            Self::Internal => 500,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::BadRequest => "BAD_REQUEST",
            Self::NotFound => "NOT_FOUND",
            Self::Internal => "INTERNAL",
        }
    }

    pub fn to_error_body(&self, message: impl Into<String>) -> ErrorBody {
        ErrorBody { code: self.as_str().to_owned(), message: message.into() }
    }

    pub fn to_http_response(
        &self,
        message: impl Into<String>,
    ) -> (StatusCode, Json<ErrorResponse>) {
        let status =
            StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorResponse { error: self.to_error_body(message) };
        (status, Json(body))
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level error response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

/// Error body with machine-readable code and human-readable message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

/// How a failed CLI invocation should be treated by callers that retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The user has not finished (or never started) the interactive login.
    SignInRequired,
    /// Anything else; another attempt may succeed.
    Transient,
}

/// A CLI command that exited non-zero or produced output we could not use.
#[derive(Debug, Clone)]
pub struct CommandFailure {
    pub command: String,
    pub code: Option<i32>,
    pub stderr: String,
    pub kind: FailureKind,
}

impl CommandFailure {
    /// Build a failure from a finished command, classifying it from stderr.
    pub fn classify(
        command: impl Into<String>,
        code: Option<i32>,
        stderr: impl Into<String>,
    ) -> Self {
        let stderr = stderr.into();
        let kind = if crate::auth::patterns::signals_sign_in(&stderr) {
            FailureKind::SignInRequired
        } else {
            FailureKind::Transient
        };
        Self { command: command.into(), code, stderr, kind }
    }

    /// Failure for output that could not be parsed. Always transient.
    pub fn malformed(
        command: impl Into<String>,
        code: Option<i32>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            command: command.into(),
            code,
            stderr: detail.into(),
            kind: FailureKind::Transient,
        }
    }
}

impl fmt::Display for CommandFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => {
                write!(f, "{} failed with exit code {code}: {}", self.command, self.stderr.trim())
            }
            None => write!(f, "{} failed: {}", self.command, self.stderr.trim()),
        }
    }
}

/// Errors raised by the authentication core.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("could not extract {0}")]
    Extraction(String),

    #[error("login exited before a device code was provided")]
    PrematureExit { transcript: String },

    #[error("no device code prompt within {0:?}")]
    PromptTimeout(Duration),

    #[error("{0}")]
    Command(CommandFailure),

    #[error("user is not signed in")]
    SignInRequired,

    #[error("invalid user id: {0:?}")]
    InvalidUser(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl AuthError {
    /// Whether retrying cannot help until the user completes the interactive login.
    pub fn is_terminal(&self) -> bool {
        match self {
            Self::SignInRequired => true,
            Self::Command(failure) => failure.kind == FailureKind::SignInRequired,
            _ => false,
        }
    }

    /// Map to the API error code used at the HTTP boundary.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidUser(_) | Self::SignInRequired => ErrorCode::BadRequest,
            _ => ErrorCode::Internal,
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
