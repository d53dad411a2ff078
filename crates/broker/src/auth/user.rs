// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fmt;

use crate::error::AuthError;

const MAX_LEN: usize = 128;

/// Opaque user identifier, safe to use as a directory name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(String);

impl UserId {
    pub fn parse(raw: &str) -> Result<Self, AuthError> {
        let valid = !raw.is_empty()
            && raw.len() <= MAX_LEN
            && raw != "."
            && raw != ".."
            && raw.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | '@'));
        if valid {
            Ok(Self(raw.to_owned()))
        } else {
            Err(AuthError::InvalidUser(raw.to_owned()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::UserId;

    #[yare::parameterized(
        plain = { "alice" },
        email = { "alice@example.com" },
        guid  = { "0b6f1c2e-7d7a-4c5e-9d35-2f1a3b4c5d6e" },
        dots  = { "first.last" },
    )]
    fn accepts(raw: &str) {
        assert!(UserId::parse(raw).is_ok(), "{raw} should be accepted");
    }

    #[yare::parameterized(
        empty     = { "" },
        dot       = { "." },
        dotdot    = { ".." },
        slash     = { "a/b" },
        traversal = { "../etc" },
        space     = { "a b" },
        backslash = { "a\\b" },
    )]
    fn rejects(raw: &str) {
        assert!(UserId::parse(raw).is_err(), "{raw} should be rejected");
    }

    #[test]
    fn rejects_overlong() {
        let raw = "a".repeat(129);
        assert!(UserId::parse(&raw).is_err());
        assert!(UserId::parse(&raw[..128]).is_ok());
    }
}
