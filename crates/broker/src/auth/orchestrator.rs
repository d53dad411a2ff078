// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::retry::RetryOutcome;
use super::token::{TokenPayload, TokenQuery};
use super::user::UserId;
use super::Authenticator;
use crate::error::AuthError;

impl Authenticator {
    /// Fetch a token for `user`, retrying transient failures.
    ///
    /// Returns `None` when the user has not completed the interactive login or
    /// every attempt failed. On success the token is stored before returning.
    pub async fn authenticate(&self, user: &UserId, query: &TokenQuery) -> Option<TokenPayload> {
        let outcome = self
            .settings
            .retry
            .run(|_| self.fetch_token(user, query), AuthError::is_terminal)
            .await;

        match outcome {
            RetryOutcome::Succeeded { value, attempts } => {
                self.store.set_token(user, value.clone());
                tracing::info!(user = %user, attempts, "authentication successful");
                Some(value)
            }
            RetryOutcome::Terminal { error, attempts } => {
                tracing::error!(
                    user = %user,
                    attempts,
                    err = %error,
                    "sign-in not completed, not retrying"
                );
                None
            }
            RetryOutcome::Exhausted { last, attempts } => {
                tracing::error!(
                    user = %user,
                    attempts,
                    err = %last,
                    "authentication failed after all attempts"
                );
                None
            }
        }
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
