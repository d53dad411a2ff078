// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Token retrieval via `az account get-access-token`.

use serde::{Deserialize, Serialize};

use super::user::UserId;
use super::Authenticator;
use crate::cli::display_command;
use crate::error::{AuthError, CommandFailure};

/// Access token as reported by the CLI. Field names match its JSON output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPayload {
    #[serde(rename = "accessToken")]
    pub access_token: String,
    #[serde(rename = "expiresOn", default)]
    pub expires_on: Option<String>,
    /// Expiry as epoch seconds.
    #[serde(rename = "expires_on", default)]
    pub expires_on_epoch: Option<i64>,
    #[serde(default)]
    pub subscription: Option<String>,
    #[serde(default)]
    pub tenant: Option<String>,
    #[serde(rename = "tokenType", default)]
    pub token_type: Option<String>,
}

/// What to request a token for.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenQuery {
    pub resource: String,
    #[serde(default)]
    pub subscription_id: Option<String>,
    #[serde(default)]
    pub tenant_id: Option<String>,
}

impl TokenQuery {
    pub fn resource(resource: impl Into<String>) -> Self {
        Self { resource: resource.into(), subscription_id: None, tenant_id: None }
    }

    /// CLI arguments. A tenant qualifier wins over a subscription.
    pub fn command_args(&self) -> Vec<String> {
        let mut argv = vec![
            "account".to_owned(),
            "get-access-token".to_owned(),
            "--resource".to_owned(),
            self.resource.clone(),
        ];
        if let Some(ref tenant) = self.tenant_id {
            argv.extend(["--tenant".to_owned(), tenant.clone()]);
        } else if let Some(ref subscription) = self.subscription_id {
            argv.extend(["--subscription".to_owned(), subscription.clone()]);
        }
        argv
    }
}

impl Authenticator {
    /// Finalize the user's pending login, if any, then fetch a token.
    pub async fn fetch_token(
        &self,
        user: &UserId,
        query: &TokenQuery,
    ) -> Result<TokenPayload, AuthError> {
        match self.store.take_pending(user) {
            Some(pending) => {
                let age = pending.age();
                let exit = pending.finalize(self.settings.finalize_grace).await;
                tracing::debug!(
                    user = %user,
                    code = ?exit.code,
                    killed = exit.killed,
                    age_secs = age.as_secs(),
                    trailing = %exit.trailing,
                    "finalized pending login"
                );
            }
            None => {
                tracing::warn!(user = %user, "no pending login process, continuing");
            }
        }

        let env = self.scoper.scope(user).await?;
        let argv = query.command_args();
        let out = self.cli.run(&argv, Some(&env)).await?;
        let command = display_command(&argv);

        if !out.success() {
            return Err(AuthError::Command(CommandFailure::classify(command, out.code, out.stderr)));
        }
        serde_json::from_str(&out.stdout).map_err(|e| {
            AuthError::Command(CommandFailure::malformed(command, out.code, e.to_string()))
        })
    }
}

#[cfg(test)]
#[path = "token_tests.rs"]
mod tests;
