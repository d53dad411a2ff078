// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Device-code login launch.

use serde::{Deserialize, Serialize};

use super::env::ScopedEnv;
use super::patterns::{CliPatterns, Prompt, DEVICE_LOGIN_URL};
use super::user::UserId;
use super::Authenticator;
use crate::cli::{args, LoginProcess};
use crate::error::AuthError;
use crate::store::PendingLogin;

/// What the user needs to finish signing in from a browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceCode {
    pub url: String,
    pub device_code: String,
}

enum Watch {
    Prompt(Prompt),
    Closed,
}

/// Read lines until the prompt shows up or the output closes.
async fn watch_for_prompt(
    patterns: &CliPatterns,
    process: &mut dyn LoginProcess,
    transcript: &mut Vec<String>,
) -> Watch {
    while let Some(line) = process.next_line().await {
        tracing::trace!(line = %line, "login output");
        let prompt = patterns.match_prompt(&line);
        transcript.push(line);
        if let Some(prompt) = prompt {
            return Watch::Prompt(prompt);
        }
    }
    Watch::Closed
}

impl Authenticator {
    /// Start an interactive login for `user` and return its device code.
    ///
    /// The login process keeps running after this returns; it is finalized by
    /// the next [`fetch_token`](Self::fetch_token) for the same user, or
    /// discarded when another login supersedes it.
    pub async fn begin_login(&self, user: &UserId) -> Result<DeviceCode, AuthError> {
        let replacing = self.store.has_pending(user);
        tracing::info!(user = %user, replacing, "starting device code login");
        let env = self.scoper.scope(user).await?;

        if self.settings.force_logout {
            self.logout(user, &env).await;
            tokio::time::sleep(self.settings.logout_settle).await;
        }

        let mut process = self.cli.spawn(&args(["login", "--use-device-code"]), &env)?;
        tracing::debug!(user = %user, "launched device code login");

        let mut transcript = Vec::new();
        let watched = tokio::time::timeout(
            self.settings.prompt_timeout,
            watch_for_prompt(&self.patterns, process.as_mut(), &mut transcript),
        )
        .await;

        let prompt = match watched {
            Ok(Watch::Prompt(prompt)) => prompt,
            Ok(Watch::Closed) => {
                let exit = process.finalize(std::time::Duration::ZERO).await;
                tracing::error!(
                    user = %user,
                    code = ?exit.code,
                    "login exited before device code was provided"
                );
                transcript.extend(exit.trailing.lines().map(str::to_owned));
                return Err(AuthError::PrematureExit { transcript: transcript.join("\n") });
            }
            Err(_) => {
                tracing::error!(user = %user, "timed out waiting for device code prompt");
                tokio::spawn(PendingLogin::new(process, transcript).discard());
                return Err(AuthError::PromptTimeout(self.settings.prompt_timeout));
            }
        };

        let Some(device_code) = self.patterns.extract_device_code(&prompt.line) else {
            tracing::error!(user = %user, line = %prompt.line, "could not extract device code");
            tokio::spawn(PendingLogin::new(process, transcript).discard());
            return Err(AuthError::Extraction("device code".to_owned()));
        };

        if let Some(old) = self.store.supersede(user, PendingLogin::new(process, transcript)) {
            tracing::info!(user = %user, "superseding earlier pending login");
            tokio::spawn(old.discard());
        }

        tracing::info!(user = %user, "device code issued");
        Ok(DeviceCode { url: DEVICE_LOGIN_URL.to_owned(), device_code })
    }

    /// Best-effort `az logout` so a new login starts from a clean cache.
    async fn logout(&self, user: &UserId, env: &ScopedEnv) {
        match self.cli.run(&args(["logout"]), Some(env)).await {
            Ok(out) if out.success() => tracing::info!(user = %user, "logged out of azure cli"),
            Ok(out) => {
                tracing::debug!(user = %user, stderr = %out.stderr.trim(), "logout failed");
            }
            Err(e) => tracing::warn!(user = %user, err = %e, "failed to run logout"),
        }
    }
}

#[cfg(test)]
#[path = "device_code_tests.rs"]
mod tests;
