// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Device-code login brokering on top of the Azure CLI.
//!
//! [`Authenticator`] ties the pieces together: [`env::EnvScoper`] isolates each
//! user's CLI state, [`device_code`] starts logins, [`token`] finalizes them and
//! fetches tokens, and [`orchestrator`] retries fetches under a
//! [`retry::RetryPolicy`].

pub mod device_code;
pub mod env;
pub mod orchestrator;
pub mod patterns;
pub mod retry;
pub mod token;
pub mod user;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::cli::{args, display_command, CliRunner};
use crate::config::BrokerConfig;
use crate::error::{AuthError, CommandFailure};
use crate::store::SessionStore;

use self::env::EnvScoper;
use self::patterns::CliPatterns;
use self::retry::RetryPolicy;
use self::token::TokenPayload;
use self::user::UserId;

/// Timing knobs for the login flow.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub prompt_timeout: Duration,
    pub force_logout: bool,
    pub logout_settle: Duration,
    pub finalize_grace: Duration,
    pub retry: RetryPolicy,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            prompt_timeout: Duration::from_secs(120),
            force_logout: true,
            logout_settle: Duration::from_secs(5),
            finalize_grace: Duration::from_secs(2),
            retry: RetryPolicy::default(),
        }
    }
}

impl From<&BrokerConfig> for AuthSettings {
    fn from(config: &BrokerConfig) -> Self {
        Self {
            prompt_timeout: config.prompt_timeout(),
            force_logout: !config.no_force_logout,
            logout_settle: config.logout_settle(),
            finalize_grace: config.finalize_grace(),
            retry: config.retry_policy(),
        }
    }
}

/// Brokers Azure CLI logins for many users at once.
pub struct Authenticator {
    cli: Arc<dyn CliRunner>,
    scoper: EnvScoper,
    store: Arc<dyn SessionStore>,
    patterns: CliPatterns,
    settings: AuthSettings,
}

impl Authenticator {
    pub fn new(
        cli: Arc<dyn CliRunner>,
        store: Arc<dyn SessionStore>,
        config_root: PathBuf,
        settings: AuthSettings,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            scoper: EnvScoper::new(Arc::clone(&cli), config_root),
            cli,
            store,
            patterns: CliPatterns::compile()?,
            settings,
        })
    }

    pub fn settings(&self) -> &AuthSettings {
        &self.settings
    }

    /// Directory holding every user's CLI config dir.
    pub fn config_root(&self) -> &std::path::Path {
        self.scoper.root()
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// Last token stored for `user`. Never touches the CLI.
    pub fn cached_token(&self, user: &UserId) -> Option<TokenPayload> {
        self.store.get_token(user)
    }

    /// Whether the user's config dir holds a signed-in account.
    pub async fn is_logged_in(&self, user: &UserId) -> Result<bool, AuthError> {
        let env = self.scoper.scope(user).await?;
        let out = self.cli.run(&args(["account", "get-access-token"]), Some(&env)).await?;
        if self.patterns.needs_login(&out.stderr) {
            tracing::warn!(user = %user, stderr = %out.stderr.trim(), "user is not signed in");
            return Ok(false);
        }
        Ok(true)
    }

    /// Subscriptions visible to a signed-in user.
    pub async fn list_subscriptions(
        &self,
        user: &UserId,
    ) -> Result<Vec<serde_json::Value>, AuthError> {
        if !self.is_logged_in(user).await? {
            return Err(AuthError::SignInRequired);
        }
        let env = self.scoper.scope(user).await?;
        let argv = args(["account", "list"]);
        let out = self.cli.run(&argv, Some(&env)).await?;
        let command = display_command(&argv);
        if !out.success() {
            return Err(AuthError::Command(CommandFailure::classify(command, out.code, out.stderr)));
        }
        serde_json::from_str(&out.stdout).map_err(|e| {
            AuthError::Command(CommandFailure::malformed(command, out.code, e.to_string()))
        })
    }

    /// Installed CLI version, e.g. `2.61.0`.
    pub async fn version(&self) -> Result<String, AuthError> {
        let argv = args(["--version"]);
        let out = self.cli.run(&argv, None).await?;
        if !out.success() {
            return Err(AuthError::Command(CommandFailure::classify(
                display_command(&argv),
                out.code,
                out.stderr,
            )));
        }
        self.patterns
            .extract_version(&out.stdout)
            .ok_or_else(|| AuthError::Extraction("azure-cli version".to_owned()))
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
