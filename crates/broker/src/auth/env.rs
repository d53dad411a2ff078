// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-user CLI environments.
//!
//! The Azure CLI keeps its login cache under `AZURE_CONFIG_DIR`. Giving every
//! user their own directory is what lets concurrent logins coexist.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::auth::user::UserId;
use crate::cli::{args, CliRunner};
use crate::error::AuthError;

pub const CONFIG_DIR_VAR: &str = "AZURE_CONFIG_DIR";

/// Settings applied to every user directory before use.
const TUNED_SETTINGS: [&str; 2] = ["core.login_experience_v2=off", "core.only_show_errors=yes"];

/// Process environment overrides for one user's CLI calls.
///
/// Everything not overridden is inherited from the broker process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopedEnv {
    config_dir: PathBuf,
    vars: Vec<(String, String)>,
}

impl ScopedEnv {
    pub fn new(config_dir: PathBuf) -> Self {
        let vars = vec![
            (CONFIG_DIR_VAR.to_owned(), config_dir.display().to_string()),
            ("AZURE_CORE_COLLECT_TELEMETRY".to_owned(), "no".to_owned()),
        ];
        Self { config_dir, vars }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn vars(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }
}

/// Derives [`ScopedEnv`]s rooted under a shared base directory.
pub struct EnvScoper {
    cli: Arc<dyn CliRunner>,
    root: PathBuf,
}

impl EnvScoper {
    pub fn new(cli: Arc<dyn CliRunner>, root: PathBuf) -> Self {
        Self { cli, root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the user's config directory and tune the CLI inside it.
    ///
    /// Tuning failures are logged and ignored; only directory creation can fail.
    pub async fn scope(&self, user: &UserId) -> Result<ScopedEnv, AuthError> {
        let dir = self.root.join(user.as_str());
        tokio::fs::create_dir_all(&dir).await?;
        tracing::debug!(user = %user, dir = %dir.display(), "scoped cli environment");

        let env = ScopedEnv::new(dir);
        for setting in TUNED_SETTINGS {
            self.tune(user, &env, setting).await;
        }
        Ok(env)
    }

    async fn tune(&self, user: &UserId, env: &ScopedEnv, setting: &str) {
        let argv = args(["config", "set", setting]);
        match self.cli.run(&argv, Some(env)).await {
            Ok(out) if out.success() => {
                tracing::debug!(user = %user, setting, "applied cli setting");
            }
            Ok(out) => {
                tracing::warn!(
                    user = %user,
                    setting,
                    stderr = %out.stderr.trim(),
                    "failed to apply cli setting"
                );
            }
            Err(e) => {
                tracing::warn!(user = %user, setting, err = %e, "failed to run cli config");
            }
        }
    }
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
