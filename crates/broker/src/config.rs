// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::auth::retry::RetryPolicy;

/// Device-code login broker for the Azure CLI.
#[derive(Debug, Clone, Parser)]
#[command(name = "azbroker", version, about)]
pub struct BrokerConfig {
    /// Host to bind on.
    #[arg(long, default_value = "0.0.0.0", env = "AZBROKER_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 8000, env = "AZBROKER_PORT")]
    pub port: u16,

    /// Shared secret expected in `X-Auth-Token` (or `Authorization: Bearer`).
    #[arg(long, env = "X_AUTH_TOKEN", hide_env_values = true)]
    pub auth_token: String,

    /// Log level (trace, debug, info, warn, error) or a full filter directive.
    #[arg(long, default_value = "info", env = "LOGGING_LEVEL")]
    pub log_level: String,

    /// Log format (text or json).
    #[arg(long, default_value = "text", env = "AZBROKER_LOG_FORMAT")]
    pub log_format: String,

    /// Path or name of the Azure CLI binary.
    #[arg(long, default_value = "az", env = "AZBROKER_AZ_BIN")]
    pub az_bin: String,

    /// Root under which per-user CLI config directories are created.
    #[arg(long, env = "AZBROKER_CONFIG_ROOT")]
    pub config_root: Option<PathBuf>,

    /// Seconds to wait for the device-code prompt.
    #[arg(long, default_value_t = 120, env = "AZBROKER_PROMPT_TIMEOUT_SECS")]
    pub prompt_timeout_secs: u64,

    /// Pause after `az logout` before starting a new login, in milliseconds.
    #[arg(long, default_value_t = 5000, env = "AZBROKER_LOGOUT_SETTLE_MS")]
    pub logout_settle_ms: u64,

    /// Skip the `az logout` that normally precedes a device-code login.
    #[arg(long, env = "AZBROKER_NO_FORCE_LOGOUT")]
    pub no_force_logout: bool,

    /// How long a pending login may take to exit on its own before it is killed.
    #[arg(long, default_value_t = 2000, env = "AZBROKER_FINALIZE_GRACE_MS")]
    pub finalize_grace_ms: u64,

    /// Token fetch attempts per authenticate call.
    #[arg(long, default_value_t = 3, env = "AZBROKER_MAX_ATTEMPTS")]
    pub max_attempts: u32,

    /// Delay between token fetch attempts, in milliseconds.
    #[arg(long, default_value_t = 10000, env = "AZBROKER_RETRY_DELAY_MS")]
    pub retry_delay_ms: u64,
}

impl BrokerConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.auth_token.trim().is_empty() {
            anyhow::bail!("X_AUTH_TOKEN must not be empty");
        }
        if self.max_attempts == 0 {
            anyhow::bail!("--max-attempts must be at least 1");
        }
        match self.log_format.as_str() {
            "text" | "json" => {}
            other => anyhow::bail!("invalid log format: {other}"),
        }
        Ok(())
    }

    /// Resolve the per-user config root.
    ///
    /// Uses `--config-root` when set, then `$HOME/.temp`, then `.azbroker`.
    pub fn config_root(&self) -> PathBuf {
        if let Some(ref root) = self.config_root {
            return root.clone();
        }
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(".temp");
        }
        PathBuf::from(".azbroker")
    }

    pub fn prompt_timeout(&self) -> Duration {
        Duration::from_secs(self.prompt_timeout_secs)
    }

    pub fn logout_settle(&self) -> Duration {
        Duration::from_millis(self.logout_settle_ms)
    }

    pub fn finalize_grace(&self) -> Duration {
        Duration::from_millis(self.finalize_grace_ms)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_millis(self.retry_delay_ms))
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
