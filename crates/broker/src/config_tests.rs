// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use super::BrokerConfig;

fn parse(args: &[&str]) -> BrokerConfig {
    BrokerConfig::parse_from(args)
}

#[test]
fn defaults_follow_cli_behavior() -> anyhow::Result<()> {
    let config = parse(&["azbroker", "--auth-token", "s3cret"]);
    config.validate()?;
    assert_eq!(config.port, 8000);
    assert_eq!(config.az_bin, "az");
    assert_eq!(config.prompt_timeout(), Duration::from_secs(120));
    assert_eq!(config.logout_settle(), Duration::from_secs(5));
    assert!(!config.no_force_logout);

    let policy = config.retry_policy();
    assert_eq!(policy.max_attempts, 3);
    assert_eq!(policy.delay, Duration::from_secs(10));
    Ok(())
}

#[test]
fn explicit_config_root_wins() -> anyhow::Result<()> {
    let config = parse(&["azbroker", "--auth-token", "x", "--config-root", "/srv/az"]);
    assert_eq!(config.config_root(), PathBuf::from("/srv/az"));
    Ok(())
}

#[yare::parameterized(
    blank_token   = { &["azbroker", "--auth-token", "  "], "X_AUTH_TOKEN" },
    zero_attempts = { &["azbroker", "--auth-token", "x", "--max-attempts", "0"], "max-attempts" },
    bad_format    = { &["azbroker", "--auth-token", "x", "--log-format", "xml"], "log format" },
)]
fn invalid_config(args: &[&str], expected_substr: &str) {
    let config = parse(args);
    crate::assert_err_contains!(config.validate(), expected_substr);
}
