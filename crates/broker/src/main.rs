// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use azbroker::cli::az::AzCli;
use azbroker::config::BrokerConfig;
use azbroker::transport::{build_router, BrokerState};

#[tokio::main]
async fn main() {
    let config = BrokerConfig::parse();

    if let Err(e) = config.validate() {
        eprintln!("error: {e}");
        std::process::exit(2);
    }

    init_tracing(&config);

    if let Err(e) = run(config).await {
        error!("fatal: {e:#}");
        std::process::exit(1);
    }
}

fn init_tracing(config: &BrokerConfig) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    match config.log_format.as_str() {
        "json" => {
            fmt::fmt().with_env_filter(filter).json().init();
        }
        _ => {
            fmt::fmt().with_env_filter(filter).init();
        }
    }
}

async fn run(config: BrokerConfig) -> anyhow::Result<()> {
    let shutdown = CancellationToken::new();
    let addr = format!("{}:{}", config.host, config.port);
    let cli = Arc::new(AzCli::new(config.az_bin.clone()));
    let state = Arc::new(BrokerState::new(config, cli)?);

    info!(
        config_root = %state.auth.config_root().display(),
        max_attempts = state.auth.settings().retry.max_attempts,
        "broker starting"
    );

    // Spawn signal handler
    {
        let sd = shutdown.clone();
        tokio::spawn(async move {
            let mut sigterm =
                tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()).ok();
            let mut sigint =
                tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt()).ok();

            tokio::select! {
                _ = async {
                    if let Some(ref mut s) = sigterm {
                        s.recv().await
                    } else {
                        std::future::pending().await
                    }
                } => {
                    info!("received SIGTERM");
                    sd.cancel();
                }
                _ = async {
                    if let Some(ref mut s) = sigint {
                        s.recv().await
                    } else {
                        std::future::pending().await
                    }
                } => {
                    info!("received SIGINT");
                    sd.cancel();
                }
            }
        });
    }

    let listener = TcpListener::bind(&addr).await?;
    info!("HTTP listening on {addr}");
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;

    info!("broker stopped");
    Ok(())
}
