// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use crate::auth::{AuthSettings, Authenticator};
use crate::cli::CliRunner;
use crate::config::BrokerConfig;
use crate::store::{MemorySessionStore, SessionStore};

/// Shared application state passed to all handlers via axum `State` extractor.
pub struct BrokerState {
    pub config: BrokerConfig,
    pub auth: Authenticator,
}

impl BrokerState {
    /// Wire an [`Authenticator`] over `cli` with a fresh in-memory store.
    pub fn new(config: BrokerConfig, cli: Arc<dyn CliRunner>) -> anyhow::Result<Self> {
        let store: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new());
        let settings = AuthSettings::from(&config);
        let auth = Authenticator::new(cli, store, config.config_root(), settings)?;
        Ok(Self { config, auth })
    }
}
