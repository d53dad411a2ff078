// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod store;
pub mod test_support;
pub mod transport;
