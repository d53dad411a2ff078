// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP surface of the broker.

pub mod auth;
pub mod http;
pub mod state;

pub use state::BrokerState;

use std::sync::Arc;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Build the axum `Router` with all HTTP routes.
pub fn build_router(state: Arc<BrokerState>) -> Router {
    Router::new()
        .route("/health", get(http::health))
        .route("/device-code/{user_id}", post(http::device_code))
        .route("/token/{user_id}", post(http::post_token).get(http::get_token))
        .route("/subscriptions/{user_id}", get(http::subscriptions))
        .layer(middleware::from_fn_with_state(state.clone(), auth::auth_layer))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
