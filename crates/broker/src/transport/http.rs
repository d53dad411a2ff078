// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP request handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::auth::token::TokenQuery;
use crate::auth::user::UserId;
use crate::error::{AuthError, ErrorCode};
use crate::transport::state::BrokerState;

/// Response for `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    /// Installed Azure CLI version, `None` if it could not be determined.
    pub version: Option<String>,
}

fn error_response(err: &AuthError) -> Response {
    err.code().to_http_response(err.to_string()).into_response()
}

fn parse_user(raw: &str) -> Result<UserId, Response> {
    UserId::parse(raw).map_err(|e| error_response(&e))
}

/// `POST /device-code/{user_id}` — start a device-code login.
pub async fn device_code(
    State(s): State<Arc<BrokerState>>,
    Path(user_id): Path<String>,
) -> Response {
    let user = match parse_user(&user_id) {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    match s.auth.begin_login(&user).await {
        Ok(code) => Json(code).into_response(),
        Err(e) => {
            tracing::error!(user = %user, err = %e, "device code request failed");
            error_response(&e)
        }
    }
}

/// `POST /token/{user_id}` — finish the login and fetch a token.
pub async fn post_token(
    State(s): State<Arc<BrokerState>>,
    Path(user_id): Path<String>,
    Json(query): Json<TokenQuery>,
) -> Response {
    let user = match parse_user(&user_id) {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    match s.auth.is_logged_in(&user).await {
        Ok(true) => {}
        Ok(false) => {
            return ErrorCode::BadRequest
                .to_http_response("device code not requested")
                .into_response();
        }
        Err(e) => return error_response(&e),
    }

    // Runs to completion even if the client disconnects mid-retry.
    let state = Arc::clone(&s);
    let task = tokio::spawn(async move { state.auth.authenticate(&user, &query).await });
    match task.await {
        Ok(Some(token)) => Json(token).into_response(),
        Ok(None) => ErrorCode::BadRequest.to_http_response("token not found").into_response(),
        Err(e) => {
            tracing::error!(err = %e, "authentication task failed");
            ErrorCode::Internal.to_http_response("authentication task failed").into_response()
        }
    }
}

/// `GET /token/{user_id}` — last token fetched for the user.
pub async fn get_token(
    State(s): State<Arc<BrokerState>>,
    Path(user_id): Path<String>,
) -> Response {
    let user = match parse_user(&user_id) {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    match s.auth.cached_token(&user) {
        Some(token) => Json(token).into_response(),
        None => ErrorCode::NotFound.to_http_response("no token for user").into_response(),
    }
}

/// `GET /subscriptions/{user_id}` — subscriptions visible to the user.
pub async fn subscriptions(
    State(s): State<Arc<BrokerState>>,
    Path(user_id): Path<String>,
) -> Response {
    let user = match parse_user(&user_id) {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    match s.auth.list_subscriptions(&user).await {
        Ok(subs) => Json(subs).into_response(),
        Err(e) => {
            tracing::error!(user = %user, err = %e, "listing subscriptions failed");
            error_response(&e)
        }
    }
}

/// `GET /health` — liveness plus the installed CLI version.
pub async fn health(State(s): State<Arc<BrokerState>>) -> impl IntoResponse {
    let version = match s.auth.version().await {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!(err = %e, "could not determine azure-cli version");
            None
        }
    };
    Json(HealthResponse { status: "UP".to_owned(), version })
}
