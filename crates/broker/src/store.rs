// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-user session state: the pending interactive login and the last token.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::auth::token::TokenPayload;
use crate::auth::user::UserId;
use crate::cli::{LoginProcess, ProcessExit};

/// An interactive login that printed its device code and is waiting for the
/// user to finish in a browser.
pub struct PendingLogin {
    process: Box<dyn LoginProcess>,
    transcript: Vec<String>,
    started_at: Instant,
}

impl PendingLogin {
    pub fn new(process: Box<dyn LoginProcess>, transcript: Vec<String>) -> Self {
        Self { process, transcript, started_at: Instant::now() }
    }

    /// Output seen up to and including the prompt.
    pub fn transcript(&self) -> &[String] {
        &self.transcript
    }

    pub fn age(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Let the process exit (killing it after `grace`) and collect its output.
    pub async fn finalize(self, grace: Duration) -> ProcessExit {
        self.process.finalize(grace).await
    }

    /// Kill a login that is no longer wanted.
    pub async fn discard(self) {
        let exit = self.process.finalize(Duration::ZERO).await;
        tracing::debug!(code = ?exit.code, killed = exit.killed, "discarded pending login");
    }
}

impl std::fmt::Debug for PendingLogin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingLogin")
            .field("transcript_lines", &self.transcript.len())
            .field("age", &self.age())
            .finish()
    }
}

#[derive(Default)]
struct UserSession {
    pending: Option<PendingLogin>,
    token: Option<TokenPayload>,
}

/// Storage for per-user sessions.
///
/// Implementations must not perform I/O while holding internal locks: every
/// method returns as soon as the map access is done.
pub trait SessionStore: Send + Sync + 'static {
    /// Last token fetched for `user`, if any.
    fn get_token(&self, user: &UserId) -> Option<TokenPayload>;

    fn set_token(&self, user: &UserId, token: TokenPayload);

    /// Install a new pending login, returning the one it replaces.
    ///
    /// The caller owns the returned login and must finalize or discard it.
    fn supersede(&self, user: &UserId, pending: PendingLogin) -> Option<PendingLogin>;

    /// Remove and return the pending login for finalization.
    fn take_pending(&self, user: &UserId) -> Option<PendingLogin>;

    /// Whether a login is waiting on the user; logged when a new one starts.
    fn has_pending(&self, user: &UserId) -> bool;
}

/// In-memory [`SessionStore`] behind a single mutex.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<UserId, UserSession>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get_token(&self, user: &UserId) -> Option<TokenPayload> {
        self.sessions.lock().get(user).and_then(|s| s.token.clone())
    }

    fn set_token(&self, user: &UserId, token: TokenPayload) {
        self.sessions.lock().entry(user.clone()).or_default().token = Some(token);
    }

    fn supersede(&self, user: &UserId, pending: PendingLogin) -> Option<PendingLogin> {
        self.sessions.lock().entry(user.clone()).or_default().pending.replace(pending)
    }

    fn take_pending(&self, user: &UserId) -> Option<PendingLogin> {
        self.sessions.lock().get_mut(user).and_then(|s| s.pending.take())
    }

    fn has_pending(&self, user: &UserId) -> bool {
        self.sessions.lock().get(user).is_some_and(|s| s.pending.is_some())
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
