// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fixed-delay retry policy.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Retry an operation up to `max_attempts` times with a fixed `delay` between
/// attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3, delay: Duration::from_secs(10) }
    }
}

/// How a retried operation ended.
#[derive(Debug)]
pub enum RetryOutcome<T, E> {
    Succeeded { value: T, attempts: u32 },
    /// The error was classified terminal; no further attempts were made.
    Terminal { error: E, attempts: u32 },
    Exhausted { last: E, attempts: u32 },
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self { max_attempts: max_attempts.max(1), delay }
    }

    /// Run `op` until it succeeds, fails terminally, or attempts run out.
    ///
    /// `op` receives the 1-based attempt number. Sleeps only between attempts.
    pub async fn run<T, E, F, Fut, P>(&self, mut op: F, is_terminal: P) -> RetryOutcome<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
        E: Display,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match op(attempt).await {
                Ok(value) => return RetryOutcome::Succeeded { value, attempts: attempt },
                Err(error) if is_terminal(&error) => {
                    return RetryOutcome::Terminal { error, attempts: attempt };
                }
                Err(error) => {
                    if attempt >= self.max_attempts {
                        return RetryOutcome::Exhausted { last: error, attempts: attempt };
                    }
                    tracing::debug!(attempt, err = %error, "attempt failed, retrying");
                    tokio::time::sleep(self.delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
