// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Seam between the broker and the external Azure CLI binary.

pub mod az;

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use crate::auth::env::ScopedEnv;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Result of a one-shot CLI invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` if the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// How an interactive process ended once it was finalized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessExit {
    pub code: Option<i32>,
    /// Whether the process had to be killed after the grace period.
    pub killed: bool,
    /// Output produced after the caller stopped reading lines.
    pub trailing: String,
}

/// Runs CLI commands with a caller-supplied environment.
///
/// `args` never include the binary itself.
pub trait CliRunner: Send + Sync + 'static {
    fn run<'a>(
        &'a self,
        args: &'a [String],
        env: Option<&'a ScopedEnv>,
    ) -> BoxFuture<'a, std::io::Result<CommandOutput>>;

    /// Start a long-running interactive command.
    fn spawn(&self, args: &[String], env: &ScopedEnv) -> std::io::Result<Box<dyn LoginProcess>>;
}

/// A live interactive CLI process.
///
/// Exactly one owner at a time: the launcher while it watches for the prompt,
/// then the session store, then whoever finalizes it.
pub trait LoginProcess: Send + 'static {
    /// Next line of merged stdout/stderr. `None` once both streams closed.
    fn next_line(&mut self) -> BoxFuture<'_, Option<String>>;

    /// Wait up to `grace` for the process to exit on its own, kill it
    /// otherwise, and collect any output that was not read.
    fn finalize(self: Box<Self>, grace: Duration) -> BoxFuture<'static, ProcessExit>;
}

/// Render an invocation for logs and error messages.
pub fn display_command(args: &[String]) -> String {
    let mut out = String::from("az");
    for arg in args {
        out.push(' ');
        out.push_str(arg);
    }
    out
}

/// Owned argument vector from string literals.
pub fn args<const N: usize>(parts: [&str; N]) -> Vec<String> {
    parts.iter().map(|s| (*s).to_owned()).collect()
}
