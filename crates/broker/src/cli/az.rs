// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `tokio::process` backed CLI runner.

use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;

use super::{BoxFuture, CliRunner, CommandOutput, LoginProcess, ProcessExit};
use crate::auth::env::ScopedEnv;

/// How long to keep draining output after the process has exited.
const DRAIN_TIMEOUT: Duration = Duration::from_millis(250);

/// Runs the real Azure CLI binary.
#[derive(Debug, Clone)]
pub struct AzCli {
    bin: String,
}

impl AzCli {
    pub fn new(bin: impl Into<String>) -> Self {
        Self { bin: bin.into() }
    }

    fn command(&self, args: &[String], env: Option<&ScopedEnv>) -> Command {
        let mut cmd = Command::new(&self.bin);
        cmd.args(args);
        cmd.stdin(Stdio::null());
        if let Some(env) = env {
            cmd.envs(env.vars());
        }
        cmd
    }
}

impl CliRunner for AzCli {
    fn run<'a>(
        &'a self,
        args: &'a [String],
        env: Option<&'a ScopedEnv>,
    ) -> BoxFuture<'a, std::io::Result<CommandOutput>> {
        Box::pin(async move {
            let output = self.command(args, env).output().await?;
            Ok(CommandOutput {
                code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            })
        })
    }

    fn spawn(&self, args: &[String], env: &ScopedEnv) -> std::io::Result<Box<dyn LoginProcess>> {
        let mut cmd = self.command(args, Some(env));
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        let mut child = cmd.spawn()?;
        let (tx, rx) = mpsc::unbounded_channel();
        if let Some(stdout) = child.stdout.take() {
            spawn_line_pump(stdout, tx.clone());
        }
        if let Some(stderr) = child.stderr.take() {
            spawn_line_pump(stderr, tx);
        }
        Ok(Box::new(AzLogin { child, lines: rx }))
    }
}

/// Forward lines from a child stream until EOF or the receiver goes away.
///
/// Lines are decoded lossily so stray non-UTF-8 bytes cannot stall the stream.
fn spawn_line_pump<R>(reader: R, tx: mpsc::UnboundedSender<String>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf);
                    if tx.send(line.trim_end_matches(['\r', '\n']).to_owned()).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::debug!(err = %e, "login output stream error");
                    break;
                }
            }
        }
    });
}

/// A running `az login` child with its merged output stream.
struct AzLogin {
    child: Child,
    lines: mpsc::UnboundedReceiver<String>,
}

impl LoginProcess for AzLogin {
    fn next_line(&mut self) -> BoxFuture<'_, Option<String>> {
        Box::pin(self.lines.recv())
    }

    fn finalize(self: Box<Self>, grace: Duration) -> BoxFuture<'static, ProcessExit> {
        let AzLogin { mut child, mut lines } = *self;
        Box::pin(async move {
            let (code, killed) = match tokio::time::timeout(grace, child.wait()).await {
                Ok(Ok(status)) => (status.code(), false),
                Ok(Err(e)) => {
                    tracing::warn!(err = %e, "failed to wait for login process");
                    (None, false)
                }
                Err(_) => {
                    if let Err(e) = child.kill().await {
                        tracing::warn!(err = %e, "failed to kill login process");
                    }
                    (None, true)
                }
            };

            let mut trailing = Vec::new();
            while let Ok(Some(line)) = tokio::time::timeout(DRAIN_TIMEOUT, lines.recv()).await {
                trailing.push(line);
            }
            ProcessExit { code, killed, trailing: trailing.join("\n") }
        })
    }
}

#[cfg(test)]
#[path = "az_tests.rs"]
mod tests;
