// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test infrastructure: a scripted CLI runner and assertion helpers.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::auth::env::{ScopedEnv, CONFIG_DIR_VAR};
use crate::auth::retry::RetryPolicy;
use crate::auth::{AuthSettings, Authenticator};
use crate::cli::{BoxFuture, CliRunner, CommandOutput, LoginProcess, ProcessExit};
use crate::store::{MemorySessionStore, SessionStore};

/// Message the CLI prints when a config dir has no signed-in account.
pub const NOT_SIGNED_IN: &str = "ERROR: Please run 'az login' to setup account.";

/// One recorded call into [`FakeCli`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub args: Vec<String>,
    pub config_dir: Option<PathBuf>,
    pub spawned: bool,
}

impl Invocation {
    pub fn line(&self) -> String {
        self.args.join(" ")
    }
}

struct Rule {
    prefix: String,
    outputs: VecDeque<CommandOutput>,
    gate: Option<Arc<Notify>>,
}

/// A scripted interactive login.
#[derive(Debug, Clone, Default)]
pub struct FakeLogin {
    pub lines: Vec<String>,
    /// Keep the stream open after `lines` are consumed (an `az login` still
    /// waiting for the user) instead of closing it.
    pub stay_open: bool,
    pub exit_code: Option<i32>,
}

impl FakeLogin {
    /// A login that prints the standard device-code prompt and keeps waiting.
    pub fn prompting(code: &str) -> Self {
        Self {
            lines: vec![
                format!(
                    "WARNING: To sign in, use a web browser to open the page \
                     https://microsoft.com/devicelogin and enter the code {code} to authenticate."
                ),
            ],
            stay_open: true,
            exit_code: Some(0),
        }
    }

    /// A login that fails before prompting.
    pub fn exiting(lines: &[&str]) -> Self {
        Self {
            lines: lines.iter().map(|s| (*s).to_owned()).collect(),
            stay_open: false,
            exit_code: Some(1),
        }
    }
}

/// Scripted [`CliRunner`].
///
/// Commands are matched by prefix of their space-joined args. A rule with
/// several queued outputs yields them in order and repeats the last one.
/// Unmatched commands succeed with empty output.
#[derive(Default)]
pub struct FakeCli {
    rules: Mutex<Vec<Rule>>,
    logins: Mutex<VecDeque<FakeLogin>>,
    calls: Mutex<Vec<Invocation>>,
    finalized: Arc<AtomicUsize>,
}

impl FakeCli {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue outputs for commands starting with `prefix`.
    pub fn respond(&self, prefix: &str, outputs: Vec<CommandOutput>) {
        self.rules.lock().push(Rule {
            prefix: prefix.to_owned(),
            outputs: outputs.into(),
            gate: None,
        });
    }

    /// Like [`respond`](Self::respond), but each call waits for `gate` first.
    pub fn respond_gated(&self, prefix: &str, output: CommandOutput) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.rules.lock().push(Rule {
            prefix: prefix.to_owned(),
            outputs: VecDeque::from([output]),
            gate: Some(Arc::clone(&gate)),
        });
        gate
    }

    /// Queue an interactive login for the next `spawn`.
    pub fn push_login(&self, login: FakeLogin) {
        self.logins.lock().push_back(login);
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().clone()
    }

    /// Number of calls whose args start with `prefix`.
    pub fn count(&self, prefix: &str) -> usize {
        self.calls.lock().iter().filter(|c| c.line().starts_with(prefix)).count()
    }

    /// Number of login processes that have been finalized or discarded.
    pub fn finalized(&self) -> usize {
        self.finalized.load(Ordering::SeqCst)
    }

    fn record(&self, args: &[String], env: Option<&ScopedEnv>, spawned: bool) {
        let config_dir = env.and_then(|e| e.get(CONFIG_DIR_VAR)).map(PathBuf::from);
        self.calls.lock().push(Invocation { args: args.to_vec(), config_dir, spawned });
    }

    fn next_output(&self, line: &str) -> (CommandOutput, Option<Arc<Notify>>) {
        let mut rules = self.rules.lock();
        for rule in rules.iter_mut() {
            if !line.starts_with(&rule.prefix) {
                continue;
            }
            let output = if rule.outputs.len() > 1 {
                rule.outputs.pop_front().unwrap_or_default()
            } else {
                rule.outputs.front().cloned().unwrap_or_default()
            };
            return (output, rule.gate.clone());
        }
        (ok(""), None)
    }
}

impl CliRunner for FakeCli {
    fn run<'a>(
        &'a self,
        args: &'a [String],
        env: Option<&'a ScopedEnv>,
    ) -> BoxFuture<'a, std::io::Result<CommandOutput>> {
        Box::pin(async move {
            self.record(args, env, false);
            let (output, gate) = self.next_output(&args.join(" "));
            if let Some(gate) = gate {
                gate.notified().await;
            }
            Ok(output)
        })
    }

    fn spawn(&self, args: &[String], env: &ScopedEnv) -> std::io::Result<Box<dyn LoginProcess>> {
        self.record(args, Some(env), true);
        let login = self.logins.lock().pop_front().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "no scripted login")
        })?;
        Ok(Box::new(FakeLoginProcess {
            lines: login.lines.into(),
            stay_open: login.stay_open,
            exit_code: login.exit_code,
            finalized: Arc::clone(&self.finalized),
        }))
    }
}

struct FakeLoginProcess {
    lines: VecDeque<String>,
    stay_open: bool,
    exit_code: Option<i32>,
    finalized: Arc<AtomicUsize>,
}

impl LoginProcess for FakeLoginProcess {
    fn next_line(&mut self) -> BoxFuture<'_, Option<String>> {
        Box::pin(async move {
            match self.lines.pop_front() {
                Some(line) => Some(line),
                None if self.stay_open => std::future::pending().await,
                None => None,
            }
        })
    }

    fn finalize(self: Box<Self>, _grace: Duration) -> BoxFuture<'static, ProcessExit> {
        let FakeLoginProcess { lines, stay_open, exit_code, finalized } = *self;
        finalized.fetch_add(1, Ordering::SeqCst);
        let trailing = lines.into_iter().collect::<Vec<_>>().join("\n");
        let exit = ProcessExit { code: exit_code, killed: stay_open, trailing };
        Box::pin(async move { exit })
    }
}

/// Settings with the production retry bound and no logout pause.
pub fn test_settings() -> AuthSettings {
    AuthSettings {
        prompt_timeout: Duration::from_secs(120),
        force_logout: true,
        logout_settle: Duration::ZERO,
        finalize_grace: Duration::from_millis(10),
        retry: RetryPolicy::new(3, Duration::from_secs(10)),
    }
}

/// An [`Authenticator`] over `cli` with its store exposed for assertions.
pub fn test_authenticator(
    cli: &Arc<FakeCli>,
    root: &Path,
) -> anyhow::Result<(Authenticator, Arc<MemorySessionStore>)> {
    let store = Arc::new(MemorySessionStore::new());
    let auth = Authenticator::new(
        Arc::clone(cli) as Arc<dyn CliRunner>,
        Arc::clone(&store) as Arc<dyn SessionStore>,
        root.to_path_buf(),
        test_settings(),
    )?;
    Ok((auth, store))
}

/// Successful command output.
pub fn ok(stdout: &str) -> CommandOutput {
    CommandOutput { code: Some(0), stdout: stdout.to_owned(), stderr: String::new() }
}

/// Failed command output.
pub fn fail(code: i32, stderr: &str) -> CommandOutput {
    CommandOutput { code: Some(code), stdout: String::new(), stderr: stderr.to_owned() }
}

/// A realistic `az account get-access-token` payload.
pub fn token_json(access_token: &str) -> String {
    serde_json::json!({
        "accessToken": access_token,
        "expiresOn": "2030-01-01 00:00:00.000000",
        "expires_on": 1893456000,
        "subscription": "00000000-0000-0000-0000-000000000001",
        "tenant": "00000000-0000-0000-0000-0000000000aa",
        "tokenType": "Bearer"
    })
    .to_string()
}

/// Convert foreign `Result`s (e.g. from `axum_test`) into `anyhow::Result`.
pub trait AnyhowExt<T> {
    fn anyhow(self) -> anyhow::Result<T>;
}

impl<T, E: std::fmt::Display> AnyhowExt<T> for Result<T, E> {
    fn anyhow(self) -> anyhow::Result<T> {
        self.map_err(|e| anyhow::anyhow!("{e}"))
    }
}

/// Assert that an expression evaluates to `Err` whose Display output
/// contains the given substring.
#[macro_export]
macro_rules! assert_err_contains {
    ($expr:expr, $substr:expr) => {{
        let result = $expr;
        let err = result.expect_err(concat!("expected Err for: ", stringify!($expr)));
        let msg = err.to_string();
        assert!(msg.contains($substr), "expected error containing {:?}, got: {msg:?}", $substr);
    }};
}
