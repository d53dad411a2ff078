// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;
use std::time::Duration;

use crate::auth::patterns::DEVICE_LOGIN_URL;
use crate::auth::user::UserId;
use crate::auth::{AuthSettings, Authenticator};
use crate::cli::CliRunner;
use crate::error::AuthError;
use crate::store::{MemorySessionStore, SessionStore};
use crate::test_support::{test_authenticator, test_settings, FakeCli, FakeLogin};

async fn wait_for_finalized(cli: &FakeCli, n: usize) {
    for _ in 0..100 {
        if cli.finalized() >= n {
            return;
        }
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn issues_code_and_keeps_process_pending() -> anyhow::Result<()> {
    let root = tempfile::tempdir()?;
    let cli = FakeCli::new();
    cli.push_login(FakeLogin::prompting("ABC123"));
    let (auth, store) = test_authenticator(&cli, root.path())?;
    let alice = UserId::parse("alice")?;

    let code = auth.begin_login(&alice).await?;

    assert_eq!(code.url, DEVICE_LOGIN_URL);
    assert_eq!(code.device_code, "ABC123");
    assert!(store.has_pending(&alice));
    assert_eq!(cli.finalized(), 0);
    Ok(())
}

#[tokio::test]
async fn logs_out_then_spawns_login_in_user_dir() -> anyhow::Result<()> {
    let root = tempfile::tempdir()?;
    let cli = FakeCli::new();
    cli.push_login(FakeLogin::prompting("XYZ"));
    let (auth, _store) = test_authenticator(&cli, root.path())?;

    auth.begin_login(&UserId::parse("alice")?).await?;

    let calls = cli.calls();
    let logout = calls.iter().position(|c| c.line() == "logout");
    let login = calls.iter().position(|c| c.spawned);
    assert!(matches!((logout, login), (Some(a), Some(b)) if a < b));

    let spawned = calls.iter().find(|c| c.spawned).ok_or_else(|| anyhow::anyhow!("no spawn"))?;
    assert_eq!(spawned.line(), "login --use-device-code");
    assert_eq!(spawned.config_dir.as_deref(), Some(root.path().join("alice").as_path()));
    Ok(())
}

#[tokio::test]
async fn skips_logout_when_disabled() -> anyhow::Result<()> {
    let root = tempfile::tempdir()?;
    let cli = FakeCli::new();
    cli.push_login(FakeLogin::prompting("XYZ"));
    let settings = AuthSettings { force_logout: false, ..test_settings() };
    let auth = Authenticator::new(
        Arc::clone(&cli) as Arc<dyn CliRunner>,
        Arc::new(MemorySessionStore::new()) as Arc<dyn SessionStore>,
        root.path().to_path_buf(),
        settings,
    )?;

    auth.begin_login(&UserId::parse("alice")?).await?;
    assert_eq!(cli.count("logout"), 0);
    Ok(())
}

#[tokio::test]
async fn exit_without_prompt_is_premature() -> anyhow::Result<()> {
    let root = tempfile::tempdir()?;
    let cli = FakeCli::new();
    cli.push_login(FakeLogin::exiting(&["ERROR: unrecognized arguments: --use-device-code"]));
    let (auth, store) = test_authenticator(&cli, root.path())?;
    let alice = UserId::parse("alice")?;

    let err = auth
        .begin_login(&alice)
        .await
        .err()
        .ok_or_else(|| anyhow::anyhow!("expected error"))?;

    match err {
        AuthError::PrematureExit { transcript } => {
            assert!(transcript.contains("unrecognized arguments"));
        }
        other => anyhow::bail!("unexpected error: {other}"),
    }
    assert!(!store.has_pending(&alice));
    Ok(())
}

#[tokio::test]
async fn unparsable_code_is_extraction_error() -> anyhow::Result<()> {
    let root = tempfile::tempdir()?;
    let cli = FakeCli::new();
    cli.push_login(FakeLogin {
        lines: vec![format!(
            "To sign in, use a web browser to open the page {DEVICE_LOGIN_URL} \
             and enter the code   to authenticate."
        )],
        stay_open: true,
        exit_code: None,
    });
    let (auth, store) = test_authenticator(&cli, root.path())?;
    let alice = UserId::parse("alice")?;

    let result = auth.begin_login(&alice).await;
    assert!(matches!(result, Err(AuthError::Extraction(_))));
    assert!(!store.has_pending(&alice));

    wait_for_finalized(&cli, 1).await;
    assert_eq!(cli.finalized(), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn silent_login_times_out() -> anyhow::Result<()> {
    let root = tempfile::tempdir()?;
    let cli = FakeCli::new();
    cli.push_login(FakeLogin {
        lines: vec!["Starting...".to_owned()],
        stay_open: true,
        exit_code: None,
    });
    let (auth, _store) = test_authenticator(&cli, root.path())?;

    let result = auth.begin_login(&UserId::parse("alice")?).await;
    assert!(matches!(result, Err(AuthError::PromptTimeout(d)) if d == Duration::from_secs(120)));
    Ok(())
}

#[tokio::test]
async fn new_login_supersedes_and_discards_old() -> anyhow::Result<()> {
    let root = tempfile::tempdir()?;
    let cli = FakeCli::new();
    cli.push_login(FakeLogin::prompting("FIRST"));
    cli.push_login(FakeLogin::prompting("SECOND"));
    let (auth, store) = test_authenticator(&cli, root.path())?;
    let alice = UserId::parse("alice")?;

    assert_eq!(auth.begin_login(&alice).await?.device_code, "FIRST");
    assert_eq!(auth.begin_login(&alice).await?.device_code, "SECOND");

    wait_for_finalized(&cli, 1).await;
    assert_eq!(cli.finalized(), 1);
    let pending = store.take_pending(&alice).ok_or_else(|| anyhow::anyhow!("no pending"))?;
    assert!(pending.transcript().iter().any(|l| l.contains("SECOND")));
    Ok(())
}

#[tokio::test]
async fn spawn_failure_surfaces_io_error() -> anyhow::Result<()> {
    let root = tempfile::tempdir()?;
    let cli = FakeCli::new();
    let (auth, _store) = test_authenticator(&cli, root.path())?;

    let result = auth.begin_login(&UserId::parse("alice")?).await;
    assert!(matches!(result, Err(AuthError::Io(_))));
    Ok(())
}

#[tokio::test]
async fn concurrent_users_get_independent_sessions() -> anyhow::Result<()> {
    let root = tempfile::tempdir()?;
    let cli = FakeCli::new();
    cli.push_login(FakeLogin::prompting("AAA"));
    cli.push_login(FakeLogin::prompting("BBB"));
    let (auth, store) = test_authenticator(&cli, root.path())?;
    let a = UserId::parse("a")?;
    let b = UserId::parse("b")?;

    let (ra, rb) = tokio::join!(auth.begin_login(&a), auth.begin_login(&b));
    let mut codes = vec![ra?.device_code, rb?.device_code];
    codes.sort();
    assert_eq!(codes, vec!["AAA".to_owned(), "BBB".to_owned()]);
    assert!(store.has_pending(&a) && store.has_pending(&b));
    assert_eq!(cli.finalized(), 0);
    Ok(())
}
