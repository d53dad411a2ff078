// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use super::{RetryOutcome, RetryPolicy};

#[tokio::test(start_paused = true)]
async fn stops_on_first_success() {
    let policy = RetryPolicy::new(3, Duration::from_secs(10));
    let outcome = policy.run(|_| async { Ok::<_, String>(7) }, |_| false).await;
    assert!(matches!(outcome, RetryOutcome::Succeeded { value: 7, attempts: 1 }));
}

#[tokio::test(start_paused = true)]
async fn exhausts_after_max_attempts_with_delay_between() {
    let policy = RetryPolicy::new(3, Duration::from_secs(10));
    let calls = AtomicU32::new(0);
    let start = tokio::time::Instant::now();

    let outcome = policy
        .run(
            |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>("transient".to_owned()) }
            },
            |_| false,
        )
        .await;

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert!(matches!(outcome, RetryOutcome::Exhausted { attempts: 3, .. }));
    assert_eq!(start.elapsed(), Duration::from_secs(20));
}

#[tokio::test(start_paused = true)]
async fn terminal_error_short_circuits() {
    let policy = RetryPolicy::new(5, Duration::from_secs(10));
    let start = tokio::time::Instant::now();
    let outcome = policy
        .run(|_| async { Err::<(), _>("sign in".to_owned()) }, |e: &String| e.contains("sign"))
        .await;
    assert!(matches!(outcome, RetryOutcome::Terminal { attempts: 1, .. }));
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn succeeds_on_later_attempt() {
    let policy = RetryPolicy::new(3, Duration::from_secs(1));
    let outcome = policy
        .run(
            |attempt| async move {
                if attempt < 3 {
                    Err("not yet".to_owned())
                } else {
                    Ok(attempt)
                }
            },
            |_| false,
        )
        .await;
    assert!(matches!(outcome, RetryOutcome::Succeeded { value: 3, attempts: 3 }));
}

#[test]
fn zero_attempts_is_clamped() {
    assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts, 1);
}
