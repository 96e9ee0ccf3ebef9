// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::future::Future;
use tokio::time::{sleep, Duration};
use tracing::info;

pub const RETRY_MAX_ATTEMPTS: u32 = 3;
pub const RETRY_INITIAL_DELAY_MS: u64 = 2000;

fn should_retry_error(error: &str, retry_on_errors: &[&str]) -> bool {
    if retry_on_errors.is_empty() {
        return true;
    }
    retry_on_errors.iter().any(|code| error.contains(code))
}

/// Run a read-only call, retrying failed attempts with exponential backoff.
///
/// An empty `retry_on_errors` retries every error. Otherwise only errors whose message contains
/// one of the given fragments are retried. Never use this for transactions.
pub async fn call_with_retry<F, Fut, T>(
    operation_name: &str,
    retry_on_errors: &[&str],
    read_fn: F,
) -> eyre::Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = eyre::Result<T>>,
{
    let mut attempts = 0;
    let mut delay = RETRY_INITIAL_DELAY_MS;

    loop {
        attempts += 1;
        match read_fn().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                let error_str = e.to_string();
                if should_retry_error(&error_str, retry_on_errors) && attempts < RETRY_MAX_ATTEMPTS
                {
                    info!(
                        "{}: error (attempt {}/{}), will retry after {}ms: {}",
                        operation_name, attempts, RETRY_MAX_ATTEMPTS, delay, e
                    );
                    sleep(Duration::from_millis(delay)).await;
                    delay *= 2;
                } else {
                    return Err(e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_retries_until_success() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let started = tokio::time::Instant::now();

        let value = call_with_retry("flaky", &[], move || async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                eyre::bail!("connection reset");
            }
            Ok(7)
        })
        .await
        .unwrap();

        assert_eq!(value, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // 2s then 4s of backoff
        assert!(started.elapsed() >= Duration::from_millis(6000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_attempts() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: eyre::Result<()> = call_with_retry("down", &[], move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            eyre::bail!("node unreachable")
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), RETRY_MAX_ATTEMPTS);
    }

    #[tokio::test(start_paused = true)]
    async fn test_only_listed_errors_are_retried() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: eyre::Result<()> = call_with_retry("revert", &["timeout"], move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            eyre::bail!("execution reverted")
        })
        .await;

        assert_eq!(result.unwrap_err().to_string(), "execution reverted");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
