/// Caller-side retry with exponential backoff
use serde::Deserialize;
use shelf_client::{ClientError, Result};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, Deserialize)]
pub struct RetrySettings {
    /// Total attempts including the first one
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl RetrySettings {
    /// Settings that never retry.
    pub fn once() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay before attempt `attempt + 1`, doubling from the initial delay.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
        let delay = self.initial_delay_ms.saturating_mul(factor);
        Duration::from_millis(delay.min(self.max_delay_ms))
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    1_000
}

fn default_max_delay_ms() -> u64 {
    8_000
}

/// Errors worth another try: the backend was unreachable, slow, or failing.
pub fn is_retryable(err: &ClientError) -> bool {
    err.is_connectivity() || err.http_status() >= 500
}

/// Run `operation`, retrying transient failures.
pub async fn with_backoff<T, F, Fut>(settings: &RetrySettings, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 1;
    loop {
        match operation().await {
            Err(e) if attempt < settings.max_attempts && is_retryable(&e) => {
                let delay = settings.delay_for(attempt);
                warn!(
                    attempt,
                    max_attempts = settings.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Request failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            result => return result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_delays_double_and_cap() {
        let settings = RetrySettings::default();
        assert_eq!(settings.delay_for(1), Duration::from_secs(1));
        assert_eq!(settings.delay_for(2), Duration::from_secs(2));
        assert_eq!(settings.delay_for(3), Duration::from_secs(4));
        assert_eq!(settings.delay_for(10), Duration::from_secs(8));
    }

    #[test]
    fn test_retryable_errors() {
        assert!(is_retryable(&ClientError::Timeout));
        assert!(is_retryable(&ClientError::Network("refused".into())));
        assert!(!is_retryable(&ClientError::NotLoggedIn));
        assert!(!is_retryable(&ClientError::Unsupported("pool_reset")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_until_success() {
        let calls = AtomicU32::new(0);

        let result = with_backoff(&RetrySettings::default(), || async {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(ClientError::Timeout)
            } else {
                Ok("done")
            }
        })
        .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);

        let result: Result<()> = with_backoff(&RetrySettings::default(), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(ClientError::Network("refused".into()))
        })
        .await;

        assert!(result.unwrap_err().is_connectivity());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_does_not_retry_client_errors() {
        let calls = AtomicU32::new(0);

        let result: Result<()> = with_backoff(&RetrySettings::default(), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(ClientError::NotLoggedIn)
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_once_never_retries() {
        let calls = AtomicU32::new(0);

        let result: Result<()> = with_backoff(&RetrySettings::once(), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(ClientError::Timeout)
        })
        .await;

        assert!(result.unwrap_err().is_timeout());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
