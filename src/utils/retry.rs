use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Exponential backoff settings for [`retry`].
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
    pub backoff: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(1),
            backoff: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration, backoff: f64) -> Self {
        Self {
            max_attempts,
            delay,
            backoff,
        }
    }

    fn next_delay(&self, current: Duration) -> Duration {
        Duration::try_from_secs_f64(current.as_secs_f64() * self.backoff).unwrap_or(current)
    }
}

/// Runs `op` until it succeeds or `max_attempts` is reached, sleeping between attempts.
pub async fn retry<T, E, F, Fut>(policy: &RetryPolicy, op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    retry_if(policy, |_| true, op).await
}

/// Like [`retry`], but errors rejected by `should_retry` are returned immediately.
pub async fn retry_if<T, E, F, Fut, P>(
    policy: &RetryPolicy,
    mut should_retry: P,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: FnMut(&E) -> bool,
    E: Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut delay = policy.delay;
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if !should_retry(&e) => {
                debug!("Attempt {}/{} failed with non-retryable error: {}", attempt, max_attempts, e);
                return Err(e);
            }
            Err(e) if attempt >= max_attempts => {
                error!("Failed after {} attempts: {}", max_attempts, e);
                return Err(e);
            }
            Err(e) => {
                warn!(
                    "Attempt {}/{} failed: {}. Retrying in {:.1}s...",
                    attempt,
                    max_attempts,
                    e,
                    delay.as_secs_f64()
                );
                tokio::time::sleep(delay).await;
                delay = policy.next_delay(delay);
                attempt += 1;
            }
        }
    }
}
