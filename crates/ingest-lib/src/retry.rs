//! Reusable retry policy with exponential backoff
//!
//! The same typed policy is applied at the two I/O layers of a run: the feed
//! fetch and the sink write. An error decides for itself whether a retry can
//! help via the [`Retryable`] trait; non-retryable errors (a malformed
//! document, say) return immediately.

use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Retry policy: attempt budget plus exponential backoff parameters
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first
    pub max_attempts: u32,
    /// Backoff before the second attempt; doubles on each further attempt
    pub initial_backoff: Duration,
    /// Optional ceiling on the backoff
    pub max_backoff: Option<Duration>,
}

impl RetryPolicy {
    /// Policy for transport-level calls: 3 attempts, 2s backoff capped at 30s
    pub fn transport() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(2),
            max_backoff: Some(Duration::from_secs(30)),
        }
    }

    /// Policy for the sink's partial-failure loop: 5 attempts, 1s backoff, no cap
    pub fn sink_write() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_secs(1),
            max_backoff: None,
        }
    }

    /// Backoff to sleep after the given zero-based failed attempt
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let backoff = self
            .initial_backoff
            .saturating_mul(2u32.saturating_pow(attempt));
        match self.max_backoff {
            Some(cap) => backoff.min(cap),
            None => backoff,
        }
    }
}

/// Errors that know whether retrying can help
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

/// Run an operation under a retry policy
///
/// Retries only while the error is retryable and the attempt budget allows,
/// sleeping the policy's backoff between attempts. The last error is returned
/// once the budget is exhausted.
pub async fn retry_with_backoff<T, E, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    mut op: F,
) -> Result<T, E>
where
    E: Retryable + std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 0u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt + 1 < policy.max_attempts => {
                let backoff = policy.backoff_for(attempt);
                warn!(
                    operation = operation,
                    attempt = attempt + 1,
                    backoff_secs = backoff.as_secs(),
                    error = %err,
                    "Operation failed, retrying"
                );
                tokio::time::sleep(backoff).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
