//! Bounded exponential backoff for provider and delivery calls.
//!
//! Retries happen inside a single logical HTTP call; the pipeline never
//! retries at the orchestration level. A 429 response overrides the
//! backoff schedule with the server-provided `Retry-After` wait.

use std::future::Future;
use std::time::Duration;

use crate::error::AppError;

/// Exponential backoff policy: base delay doubling per attempt, capped.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Provider page fetches: 3 attempts, 2s → 4s, capped at 30s.
    pub fn fetch() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(30),
        }
    }

    /// Ingest delivery calls: 3 attempts, 2s → 4s, capped at 60s.
    pub fn ingest() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(60),
        }
    }

    /// Backoff delay after a given attempt number (1-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let delay = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(exponent));
        delay.min(self.max_delay)
    }
}

/// Run `op` until it succeeds, the error stops being retryable per
/// `should_retry`, or the attempt budget is exhausted.
pub async fn retry<T, F, Fut, P>(
    policy: &RetryPolicy,
    should_retry: P,
    mut op: F,
) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
    P: Fn(&AppError) -> bool,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < policy.max_attempts && should_retry(&e) => {
                let wait = match &e {
                    AppError::RateLimited { retry_after_secs } => {
                        Duration::from_secs(*retry_after_secs)
                    }
                    _ => policy.delay_for_attempt(attempt),
                };
                tracing::warn!(
                    error = %e,
                    attempt,
                    wait_secs = wait.as_secs(),
                    "Transient failure, retrying"
                );
                tokio::time::sleep(wait).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
