//! Provider rate-limit retry for a single `generate` invocation.
//!
//! Flat schedule: retry only classified rate/quota errors, wait `backoff[i]` after the
//! i-th failure (the last delay repeats if attempts outnumber delays), give up after
//! `max_attempts`. Anything else propagates at once. Each fit-seeking iteration gets
//! its own full budget.

use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::generation::{GenerationError, ResumeGenerator};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Vec<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: vec![Duration::from_secs(2), Duration::from_secs(4)],
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Vec<Duration>) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// Delay to wait after the `attempt`-th failure (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let index = attempt.saturating_sub(1) as usize;
        self.backoff
            .get(index)
            .or_else(|| self.backoff.last())
            .copied()
            .unwrap_or(Duration::ZERO)
    }

    /// Longest one `generate` call can take when every attempt runs to `call_timeout`.
    pub fn worst_case(&self, call_timeout: Duration) -> Duration {
        (1..self.max_attempts).fold(call_timeout * self.max_attempts, |total, attempt| {
            total + self.delay_after(attempt)
        })
    }
}

/// Wraps a generator with the rate-limit retry policy.
pub struct RateLimitRetry<G> {
    inner: G,
    policy: RetryPolicy,
}

impl<G> RateLimitRetry<G> {
    pub fn new(inner: G, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl<G: ResumeGenerator> ResumeGenerator for RateLimitRetry<G> {
    async fn generate(
        &self,
        resume_text: &str,
        job_description: &str,
        shorten_hint: Option<&str>,
    ) -> Result<String, GenerationError> {
        let mut attempt = 1u32;
        loop {
            let err = match self
                .inner
                .generate(resume_text, job_description, shorten_hint)
                .await
            {
                Ok(markup) => return Ok(markup),
                Err(e) if e.is_rate_limited() => e,
                Err(e) => return Err(e),
            };

            if attempt >= self.policy.max_attempts {
                warn!(attempts = attempt, error = %err, "Generation still rate limited; giving up");
                return Err(GenerationError::ProviderBusy { attempts: attempt });
            }

            let delay = self.policy.delay_after(attempt);
            warn!(
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "Generation rate limited; backing off"
            );
            // Suspends this request's task only.
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}
