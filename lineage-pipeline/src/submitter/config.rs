use std::time::Duration;

use crate::errors::PipelineError;

/// Exponential backoff between attempts on transient errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; a row gets at most `max_retries + 1` calls.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Ceiling for any single delay, including server-provided hints.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Delay before the given retry (1-based).
    ///
    /// A `Retry-After` hint from the server replaces the computed delay; both
    /// are capped at `max_delay`.
    pub fn delay_for(&self, retry: u32, hint: Option<Duration>) -> Duration {
        if let Some(hint) = hint {
            return hint.min(self.max_delay);
        }
        let exponent = retry.saturating_sub(1).min(31);
        self.base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }
}

/// Configuration for [`BatchSubmitter`](super::BatchSubmitter).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitterConfig {
    /// Maximum remote calls in flight at once.
    pub max_concurrency: usize,
    /// Relationships per call. 1 submits each with `create`; more uses
    /// `bulk_create` on chunks of this size.
    pub chunk_size: usize,
    /// Upper bound on a single remote call; exceeding it counts as a timeout.
    pub call_timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for SubmitterConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 8,
            chunk_size: 1,
            call_timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }
}

impl SubmitterConfig {
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn is_bulk(&self) -> bool {
        self.chunk_size > 1
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.max_concurrency == 0 {
            return Err(PipelineError::config("max_concurrency must be at least 1"));
        }
        if self.chunk_size == 0 {
            return Err(PipelineError::config("chunk_size must be at least 1"));
        }
        if self.call_timeout.is_zero() {
            return Err(PipelineError::config("call_timeout must be greater than zero"));
        }
        if self.retry.base_delay > self.retry.max_delay {
            return Err(PipelineError::config(
                "retry base delay must not exceed the max delay",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_doubles_and_caps() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.delay_for(1, None), Duration::from_millis(200));
        assert_eq!(policy.delay_for(2, None), Duration::from_millis(400));
        assert_eq!(policy.delay_for(3, None), Duration::from_millis(800));
        assert_eq!(policy.delay_for(10, None), Duration::from_secs(5));
        assert_eq!(policy.delay_for(u32::MAX, None), Duration::from_secs(5));
    }

    #[test]
    fn test_retry_after_hint_is_capped() {
        let policy = RetryPolicy::default();

        assert_eq!(
            policy.delay_for(1, Some(Duration::from_secs(2))),
            Duration::from_secs(2)
        );
        assert_eq!(
            policy.delay_for(1, Some(Duration::from_secs(60))),
            Duration::from_secs(5)
        );
    }

    #[test]
    fn test_validate() {
        assert!(SubmitterConfig::default().validate().is_ok());
        assert!(!SubmitterConfig::default().is_bulk());
        assert!(SubmitterConfig::default().with_chunk_size(50).is_bulk());

        for bad in [
            SubmitterConfig::default().with_chunk_size(0),
            SubmitterConfig::default().with_max_concurrency(0),
            SubmitterConfig::default().with_call_timeout(Duration::ZERO),
        ] {
            assert!(matches!(bad.validate(), Err(PipelineError::ConfigError(_))));
        }
    }
}
