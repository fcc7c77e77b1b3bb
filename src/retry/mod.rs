use backon::{ExponentialBuilder, Retryable};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::errors::CompletionError;

/// Shared backoff policy applied around completion calls by their callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: usize,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub jitter: bool,
    #[serde(skip, default = "default_predicate")]
    pub retry_if: fn(&CompletionError) -> bool,
}

fn default_predicate() -> fn(&CompletionError) -> bool {
    CompletionError::is_transient
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1_000,
            max_delay_ms: 8_000,
            jitter: false,
            retry_if: default_predicate(),
        }
    }
}

impl RetryPolicy {
    /// A single attempt, no waiting.
    pub fn disabled() -> Self {
        Self { max_attempts: 1, ..Self::default() }
    }

    fn backoff(&self) -> ExponentialBuilder {
        let builder = ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(self.base_delay_ms))
            .with_max_delay(Duration::from_millis(self.max_delay_ms))
            .with_factor(2.0)
            .with_max_times(self.max_attempts.saturating_sub(1));
        if self.jitter {
            builder.with_jitter()
        } else {
            builder
        }
    }

    pub async fn run<T, F, Fut>(&self, label: &str, op: F) -> Result<T, CompletionError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CompletionError>>,
    {
        let retry_if = self.retry_if;
        op.retry(self.backoff())
            .when(move |e: &CompletionError| retry_if(e))
            .notify(|e, dur| {
                warn!("{label} failed, retrying after {:.2}s: {e}", dur.as_secs_f64());
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fast(max_attempts: usize) -> RetryPolicy {
        RetryPolicy { max_attempts, base_delay_ms: 1, max_delay_ms: 4, ..RetryPolicy::default() }
    }

    #[tokio::test]
    async fn transient_errors_are_retried_up_to_the_limit() {
        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let res: Result<(), _> = fast(3)
            .run("test call", move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(CompletionError::RateLimited)
            })
            .await;
        assert_eq!(res, Err(CompletionError::RateLimited));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn permanent_errors_stop_immediately() {
        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let res: Result<(), _> = fast(3)
            .run("test call", move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(CompletionError::InvalidCredential)
            })
            .await;
        assert_eq!(res, Err(CompletionError::InvalidCredential));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn recovers_after_a_transient_failure() {
        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let res = fast(3)
            .run("test call", move || async move {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(CompletionError::ServerError(502))
                } else {
                    Ok("done")
                }
            })
            .await;
        assert_eq!(res, Ok("done"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn disabled_policy_makes_one_attempt() {
        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let _: Result<(), _> = RetryPolicy::disabled()
            .run("test call", move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(CompletionError::Timeout(1))
            })
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn config_overrides_keep_the_default_predicate() {
        let p: RetryPolicy = toml::from_str("max_attempts = 5\njitter = true").unwrap();
        assert_eq!(p.max_attempts, 5);
        assert_eq!(p.base_delay_ms, 1_000);
        assert!((p.retry_if)(&CompletionError::Timeout(1)));
    }
}
