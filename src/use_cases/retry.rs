//! Optimistic-concurrency retry helper shared by every use case that loads
//! an aggregate, applies a command, and saves the result (spec.md §4.4, §9).
//!
//! Mirrors the exponential-backoff shape the Kafka listeners use
//! ([`backon::Retryable`]), but bounded to a small fixed attempt count: a
//! concurrency conflict here means another request raced us for the same
//! aggregate, not an outage worth waiting out.

use backon::{ExponentialBuilder, Retryable};
use tracing::warn;

use crate::event_sourcing::EventStoreError;

/// Implemented by each use case's error enum so [`with_optimistic_retry`] can
/// tell a retryable race from a deterministic validation failure without
/// knowing the concrete error type.
pub trait RetryClassify {
    fn is_concurrency_conflict(&self) -> bool;
}

impl RetryClassify for EventStoreError {
    fn is_concurrency_conflict(&self) -> bool {
        matches!(self, EventStoreError::ConcurrencyConflict { .. })
    }
}

/// Runs `attempt` up to `max_attempts` times, retrying only when the error
/// classifies as a concurrency conflict. Every retry re-runs `attempt` in
/// full, so it must re-load the aggregate and recompute its pre-command
/// version itself — a stale version is exactly what caused the conflict in
/// the first place (spec.md §9).
pub async fn with_optimistic_retry<T, E, F, Fut>(max_attempts: usize, attempt: F) -> Result<T, E>
where
    E: RetryClassify,
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut builder = ExponentialBuilder::default().with_max_times(max_attempts.saturating_sub(1));
    builder = builder.with_jitter();

    (|| attempt())
        .retry(builder)
        .when(RetryClassify::is_concurrency_conflict)
        .notify(|err, dur| {
            if err.is_concurrency_conflict() {
                warn!(?dur, "retrying after optimistic concurrency conflict");
            }
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn retries_until_conflict_clears() {
        let attempts = AtomicUsize::new(0);
        let result = with_optimistic_retry(3, || async {
            let count = attempts.fetch_add(1, Ordering::SeqCst);
            if count < 2 {
                Err(EventStoreError::ConcurrencyConflict {
                    expected: 1,
                    actual: 2,
                })
            } else {
                Ok(42)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let attempts = AtomicUsize::new(0);
        let result: Result<(), EventStoreError> = with_optimistic_retry(3, || async {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err(EventStoreError::ConcurrencyConflict {
                expected: 1,
                actual: 2,
            })
        })
        .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }
}
