//! Remote fetch with linear backoff and synthetic fallback.

use std::time::Duration;

use remitfx_common::RateSnapshot;
use tracing::{debug, error, warn};

use crate::fallback::SyntheticRates;
use crate::metrics::Metrics;
use crate::provider::RateProvider;

/// How often and how patiently to retry the remote source.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Backoff unit; the wait after attempt `n` is `base_delay * (n + 1)`.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    /// Wait after failed attempt `attempt` (zero based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt.saturating_add(1))
    }

    /// Upper bound on remote attempts in one sequence.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

/// Fetch rates, retrying the provider before falling back to synthetic rates.
///
/// Never fails: once `policy.max_retries` retries are spent, waits
/// `fallback_delay` and returns a snapshot from `synthetic`.
pub async fn fetch_rates_with_retry(
    provider: &dyn RateProvider,
    policy: &RetryPolicy,
    synthetic: &SyntheticRates,
    fallback_delay: Duration,
    metrics: &Metrics,
) -> RateSnapshot {
    let mut attempt: u32 = 0;

    loop {
        match provider.fetch_rates().await {
            Ok(snapshot) => {
                metrics.remote_attempt(true);
                debug!(
                    provider = provider.name(),
                    attempt = attempt + 1,
                    "Remote rates fetched"
                );
                return snapshot;
            }
            Err(e) => {
                metrics.remote_attempt(false);

                if !e.is_retryable() || attempt + 1 >= policy.max_attempts() {
                    error!(
                        provider = provider.name(),
                        attempts = attempt + 1,
                        error = %e,
                        "Falling back to synthetic FX rates"
                    );
                    break;
                }

                let delay = policy.delay_for(attempt);
                warn!(
                    provider = provider.name(),
                    attempt = attempt + 1,
                    max_attempts = policy.max_attempts(),
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "FX rates fetch failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }

    if !fallback_delay.is_zero() {
        tokio::time::sleep(fallback_delay).await;
    }

    metrics.synthetic_fallback();
    synthetic.generate()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockRateProvider;
    use remitfx_common::RateOrigin;
    use rust_decimal_macros::dec;
    use std::time::Instant;

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_millis(1),
        }
    }

    #[test]
    fn test_linear_backoff() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.delay_for(0), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(1), Duration::from_millis(2000));
        assert_eq!(policy.delay_for(2), Duration::from_millis(3000));
        assert_eq!(policy.max_attempts(), 4);
    }

    #[tokio::test]
    async fn test_first_attempt_success() {
        let provider = MockRateProvider::new("test", dec!(0.8), dec!(18.0));
        let metrics = Metrics::new();

        let snapshot = fetch_rates_with_retry(
            &provider,
            &fast_policy(),
            &SyntheticRates::default(),
            Duration::ZERO,
            &metrics,
        )
        .await;

        assert_eq!(snapshot.usd_to_gbp, dec!(0.8));
        assert_eq!(snapshot.origin, RateOrigin::Remote);
        assert_eq!(provider.calls(), 1);
        assert_eq!(metrics.snapshot().remote_failures, 0);
    }

    #[tokio::test]
    async fn test_recovers_after_retries() {
        let provider = MockRateProvider::new("test", dec!(0.8), dec!(18.0));
        provider.fail_next(3);
        let metrics = Metrics::new();

        let snapshot = fetch_rates_with_retry(
            &provider,
            &fast_policy(),
            &SyntheticRates::default(),
            Duration::ZERO,
            &metrics,
        )
        .await;

        assert_eq!(snapshot.origin, RateOrigin::Remote);
        assert_eq!(provider.calls(), 4);
        assert_eq!(metrics.snapshot().remote_failures, 3);
        assert_eq!(metrics.snapshot().synthetic_fallbacks, 0);
    }

    #[tokio::test]
    async fn test_falls_back_after_exhausting_retries() {
        let provider = MockRateProvider::unavailable("down");
        let metrics = Metrics::new();

        let snapshot = fetch_rates_with_retry(
            &provider,
            &fast_policy(),
            &SyntheticRates::default(),
            Duration::ZERO,
            &metrics,
        )
        .await;

        assert!(snapshot.is_synthetic());
        let synthetic = SyntheticRates::default();
        assert!(snapshot.usd_to_gbp >= synthetic.lower_bound(synthetic.usd_to_gbp));
        assert!(snapshot.usd_to_gbp <= synthetic.upper_bound(synthetic.usd_to_gbp));
        assert!(snapshot.usd_to_zar >= synthetic.lower_bound(synthetic.usd_to_zar));
        assert!(snapshot.usd_to_zar <= synthetic.upper_bound(synthetic.usd_to_zar));
        assert_eq!(provider.calls(), fast_policy().max_attempts() as usize);

        let stats = metrics.snapshot();
        assert_eq!(stats.remote_attempts, 4);
        assert_eq!(stats.synthetic_fallbacks, 1);
    }

    #[tokio::test]
    async fn test_backoff_waits_between_attempts() {
        let provider = MockRateProvider::unavailable("down");
        let policy = RetryPolicy {
            max_retries: 2,
            base_delay: Duration::from_millis(20),
        };

        let started = Instant::now();
        fetch_rates_with_retry(
            &provider,
            &policy,
            &SyntheticRates::default(),
            Duration::from_millis(10),
            &Metrics::new(),
        )
        .await;

        // 20ms + 40ms of backoff plus the fallback pause
        assert!(started.elapsed() >= Duration::from_millis(70));
        assert_eq!(provider.calls(), policy.max_attempts() as usize);
    }

    #[tokio::test]
    async fn test_zero_retries_means_single_attempt() {
        let provider = MockRateProvider::unavailable("down");
        let policy = RetryPolicy {
            max_retries: 0,
            base_delay: Duration::from_millis(1),
        };

        let snapshot = fetch_rates_with_retry(
            &provider,
            &policy,
            &SyntheticRates::default(),
            Duration::ZERO,
            &Metrics::new(),
        )
        .await;

        assert!(snapshot.is_synthetic());
        assert_eq!(provider.calls(), 1);
    }
}
