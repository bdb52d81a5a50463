//! FX engine configuration.

use std::time::Duration;

use remitfx_common::time::constants;
use rust_decimal::Decimal;

use crate::conversion::AmountLimits;
use crate::fallback::SyntheticRates;
use crate::retry::RetryPolicy;

/// Default remote rate endpoint.
pub const DEFAULT_RATES_URL: &str =
    "https://68976304250b078c2041c7fc.mockapi.io/api/wiremit/InterviewAPIS";

/// Main FX engine configuration.
#[derive(Debug, Clone)]
pub struct FxEngineConfig {
    /// Remote JSON endpoint.
    pub endpoint: String,
    /// Timeout for a single remote request.
    pub request_timeout: Duration,
    /// Freshness window for cached rates.
    pub cache_ttl: chrono::Duration,
    /// Retry policy for remote fetches.
    pub retry: RetryPolicy,
    /// Pause before synthetic rates are handed out.
    pub fallback_delay: Duration,
    /// Synthetic rate generator used when the remote source is down.
    pub synthetic: SyntheticRates,
    /// Accepted transfer amounts in USD.
    pub limits: AmountLimits,
}

impl Default for FxEngineConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_RATES_URL.to_string(),
            request_timeout: Duration::from_secs(10),
            cache_ttl: constants::rates_freshness_window(),
            retry: RetryPolicy::default(),
            fallback_delay: Duration::from_millis(1000),
            synthetic: SyntheticRates::default(),
            limits: AmountLimits::default(),
        }
    }
}

impl FxEngineConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("FX_RATES_URL") {
            config.endpoint = url;
        }

        if let Some(ms) = env_u64("FX_REQUEST_TIMEOUT_MS") {
            config.request_timeout = Duration::from_millis(ms);
        }

        if let Some(secs) = env_u64("FX_CACHE_TTL_SECS") {
            if let Ok(secs) = i64::try_from(secs) {
                config.cache_ttl = chrono::Duration::seconds(secs);
            }
        }

        if let Some(retries) = env_u64("FX_MAX_RETRIES") {
            if let Ok(retries) = u32::try_from(retries) {
                config.retry.max_retries = retries;
            }
        }

        if let Some(ms) = env_u64("FX_RETRY_DELAY_MS") {
            config.retry.base_delay = Duration::from_millis(ms);
        }

        if let Some(ms) = env_u64("FX_FALLBACK_DELAY_MS") {
            config.fallback_delay = Duration::from_millis(ms);
        }

        config
    }

    /// Override the remote endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.endpoint.trim().is_empty() {
            return Err("Rates endpoint cannot be empty".to_string());
        }

        if self.cache_ttl <= chrono::Duration::zero() {
            return Err("Cache TTL must be positive".to_string());
        }

        if self.request_timeout.is_zero() {
            return Err("Request timeout must be positive".to_string());
        }

        if self.synthetic.usd_to_gbp <= Decimal::ZERO || self.synthetic.usd_to_zar <= Decimal::ZERO {
            return Err("Synthetic base rates must be positive".to_string());
        }

        if self.limits.min > self.limits.max {
            return Err("Minimum amount cannot exceed maximum amount".to_string());
        }

        Ok(())
    }
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
