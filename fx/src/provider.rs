//! Rate provider trait and the HTTP implementation.

use std::time::Duration;

use async_trait::async_trait;
use remitfx_common::{RateOrigin, RateSnapshot};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{FxError, FxResult};

/// Trait for FX rate sources.
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Get the provider name.
    fn name(&self) -> &str;

    /// Fetch the current rates.
    ///
    /// Fails with [`FxError::RemoteUnavailable`] when the source cannot be
    /// reached or its answer cannot be used.
    async fn fetch_rates(&self) -> FxResult<RateSnapshot>;
}

/// One element of the remote payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RateRecord {
    #[serde(rename = "USD", default)]
    pub usd: Option<Value>,
    #[serde(rename = "GBP", default)]
    pub gbp: Option<Value>,
    #[serde(rename = "ZAR", default)]
    pub zar: Option<Value>,
}

/// Rates collected from a full pass over the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordScan {
    pub usd: Decimal,
    pub gbp: Decimal,
    pub zar: Decimal,
}

impl Default for RecordScan {
    fn default() -> Self {
        Self {
            usd: Decimal::ONE,
            gbp: Decimal::new(74, 2),
            zar: Decimal::new(1775, 2),
        }
    }
}

impl RecordScan {
    /// Build a remote snapshot captured now.
    pub fn into_snapshot(self) -> RateSnapshot {
        RateSnapshot::new(self.gbp, self.zar, RateOrigin::Remote)
    }
}

/// Scan every record, keeping the last present value for each currency.
///
/// Fields never present in any record keep their defaults.
pub fn scan_records(records: &[RateRecord]) -> RecordScan {
    let mut scan = RecordScan::default();

    for record in records {
        if let Some(usd) = present_rate(&record.usd) {
            scan.usd = usd;
        }
        if let Some(gbp) = present_rate(&record.gbp) {
            scan.gbp = gbp;
        }
        if let Some(zar) = present_rate(&record.zar) {
            scan.zar = zar;
        }
    }

    scan
}

/// Largest rate accepted from the remote source.
///
/// Anything above this is treated as absent so that payout arithmetic on a
/// validated amount cannot overflow.
pub const MAX_REMOTE_RATE: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

/// A field is present when it holds a positive JSON number no larger than
/// [`MAX_REMOTE_RATE`].
fn present_rate(value: &Option<Value>) -> Option<Decimal> {
    match value {
        Some(Value::Number(n)) => {
            let text = n.to_string();
            let parsed = if text.contains(['e', 'E']) {
                Decimal::from_scientific(&text).ok()
            } else {
                text.parse::<Decimal>().ok()
            };
            parsed.filter(|rate| *rate > Decimal::ZERO && *rate <= MAX_REMOTE_RATE)
        }
        _ => None,
    }
}

/// Parse a raw payload body.
///
/// The body must be a JSON array. Object elements are scanned as records,
/// any other element carries no fields and is skipped. A `null` element
/// makes the whole payload unusable.
pub fn parse_payload(body: &[u8]) -> FxResult<RecordScan> {
    let elements: Vec<Value> = serde_json::from_slice(body)
        .map_err(|e| FxError::RemoteUnavailable(format!("Malformed rates payload: {}", e)))?;

    let mut records = Vec::with_capacity(elements.len());
    for (index, element) in elements.into_iter().enumerate() {
        match element {
            Value::Null => {
                return Err(FxError::RemoteUnavailable(format!(
                    "Malformed rates payload: null record at index {}",
                    index
                )));
            }
            Value::Object(_) => {
                let record: RateRecord = serde_json::from_value(element).map_err(|e| {
                    FxError::RemoteUnavailable(format!("Malformed rates payload: {}", e))
                })?;
                records.push(record);
            }
            _ => {}
        }
    }

    Ok(scan_records(&records))
}

/// Fetches rates from a JSON endpoint over HTTP.
pub struct HttpRateProvider {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpRateProvider {
    /// Create a provider for `endpoint` with a per-request timeout.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> FxResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FxError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl RateProvider for HttpRateProvider {
    fn name(&self) -> &str {
        "HTTP"
    }

    async fn fetch_rates(&self) -> FxResult<RateSnapshot> {
        let response = self.client.get(&self.endpoint).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FxError::RemoteUnavailable(format!("HTTP {}", status)));
        }

        let body = response.bytes().await?;
        let scan = parse_payload(&body)?;

        debug!(
            endpoint = %self.endpoint,
            usd = %scan.usd,
            gbp = %scan.gbp,
            zar = %scan.zar,
            "Parsed remote rates"
        );

        Ok(scan.into_snapshot())
    }
}

/// Mock rate provider for testing.
#[cfg(any(test, feature = "test-utils"))]
pub struct MockRateProvider {
    name: String,
    rates: parking_lot::Mutex<(Decimal, Decimal)>,
    failures_remaining: std::sync::atomic::AtomicUsize,
    always_fail: std::sync::atomic::AtomicBool,
    delay: Duration,
    calls: std::sync::atomic::AtomicUsize,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockRateProvider {
    /// Create a provider that answers with the given rates.
    pub fn new(name: impl Into<String>, usd_to_gbp: Decimal, usd_to_zar: Decimal) -> Self {
        Self {
            name: name.into(),
            rates: parking_lot::Mutex::new((usd_to_gbp, usd_to_zar)),
            failures_remaining: std::sync::atomic::AtomicUsize::new(0),
            always_fail: std::sync::atomic::AtomicBool::new(false),
            delay: Duration::ZERO,
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Create a provider that never answers.
    pub fn unavailable(name: impl Into<String>) -> Self {
        let provider = Self::new(name, Decimal::ZERO, Decimal::ZERO);
        provider.set_always_fail(true);
        provider
    }

    /// Delay every call by `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Fail the next `count` calls.
    pub fn fail_next(&self, count: usize) {
        self.failures_remaining
            .store(count, std::sync::atomic::Ordering::SeqCst);
    }

    /// Fail every call until switched off.
    pub fn set_always_fail(&self, fail: bool) {
        self.always_fail
            .store(fail, std::sync::atomic::Ordering::SeqCst);
    }

    /// Change the rates returned by subsequent calls.
    pub fn set_rates(&self, usd_to_gbp: Decimal, usd_to_zar: Decimal) {
        *self.rates.lock() = (usd_to_gbp, usd_to_zar);
    }

    /// Number of `fetch_rates` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl RateProvider for MockRateProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_rates(&self) -> FxResult<RateSnapshot> {
        use std::sync::atomic::Ordering;

        self.calls.fetch_add(1, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if self.always_fail.load(Ordering::SeqCst) {
            return Err(FxError::RemoteUnavailable("mock unavailable".to_string()));
        }

        let scripted_failure = self
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if scripted_failure {
            return Err(FxError::RemoteUnavailable("mock scripted failure".to_string()));
        }

        let (gbp, zar) = *self.rates.lock();
        Ok(RateSnapshot::new(gbp, zar, RateOrigin::Remote))
    }
}
