//! Rate coordinator: cache, request coalescing and quoting.

use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use remitfx_common::time::Timestamp;
use remitfx_common::{PayoutCurrency, RateSnapshot};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, error, info, instrument};

use crate::cache::RateCache;
use crate::config::FxEngineConfig;
use crate::conversion::{convert, ConversionResult};
use crate::error::FxResult;
use crate::metrics::{Metrics, MetricsSnapshot};
use crate::provider::{HttpRateProvider, RateProvider};
use crate::retry::fetch_rates_with_retry;

type PendingFuture = Shared<BoxFuture<'static, Arc<RateSnapshot>>>;

/// The single fetch in flight, if any.
#[derive(Clone)]
struct PendingFetch {
    seq: u64,
    future: PendingFuture,
}

/// Cache slot and in-flight token, guarded together.
struct RateState {
    cache: RateCache,
    pending: Option<PendingFetch>,
    next_seq: u64,
}

struct EngineInner {
    provider: Arc<dyn RateProvider>,
    config: FxEngineConfig,
    state: Mutex<RateState>,
    metrics: Metrics,
}

impl EngineInner {
    /// Install a fetched snapshot and release the token it was fetched under.
    fn install(&self, seq: u64, snapshot: Arc<RateSnapshot>) {
        let mut state = self.state.lock();
        state.cache.insert(snapshot);
        Self::release(&mut state, seq);
    }

    fn release(state: &mut RateState, seq: u64) {
        if state.pending.as_ref().map(|p| p.seq) == Some(seq) {
            state.pending = None;
        }
    }
}

/// Clears the in-flight token when the fetch task ends, panics included.
struct PendingGuard {
    inner: Arc<EngineInner>,
    seq: u64,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        let mut state = self.inner.state.lock();
        EngineInner::release(&mut state, self.seq);
    }
}

/// A validated amount priced against a snapshot.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub amount_usd: Decimal,
    pub currency: PayoutCurrency,
    pub rates: Arc<RateSnapshot>,
    pub result: ConversionResult,
}

/// Engine statistics.
#[derive(Debug, Clone)]
pub struct FxEngineStats {
    pub metrics: MetricsSnapshot,
    pub cache_valid: bool,
    pub fetch_in_flight: bool,
    pub last_fetched_at: Option<Timestamp>,
}

/// Owns the current rates.
///
/// Serves fresh cached rates, otherwise starts or joins the single fetch in
/// flight. Cloning gives another handle to the same state; the state lives
/// until the last handle is dropped and is reset only by [`invalidate`].
///
/// [`invalidate`]: FxEngine::invalidate
#[derive(Clone)]
pub struct FxEngine {
    inner: Arc<EngineInner>,
}

impl FxEngine {
    /// Create a new FX engine with the given provider.
    pub fn new(provider: Arc<dyn RateProvider>, config: FxEngineConfig) -> Self {
        let cache = RateCache::new(config.cache_ttl);
        Self {
            inner: Arc::new(EngineInner {
                provider,
                config,
                state: Mutex::new(RateState {
                    cache,
                    pending: None,
                    next_seq: 0,
                }),
                metrics: Metrics::new(),
            }),
        }
    }

    /// Create an engine reading from the configured HTTP endpoint.
    pub fn with_http(config: FxEngineConfig) -> FxResult<Self> {
        let provider = HttpRateProvider::new(config.endpoint.clone(), config.request_timeout)?;
        Ok(Self::new(Arc::new(provider), config))
    }

    /// Get the current rates.
    ///
    /// Returns immediately on a fresh cache entry. Otherwise joins the fetch in
    /// flight or starts one; concurrent callers share one fetch and receive the
    /// same snapshot. Never fails: the fetch ends in synthetic rates when the
    /// remote source stays down.
    pub async fn get_rates(&self) -> Arc<RateSnapshot> {
        self.inner.metrics.rate_requested();

        let pending = {
            let mut state = self.inner.state.lock();

            if let Some(snapshot) = state.cache.get() {
                self.inner.metrics.cache_hit();
                return snapshot;
            }

            if let Some(pending) = state.pending.clone() {
                debug!(seq = pending.seq, "Joining in-flight rate fetch");
                self.inner.metrics.coalesced_wait();
                pending.future
            } else {
                let pending = self.start_fetch(&mut state);
                let future = pending.future.clone();
                state.pending = Some(pending);
                future
            }
        };

        pending.await
    }

    /// Spawn the fetch task. Called with the state lock held, so the task
    /// cannot release its token before the token is stored.
    fn start_fetch(&self, state: &mut RateState) -> PendingFetch {
        state.next_seq += 1;
        let seq = state.next_seq;
        self.inner.metrics.fetch_started();
        debug!(seq, "Starting rate fetch");

        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move {
            let guard = PendingGuard {
                inner: Arc::clone(&inner),
                seq,
            };
            let snapshot = Arc::new(Self::fetch(&inner).await);

            info!(
                seq,
                origin = %snapshot.origin,
                usd_to_gbp = %snapshot.usd_to_gbp,
                usd_to_zar = %snapshot.usd_to_zar,
                "Installing FX rates"
            );
            inner.install(seq, Arc::clone(&snapshot));
            drop(guard);

            snapshot
        });

        let synthetic = self.inner.config.synthetic.clone();
        let future = async move {
            match handle.await {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    error!(seq, error = %e, "Rate fetch task failed");
                    Arc::new(synthetic.generate())
                }
            }
        }
        .boxed()
        .shared();

        PendingFetch { seq, future }
    }

    #[instrument(skip(inner), fields(provider = inner.provider.name()))]
    async fn fetch(inner: &EngineInner) -> RateSnapshot {
        fetch_rates_with_retry(
            inner.provider.as_ref(),
            &inner.config.retry,
            &inner.config.synthetic,
            inner.config.fallback_delay,
            &inner.metrics,
        )
        .await
    }

    /// The cached snapshot if still fresh, without waiting.
    pub fn peek_cached(&self) -> Option<Arc<RateSnapshot>> {
        self.inner.state.lock().cache.get()
    }

    /// When the current cache entry was installed, fresh or not.
    pub fn last_fetched_at(&self) -> Option<Timestamp> {
        self.inner.state.lock().cache.fetched_at()
    }

    /// Drop the cached rates so the next `get_rates` fetches again.
    ///
    /// A fetch already in flight is not cancelled; it installs its result
    /// when it settles.
    pub fn invalidate(&self) {
        self.inner.state.lock().cache.clear();
        self.inner.metrics.invalidated();
        debug!("FX rate cache invalidated");
    }

    /// Validate an amount, get rates and compute the breakdown.
    pub async fn quote(&self, amount_usd: Decimal, currency: PayoutCurrency) -> FxResult<Quote> {
        self.inner.config.limits.validate(amount_usd)?;

        let rates = self.get_rates().await;
        let result = convert(amount_usd, currency, &rates);

        debug!(
            amount = %amount_usd,
            currency = %currency,
            fee = %result.fee,
            received = %result.total_received,
            "Quoted transfer"
        );

        Ok(Quote {
            amount_usd,
            currency,
            rates,
            result,
        })
    }

    /// Engine configuration.
    pub fn config(&self) -> &FxEngineConfig {
        &self.inner.config
    }

    /// Engine counters.
    pub fn metrics(&self) -> &Metrics {
        &self.inner.metrics
    }

    /// Get engine statistics.
    pub fn stats(&self) -> FxEngineStats {
        let state = self.inner.state.lock();
        FxEngineStats {
            metrics: self.inner.metrics.snapshot(),
            cache_valid: state.cache.is_valid(),
            fetch_in_flight: state.pending.is_some(),
            last_fetched_at: state.cache.fetched_at(),
        }
    }
}
