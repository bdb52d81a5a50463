//! RemitFX rate engine
//!
//! Acquires USD exchange rates from an unreliable remote source, shields
//! callers from that source with caching and request coalescing, and computes
//! the fee and payout for a transfer.
//!
//! # Features
//!
//! - Remote JSON rate source with linear-backoff retries
//! - Synthetic fallback rates so rate requests never fail
//! - Freshness-window cache with explicit invalidation
//! - One in-flight fetch shared by all concurrent callers
//! - Cent-exact fee and payout arithmetic that always rounds up
//!
//! # Example
//!
//! ```rust,ignore
//! use remitfx_fx::{convert, FxEngine, FxEngineConfig};
//! use remitfx_common::PayoutCurrency;
//! use rust_decimal_macros::dec;
//!
//! let engine = FxEngine::with_http(FxEngineConfig::from_env())?;
//!
//! let rates = engine.get_rates().await;
//! let breakdown = convert(dec!(100), PayoutCurrency::Gbp, &rates);
//! ```

pub mod cache;
pub mod config;
pub mod conversion;
pub mod engine;
pub mod error;
pub mod fallback;
pub mod metrics;
pub mod provider;
pub mod retry;

pub use cache::RateCache;
pub use config::FxEngineConfig;
pub use conversion::{convert, validate_amount, AmountLimits, ConversionResult};
pub use engine::{FxEngine, FxEngineStats, Quote};
pub use error::{FxError, FxResult};
pub use fallback::SyntheticRates;
pub use metrics::Metrics;
pub use provider::{HttpRateProvider, RateProvider};
pub use retry::{fetch_rates_with_retry, RetryPolicy};
