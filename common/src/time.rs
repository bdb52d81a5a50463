//! Time utilities and constants for RemitFX.

use chrono::{DateTime, Duration, Utc};

/// Rate timing constants.
pub mod constants {
    use super::Duration;

    /// How long fetched rates stay fresh (5 minutes).
    pub fn rates_freshness_window() -> Duration {
        Duration::minutes(5)
    }
}

/// A timestamp with timezone (always UTC for RemitFX).
pub type Timestamp = DateTime<Utc>;

/// Get the current timestamp.
pub fn now() -> Timestamp {
    Utc::now()
}

/// Whether `timestamp` is less than `window` old.
pub fn is_within(timestamp: Timestamp, window: Duration) -> bool {
    now().signed_duration_since(timestamp) < window
}

/// Whole minutes elapsed since `timestamp`, rounded down.
pub fn rate_age_minutes(timestamp: Timestamp) -> i64 {
    let elapsed = now().signed_duration_since(timestamp);
    elapsed.num_milliseconds().div_euclid(60_000)
}
