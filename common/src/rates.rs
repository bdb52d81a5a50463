//! Exchange rate snapshots.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::monetary::PayoutCurrency;
use crate::time::{now, Timestamp};

/// Where a snapshot's rates came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateOrigin {
    /// Parsed from the remote rate source.
    Remote,
    /// Generated locally after the remote source could not be reached.
    Synthetic,
}

impl fmt::Display for RateOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateOrigin::Remote => write!(f, "remote"),
            RateOrigin::Synthetic => write!(f, "synthetic"),
        }
    }
}

/// The best known USD exchange rates as of a point in time.
///
/// Snapshots are never edited. A newer snapshot supersedes an older one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateSnapshot {
    /// 1 USD in GBP.
    pub usd_to_gbp: Decimal,
    /// 1 USD in ZAR.
    pub usd_to_zar: Decimal,
    /// When the rates were captured.
    pub captured_at: Timestamp,
    /// Provenance of the rates.
    pub origin: RateOrigin,
}

impl RateSnapshot {
    /// Create a snapshot captured now.
    pub fn new(usd_to_gbp: Decimal, usd_to_zar: Decimal, origin: RateOrigin) -> Self {
        Self {
            usd_to_gbp,
            usd_to_zar,
            captured_at: now(),
            origin,
        }
    }

    /// Rate for converting USD into the given payout currency.
    pub fn rate_for(&self, currency: PayoutCurrency) -> Decimal {
        match currency {
            PayoutCurrency::Gbp => self.usd_to_gbp,
            PayoutCurrency::Zar => self.usd_to_zar,
        }
    }

    /// Whether the rates were generated locally.
    pub fn is_synthetic(&self) -> bool {
        self.origin == RateOrigin::Synthetic
    }
}

impl fmt::Display for RateSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "USD/GBP {} USD/ZAR {} ({}, {})",
            self.usd_to_gbp,
            self.usd_to_zar,
            self.origin,
            self.captured_at.to_rfc3339()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_rate_for() {
        let snapshot = RateSnapshot::new(dec!(0.79), dec!(18.45), RateOrigin::Remote);

        assert_eq!(snapshot.rate_for(PayoutCurrency::Gbp), dec!(0.79));
        assert_eq!(snapshot.rate_for(PayoutCurrency::Zar), dec!(18.45));
        assert!(!snapshot.is_synthetic());
    }

    #[test]
    fn test_snapshot_serializes_origin() {
        let snapshot = RateSnapshot::new(dec!(0.79), dec!(18.45), RateOrigin::Synthetic);
        let json = serde_json::to_value(&snapshot).unwrap();

        assert_eq!(json["origin"], "synthetic");
        assert!(json.get("usdToGbp").is_some());
        assert!(json.get("capturedAt").is_some());
    }
}
