//! Monetary types for RemitFX.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of decimal places in a cent-precise amount.
pub const CENT_PLACES: u32 = 2;

/// Round up to the nearest hundredth.
///
/// Rounds toward positive infinity, never to nearest, so a fee is never
/// under-collected and a payout is never over-paid.
pub fn ceil_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(CENT_PLACES, RoundingStrategy::ToPositiveInfinity)
}

/// Currency a transfer can be paid out in.
///
/// Transfers are always funded in USD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PayoutCurrency {
    #[serde(rename = "GBP")]
    Gbp,
    #[serde(rename = "ZAR")]
    Zar,
}

impl PayoutCurrency {
    /// All supported payout currencies.
    pub const ALL: [PayoutCurrency; 2] = [PayoutCurrency::Gbp, PayoutCurrency::Zar];

    /// ISO 4217 code.
    pub fn code(&self) -> &'static str {
        match self {
            PayoutCurrency::Gbp => "GBP",
            PayoutCurrency::Zar => "ZAR",
        }
    }

    /// Display symbol.
    pub fn symbol(&self) -> &'static str {
        match self {
            PayoutCurrency::Gbp => "£",
            PayoutCurrency::Zar => "R",
        }
    }

    /// Decimal places used when displaying a USD rate into this currency.
    pub fn rate_display_places(&self) -> u32 {
        match self {
            PayoutCurrency::Gbp => 4,
            PayoutCurrency::Zar => 2,
        }
    }
}

impl fmt::Display for PayoutCurrency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Error when a currency code is not a supported payout currency.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unsupported payout currency: {0}")]
pub struct ParseCurrencyError(pub String);

impl FromStr for PayoutCurrency {
    type Err = ParseCurrencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "GBP" => Ok(PayoutCurrency::Gbp),
            "ZAR" => Ok(PayoutCurrency::Zar),
            _ => Err(ParseCurrencyError(s.to_string())),
        }
    }
}

/// Format a USD exchange rate for display, e.g. `£0.7900` or `R18.45`.
pub fn format_exchange_rate(rate: Decimal, currency: PayoutCurrency) -> String {
    let places = currency.rate_display_places();
    let rounded = rate.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero);
    format!(
        "{}{:.prec$}",
        currency.symbol(),
        rounded,
        prec = places as usize
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_ceil_cents() {
        assert_eq!(ceil_cents(dec!(71.1)), dec!(71.10));
        assert_eq!(ceil_cents(dec!(71.101)), dec!(71.11));
        assert_eq!(ceil_cents(dec!(71.109)), dec!(71.11));
        assert_eq!(ceil_cents(dec!(10)), dec!(10));
        assert_eq!(ceil_cents(dec!(0.001)), dec!(0.01));
    }

    #[test]
    fn test_currency_parse() {
        assert_eq!("GBP".parse::<PayoutCurrency>().unwrap(), PayoutCurrency::Gbp);
        assert_eq!("zar".parse::<PayoutCurrency>().unwrap(), PayoutCurrency::Zar);
        assert_eq!(" Gbp ".parse::<PayoutCurrency>().unwrap(), PayoutCurrency::Gbp);
        assert!("EUR".parse::<PayoutCurrency>().is_err());
        assert!("".parse::<PayoutCurrency>().is_err());
    }

    #[test]
    fn test_currency_serde_uses_codes() {
        let json = serde_json::to_string(&PayoutCurrency::Zar).unwrap();
        assert_eq!(json, "\"ZAR\"");

        let parsed: PayoutCurrency = serde_json::from_str("\"GBP\"").unwrap();
        assert_eq!(parsed, PayoutCurrency::Gbp);
    }

    #[test]
    fn test_format_exchange_rate() {
        assert_eq!(format_exchange_rate(dec!(0.79), PayoutCurrency::Gbp), "£0.7900");
        assert_eq!(format_exchange_rate(dec!(18.45), PayoutCurrency::Zar), "R18.45");
        assert_eq!(format_exchange_rate(dec!(18.456), PayoutCurrency::Zar), "R18.46");
        assert_eq!(
            format_exchange_rate(dec!(0.791234), PayoutCurrency::Gbp),
            "£0.7912"
        );
    }

    proptest! {
        #[test]
        fn ceil_cents_never_rounds_down(units in 0i64..100_000_000, scale in 0u32..8) {
            let value = Decimal::new(units, scale);
            let rounded = ceil_cents(value);

            prop_assert!(rounded >= value);
            prop_assert!(rounded - value < dec!(0.01));
            prop_assert_eq!(rounded, rounded.round_dp(CENT_PLACES));
        }
    }
}
