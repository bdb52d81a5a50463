//! Fee and payout calculation.

use remitfx_common::{ceil_cents, PayoutCurrency, RateSnapshot};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{FxError, FxResult};

/// Fee charged on the USD amount, as a fraction.
pub fn fee_rate(currency: PayoutCurrency) -> Decimal {
    match currency {
        PayoutCurrency::Gbp => Decimal::new(10, 2),
        PayoutCurrency::Zar => Decimal::new(20, 2),
    }
}

/// Fee and payout breakdown for one transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResult {
    /// Amount the recipient gets, in the payout currency.
    pub converted_amount: Decimal,
    /// Fee in USD.
    pub fee: Decimal,
    /// Same as `converted_amount`; kept as its own field for records.
    pub total_received: Decimal,
    /// Fee as a percentage, e.g. `10` for 10%.
    pub fee_percentage: Decimal,
}

/// Convert `amount_usd` into `currency` after fees.
///
/// Every monetary step is rounded up to the cent: the fee is never
/// under-collected and the payout is never over-paid through rounding.
/// The amount is expected to be validated already. A payout too large for
/// `Decimal` saturates at `Decimal::MAX` (or `Decimal::MIN` when negative).
pub fn convert(amount_usd: Decimal, currency: PayoutCurrency, rates: &RateSnapshot) -> ConversionResult {
    let rate = fee_rate(currency);
    let fee = ceil_cents(amount_usd * rate);
    let amount_after_fee = amount_usd - fee;
    let fx_rate = rates.rate_for(currency);
    let converted = match amount_after_fee.checked_mul(fx_rate) {
        Some(exact) => ceil_cents(exact),
        None if amount_after_fee.is_sign_negative() != fx_rate.is_sign_negative() => Decimal::MIN,
        None => Decimal::MAX,
    };

    ConversionResult {
        converted_amount: converted,
        fee,
        total_received: converted,
        fee_percentage: (rate * Decimal::ONE_HUNDRED).normalize(),
    }
}

/// Accepted range for a transfer amount in USD, inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmountLimits {
    pub min: Decimal,
    pub max: Decimal,
}

impl Default for AmountLimits {
    fn default() -> Self {
        Self {
            min: Decimal::from(10),
            max: Decimal::from(5000),
        }
    }
}

impl AmountLimits {
    /// Check an amount before it is converted.
    pub fn validate(&self, amount: Decimal) -> FxResult<()> {
        if amount <= Decimal::ZERO {
            return Err(FxError::InvalidAmount(amount));
        }

        if amount < self.min {
            return Err(FxError::AmountBelowMinimum {
                amount,
                min: self.min,
            });
        }

        if amount > self.max {
            return Err(FxError::AmountAboveMaximum {
                amount,
                max: self.max,
            });
        }

        Ok(())
    }
}

/// Check an amount against the default limits.
pub fn validate_amount(amount: Decimal) -> FxResult<()> {
    AmountLimits::default().validate(amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use remitfx_common::RateOrigin;
    use rust_decimal_macros::dec;

    fn rates() -> RateSnapshot {
        RateSnapshot::new(dec!(0.79), dec!(18.45), RateOrigin::Remote)
    }

    #[test]
    fn test_convert_gbp() {
        let result = convert(dec!(100), PayoutCurrency::Gbp, &rates());

        assert_eq!(result.fee, dec!(10.00));
        assert_eq!(result.converted_amount, dec!(71.10));
        assert_eq!(result.total_received, dec!(71.10));
        assert_eq!(result.fee_percentage, dec!(10));
    }

    #[test]
    fn test_convert_zar() {
        let result = convert(dec!(100), PayoutCurrency::Zar, &rates());

        assert_eq!(result.fee, dec!(20.00));
        assert_eq!(result.converted_amount, dec!(1476.00));
        assert_eq!(result.total_received, dec!(1476.00));
        assert_eq!(result.fee_percentage, dec!(20));
    }

    #[test]
    fn test_fee_rounds_up() {
        // 10% of 10.01 is 1.001, charged as 1.01
        let result = convert(dec!(10.01), PayoutCurrency::Gbp, &rates());

        assert_eq!(result.fee, dec!(1.01));
        // 9.00 * 0.79 = 7.11 exactly
        assert_eq!(result.converted_amount, dec!(7.11));
    }

    #[test]
    fn test_converted_rounds_up() {
        let snapshot = RateSnapshot::new(dec!(0.7912), dec!(18.4567), RateOrigin::Remote);

        // 45.00 * 0.7912 = 35.604
        let gbp = convert(dec!(50), PayoutCurrency::Gbp, &snapshot);
        assert_eq!(gbp.fee, dec!(5.00));
        assert_eq!(gbp.converted_amount, dec!(35.61));

        // 40.00 * 18.4567 = 738.268
        let zar = convert(dec!(50), PayoutCurrency::Zar, &snapshot);
        assert_eq!(zar.fee, dec!(10.00));
        assert_eq!(zar.converted_amount, dec!(738.27));
    }

    #[test]
    fn test_overflowing_rate_saturates() {
        let snapshot = RateSnapshot::new(
            dec!(0.79),
            Decimal::from_scientific("7.9e28").unwrap(),
            RateOrigin::Remote,
        );

        let result = convert(dec!(5000), PayoutCurrency::Zar, &snapshot);

        assert_eq!(result.fee, dec!(1000.00));
        assert_eq!(result.converted_amount, Decimal::MAX);
        assert_eq!(result.total_received, Decimal::MAX);
    }

    #[test]
    fn test_result_serializes_camel_case() {
        let result = convert(dec!(100), PayoutCurrency::Gbp, &rates());
        let json = serde_json::to_value(&result).unwrap();

        assert!(json.get("convertedAmount").is_some());
        assert!(json.get("totalReceived").is_some());
        assert!(json.get("feePercentage").is_some());
    }

    #[test]
    fn test_amount_limits() {
        assert!(validate_amount(dec!(10)).is_ok());
        assert!(validate_amount(dec!(5000)).is_ok());
        assert!(validate_amount(dec!(250.50)).is_ok());

        assert!(matches!(
            validate_amount(dec!(9.99)),
            Err(FxError::AmountBelowMinimum { .. })
        ));
        assert!(matches!(
            validate_amount(dec!(5000.01)),
            Err(FxError::AmountAboveMaximum { .. })
        ));
        assert!(matches!(
            validate_amount(dec!(0)),
            Err(FxError::InvalidAmount(_))
        ));
        assert!(matches!(
            validate_amount(dec!(-5)),
            Err(FxError::InvalidAmount(_))
        ));
    }

    proptest! {
        #[test]
        fn rounding_never_under_rounds(
            cents in 1i64..10_000_000,
            rate_units in 1i64..100_000_000,
            zar in any::<bool>(),
        ) {
            let amount = Decimal::new(cents, 2);
            let rate = Decimal::new(rate_units, 6);
            let currency = if zar { PayoutCurrency::Zar } else { PayoutCurrency::Gbp };
            let snapshot = RateSnapshot::new(rate, rate, RateOrigin::Remote);

            let result = convert(amount, currency, &snapshot);

            let exact_fee = amount * fee_rate(currency);
            prop_assert!(result.fee >= exact_fee);
            prop_assert_eq!(result.fee, result.fee.round_dp(2));

            let exact_converted = (amount - result.fee) * rate;
            prop_assert!(result.converted_amount >= exact_converted);
            prop_assert_eq!(result.converted_amount, result.converted_amount.round_dp(2));
            prop_assert_eq!(result.total_received, result.converted_amount);
        }
    }
}
