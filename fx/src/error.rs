//! FX error types.

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur in the FX subsystem.
#[derive(Debug, Error)]
pub enum FxError {
    /// Remote rate source unreachable, returned a non-success status, or
    /// returned a payload that could not be parsed.
    #[error("Remote rate source unavailable: {0}")]
    RemoteUnavailable(String),

    /// Amount is zero or negative.
    #[error("Invalid amount: {0}")]
    InvalidAmount(Decimal),

    /// Amount is below the minimum transfer.
    #[error("Minimum amount is ${min}, got ${amount}")]
    AmountBelowMinimum { amount: Decimal, min: Decimal },

    /// Amount is above the maximum transfer.
    #[error("Maximum amount is ${max}, got ${amount}")]
    AmountAboveMaximum { amount: Decimal, max: Decimal },

    /// Component could not be set up from its configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl FxError {
    /// Whether the rate adapter retries after this error.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FxError::RemoteUnavailable(_))
    }
}

impl From<reqwest::Error> for FxError {
    fn from(err: reqwest::Error) -> Self {
        FxError::RemoteUnavailable(err.to_string())
    }
}

/// Result type for FX operations.
pub type FxResult<T> = Result<T, FxError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_only_remote_errors_are_retryable() {
        assert!(FxError::RemoteUnavailable("HTTP 503".into()).is_retryable());
        assert!(!FxError::InvalidAmount(dec!(0)).is_retryable());
        assert!(!FxError::Configuration("bad".into()).is_retryable());
    }

    #[test]
    fn test_amount_messages() {
        let err = FxError::AmountBelowMinimum {
            amount: dec!(5),
            min: dec!(10),
        };
        assert_eq!(err.to_string(), "Minimum amount is $10, got $5");
    }
}
