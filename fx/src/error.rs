//! Currency module error types.

use cambio_common::CurrencyCode;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur in the currency module.
#[derive(Debug, Clone, Error)]
pub enum CurrencyError {
    /// Amount outside the accepted range.
    #[error("Amount {0} is outside the accepted range")]
    InvalidAmount(Decimal),

    /// Manual rate must be strictly positive.
    #[error("Rate must be greater than zero, got {0}")]
    InvalidRate(Decimal),

    /// Conversion parameters rejected (missing or invalid selection).
    #[error("Invalid conversion parameters: {0}")]
    InvalidParams(String),

    /// Provider refused to serve a rate (e.g. inactive).
    #[error("Provider error: {0}")]
    Provider(String),

    /// No conversion rate available for the requested pair.
    #[error("No conversion rate available for {from}-{to}")]
    UnsupportedPair {
        from: CurrencyCode,
        to: CurrencyCode,
    },

    /// Transport failure, timeout, or non-success provider response.
    #[error("Network error: {0}")]
    Network(String),

    /// Provider configuration problem (unknown name, missing API key).
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CurrencyError {
    /// Stable error code, surfaced to the UI layer.
    pub fn code(&self) -> &'static str {
        match self {
            CurrencyError::InvalidAmount(_) => "INVALID_AMOUNT",
            CurrencyError::InvalidRate(_) => "INVALID_RATE",
            CurrencyError::InvalidParams(_) => "INVALID_PARAMS",
            CurrencyError::Provider(_) => "PROVIDER_ERROR",
            CurrencyError::UnsupportedPair { .. } => "CONVERSION_ERROR",
            CurrencyError::Network(_) => "NETWORK_ERROR",
            CurrencyError::Config(_) => "CONFIG_ERROR",
        }
    }

    /// Check if a retry on the next update tick can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CurrencyError::Network(_) | CurrencyError::Provider(_)
        )
    }
}

/// Result type for currency operations.
pub type CurrencyResult<T> = Result<T, CurrencyError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_codes() {
        assert_eq!(CurrencyError::InvalidAmount(dec!(-1)).code(), "INVALID_AMOUNT");
        assert_eq!(CurrencyError::InvalidRate(dec!(0)).code(), "INVALID_RATE");
        assert_eq!(
            CurrencyError::InvalidParams("no selection".into()).code(),
            "INVALID_PARAMS"
        );
        assert_eq!(
            CurrencyError::UnsupportedPair {
                from: CurrencyCode::new("XYZ"),
                to: CurrencyCode::new("ABC"),
            }
            .code(),
            "CONVERSION_ERROR"
        );
        assert_eq!(CurrencyError::Config("bad".into()).code(), "CONFIG_ERROR");
    }

    #[test]
    fn test_retryable() {
        assert!(CurrencyError::Network("timeout".into()).is_retryable());
        assert!(!CurrencyError::InvalidRate(dec!(-5)).is_retryable());
    }
}
