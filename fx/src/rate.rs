//! Rate values and provider fetch outcomes.

use cambio_common::{time, CurrencyCode, Timestamp};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::ProviderKind;
use crate::error::{CurrencyError, CurrencyResult};

/// Where a rate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "provider")]
pub enum RateSource {
    /// Manually entered.
    Manual,
    /// Fetched from a live provider.
    Provider(ProviderKind),
    /// Derived (cross-rate through the base currency, or an inverse).
    Calculated,
}

impl fmt::Display for RateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateSource::Manual => write!(f, "manual"),
            RateSource::Provider(kind) => write!(f, "{kind}"),
            RateSource::Calculated => write!(f, "calculated"),
        }
    }
}

/// A resolved conversion rate: 1 unit of `from` equals `rate` units of `to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionRate {
    pub from: CurrencyCode,
    pub to: CurrencyCode,
    pub rate: Decimal,
    pub timestamp: Timestamp,
    pub source: RateSource,
}

impl ConversionRate {
    /// Create a rate resolved just now.
    pub fn new(
        from: impl Into<CurrencyCode>,
        to: impl Into<CurrencyCode>,
        rate: Decimal,
        source: RateSource,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            rate,
            timestamp: time::now(),
            source,
        }
    }

    /// The identity rate for a same-currency conversion.
    pub fn identity(code: CurrencyCode) -> Self {
        Self::new(code.clone(), code, Decimal::ONE, RateSource::Calculated)
    }

    /// Derive the opposite-direction rate.
    pub fn inverted(&self) -> Self {
        Self::new(
            self.to.clone(),
            self.from.clone(),
            Decimal::ONE / self.rate,
            RateSource::Calculated,
        )
    }
}

/// A quote returned by a single provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderQuote {
    pub rate: Decimal,
    pub timestamp: Timestamp,
    pub provider: ProviderKind,
}

/// Normalized result of a gateway fetch.
///
/// Ordinary failure modes (inactive provider, missing key, timeout) come
/// back as `error` text instead of a panic or a rejected future, so
/// callers can degrade to a cached or manual rate.
#[derive(Debug, Clone)]
pub struct RateFetchOutcome {
    pub provider: ProviderKind,
    pub rate: Option<Decimal>,
    pub timestamp: Option<Timestamp>,
    pub error: Option<String>,
}

impl RateFetchOutcome {
    pub fn ok(quote: ProviderQuote) -> Self {
        Self {
            provider: quote.provider,
            rate: Some(quote.rate),
            timestamp: Some(quote.timestamp),
            error: None,
        }
    }

    pub fn fail(provider: ProviderKind, error: impl Into<String>) -> Self {
        Self {
            provider,
            rate: None,
            timestamp: None,
            error: Some(error.into()),
        }
    }

    pub fn success(&self) -> bool {
        self.rate.is_some()
    }

    /// Convert back into a result for callers that want to propagate.
    pub fn into_result(self) -> CurrencyResult<ProviderQuote> {
        match (self.rate, self.timestamp) {
            (Some(rate), Some(timestamp)) => Ok(ProviderQuote {
                rate,
                timestamp,
                provider: self.provider,
            }),
            _ => Err(CurrencyError::Provider(
                self.error
                    .unwrap_or_else(|| "Provider returned no rate".to_string()),
            )),
        }
    }
}
