//! Provider and engine configuration.

use std::fmt;
use std::str::FromStr;

use cambio_common::{time::constants, CurrencyCode};
use chrono::Duration;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cache::RateCacheConfig;
use crate::error::{CurrencyError, CurrencyResult};

/// Smallest accepted conversion amount.
pub fn min_amount() -> Decimal {
    Decimal::ZERO
}

/// Largest accepted conversion amount (999,999,999.99).
pub fn max_amount() -> Decimal {
    Decimal::new(99_999_999_999, 2)
}

/// Known rate providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Manually entered rate, no I/O.
    Manual,
    /// Central-bank style source (no API key required).
    #[serde(rename = "bancentralve")]
    CentralBank,
    /// Commercial rate API (API key required).
    #[serde(rename = "apilayer")]
    ApiLayer,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Manual => "manual",
            ProviderKind::CentralBank => "bancentralve",
            ProviderKind::ApiLayer => "apilayer",
        }
    }

    /// Whether this provider performs live fetches.
    pub fn is_live(&self) -> bool {
        !matches!(self, ProviderKind::Manual)
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = CurrencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(ProviderKind::Manual),
            "bancentralve" => Ok(ProviderKind::CentralBank),
            "apilayer" => Ok(ProviderKind::ApiLayer),
            other => Err(CurrencyError::Config(format!(
                "Unsupported rate provider: {other}"
            ))),
        }
    }
}

/// Active rate provider configuration.
///
/// An immutable value replaced wholesale on each update; build one with
/// [`ProviderConfigBuilder`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Which provider serves rates.
    pub kind: ProviderKind,
    /// API key, for providers that require one.
    pub api_key: Option<String>,
    /// Override endpoint, when supported by the provider.
    pub base_url: Option<String>,
    /// Requested auto-update period in seconds. The scheduler enforces
    /// the 5-minute floor.
    pub update_interval_secs: u32,
    /// Base currency quoted by the provider.
    pub base_currency: CurrencyCode,
    /// Whether the provider may be called at all.
    pub active: bool,
}

impl ProviderConfig {
    /// Start building a configuration for the given provider.
    pub fn builder(kind: ProviderKind) -> ProviderConfigBuilder {
        ProviderConfigBuilder::new(kind)
    }

    /// Requested update interval as a duration.
    pub fn update_interval(&self) -> Duration {
        Duration::seconds(i64::from(self.update_interval_secs))
    }

    /// Effective scheduling period: never below the module floor.
    pub fn effective_update_interval(&self) -> Duration {
        self.update_interval()
            .max(constants::default_update_interval())
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::Manual,
            api_key: None,
            base_url: None,
            update_interval_secs: constants::default_update_interval().num_seconds() as u32,
            base_currency: CurrencyCode::usd(),
            active: true,
        }
    }
}

/// Builder for [`ProviderConfig`]. Validation happens once, in [`build`].
///
/// [`build`]: ProviderConfigBuilder::build
#[derive(Debug, Clone)]
pub struct ProviderConfigBuilder {
    kind: ProviderKind,
    api_key: Option<String>,
    base_url: Option<String>,
    update_interval_secs: u32,
    base_currency: CurrencyCode,
    active: bool,
}

impl ProviderConfigBuilder {
    fn new(kind: ProviderKind) -> Self {
        let defaults = ProviderConfig::default();
        Self {
            kind,
            api_key: None,
            base_url: None,
            update_interval_secs: defaults.update_interval_secs,
            base_currency: defaults.base_currency,
            active: true,
        }
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn update_interval_secs(mut self, secs: u32) -> Self {
        self.update_interval_secs = secs;
        self
    }

    pub fn base_currency(mut self, code: impl Into<CurrencyCode>) -> Self {
        self.base_currency = code.into();
        self
    }

    pub fn active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Validate and produce the immutable configuration.
    pub fn build(self) -> CurrencyResult<ProviderConfig> {
        if self.update_interval_secs == 0 {
            return Err(CurrencyError::Config(
                "Update interval must be greater than zero".to_string(),
            ));
        }
        if let Some(key) = &self.api_key {
            if key.trim().is_empty() {
                return Err(CurrencyError::Config(
                    "API key must not be blank".to_string(),
                ));
            }
        }

        Ok(ProviderConfig {
            kind: self.kind,
            api_key: self.api_key,
            base_url: self.base_url,
            update_interval_secs: self.update_interval_secs,
            base_currency: self.base_currency,
            active: self.active,
        })
    }
}

/// Top-level configuration for the conversion engine and its store.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Rate cache settings.
    pub cache: RateCacheConfig,
    /// Maximum retained history entries.
    pub max_history_entries: usize,
    /// Quote side of the provider pair (what provider rates price the
    /// base currency against).
    pub quote_currency: CurrencyCode,
    /// Default base currency for new sessions.
    pub default_currency: CurrencyCode,
    /// Seed value for the manual rate (base -> quote).
    pub default_manual_rate: Decimal,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache: RateCacheConfig::default(),
            max_history_entries: 50,
            quote_currency: CurrencyCode::ves(),
            default_currency: CurrencyCode::usd(),
            default_manual_rate: Decimal::new(9150, 2),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trip() {
        for kind in [
            ProviderKind::Manual,
            ProviderKind::CentralBank,
            ProviderKind::ApiLayer,
        ] {
            assert_eq!(kind.as_str().parse::<ProviderKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_unknown_provider_name() {
        let err = "exchangerate-pro".parse::<ProviderKind>().unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");
    }

    #[test]
    fn test_builder_validates_once() {
        let config = ProviderConfig::builder(ProviderKind::ApiLayer)
            .api_key("k-123")
            .update_interval_secs(60)
            .base_currency("usd")
            .build()
            .unwrap();

        assert_eq!(config.kind, ProviderKind::ApiLayer);
        assert_eq!(config.base_currency, CurrencyCode::usd());
        // Requested 60s, floor is 5 minutes.
        assert_eq!(
            config.effective_update_interval(),
            Duration::minutes(5)
        );

        let err = ProviderConfig::builder(ProviderKind::ApiLayer)
            .update_interval_secs(0)
            .build()
            .unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");
    }

    #[test]
    fn test_interval_above_floor_kept() {
        let config = ProviderConfig::builder(ProviderKind::CentralBank)
            .update_interval_secs(900)
            .build()
            .unwrap();
        assert_eq!(config.effective_update_interval(), Duration::minutes(15));
    }
}
