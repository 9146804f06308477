//! Rate providers and the dispatch gateway.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use cambio_common::{time, time::constants, DurationExt};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::config::{ProviderConfig, ProviderKind};
use crate::error::{CurrencyError, CurrencyResult};
use crate::rate::{ProviderQuote, RateFetchOutcome};

/// A single source of conversion rates.
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Which provider this handler serves.
    fn kind(&self) -> ProviderKind;

    /// Fetch the current quote for the configured base currency.
    async fn fetch(&self, config: &ProviderConfig) -> CurrencyResult<ProviderQuote>;
}

/// Manually entered rate. No I/O; reads the shared rate cell.
pub struct ManualSource {
    rate: Arc<RwLock<Decimal>>,
}

impl ManualSource {
    pub fn new(rate: Arc<RwLock<Decimal>>) -> Self {
        Self { rate }
    }
}

#[async_trait]
impl RateProvider for ManualSource {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Manual
    }

    async fn fetch(&self, _config: &ProviderConfig) -> CurrencyResult<ProviderQuote> {
        Ok(ProviderQuote {
            rate: *self.rate.read(),
            timestamp: time::now(),
            provider: ProviderKind::Manual,
        })
    }
}

/// Central-bank style source. No API key required.
///
/// The real HTTP integration is out of scope; the call is an opaque stub
/// returning the published reference quote after a short delay.
pub struct CentralBankSource;

#[async_trait]
impl RateProvider for CentralBankSource {
    fn kind(&self) -> ProviderKind {
        ProviderKind::CentralBank
    }

    async fn fetch(&self, _config: &ProviderConfig) -> CurrencyResult<ProviderQuote> {
        tokio::time::sleep(constants::network_delay().as_std()).await;
        Ok(ProviderQuote {
            rate: Decimal::new(9050, 2),
            timestamp: time::now(),
            provider: ProviderKind::CentralBank,
        })
    }
}

/// Commercial rate API. Requires an API key; checked before any call.
pub struct ApiLayerSource;

#[async_trait]
impl RateProvider for ApiLayerSource {
    fn kind(&self) -> ProviderKind {
        ProviderKind::ApiLayer
    }

    async fn fetch(&self, config: &ProviderConfig) -> CurrencyResult<ProviderQuote> {
        if config.api_key.is_none() {
            return Err(CurrencyError::Config(
                "API key required for apilayer".to_string(),
            ));
        }

        tokio::time::sleep(constants::network_delay().as_std()).await;
        Ok(ProviderQuote {
            rate: Decimal::new(9050, 2),
            timestamp: time::now(),
            provider: ProviderKind::ApiLayer,
        })
    }
}

/// Dispatches rate fetches to the handler registered for the active
/// provider and normalizes every failure mode into a
/// [`RateFetchOutcome`].
pub struct RateGateway {
    handlers: HashMap<ProviderKind, Arc<dyn RateProvider>>,
}

impl RateGateway {
    /// Build a gateway with the three stock providers. The manual source
    /// shares the store's manual rate cell.
    pub fn new(manual_rate: Arc<RwLock<Decimal>>) -> Self {
        let mut gateway = Self {
            handlers: HashMap::new(),
        };
        gateway.register(Arc::new(ManualSource::new(manual_rate)));
        gateway.register(Arc::new(CentralBankSource));
        gateway.register(Arc::new(ApiLayerSource));
        gateway
    }

    /// Register (or replace) a provider handler.
    pub fn register(&mut self, handler: Arc<dyn RateProvider>) {
        self.handlers.insert(handler.kind(), handler);
    }

    /// Fetch a rate according to the given configuration.
    ///
    /// Quotes must be strictly positive; anything else is normalized
    /// into a failed outcome. Never writes to the cache; that is the
    /// caller's responsibility.
    pub async fn fetch(&self, config: &ProviderConfig) -> RateFetchOutcome {
        if !config.active {
            return RateFetchOutcome::fail(
                config.kind,
                CurrencyError::Provider(format!("Provider {} is inactive", config.kind))
                    .to_string(),
            );
        }

        let handler = match self.handlers.get(&config.kind) {
            Some(handler) => handler,
            None => {
                return RateFetchOutcome::fail(
                    config.kind,
                    CurrencyError::Config(format!(
                        "No handler registered for provider {}",
                        config.kind
                    ))
                    .to_string(),
                );
            }
        };

        let timeout = constants::provider_timeout().as_std();
        match tokio::time::timeout(timeout, handler.fetch(config)).await {
            Ok(Ok(quote)) => {
                if quote.rate <= Decimal::ZERO {
                    warn!(provider = %config.kind, rate = %quote.rate, "Provider returned non-positive rate");
                    return RateFetchOutcome::fail(
                        config.kind,
                        CurrencyError::Provider(format!(
                            "Provider {} returned a non-positive rate: {}",
                            config.kind, quote.rate
                        ))
                        .to_string(),
                    );
                }
                debug!(provider = %config.kind, rate = %quote.rate, "Provider quote received");
                RateFetchOutcome::ok(quote)
            }
            Ok(Err(err)) => {
                warn!(provider = %config.kind, error = %err, "Provider fetch failed");
                RateFetchOutcome::fail(config.kind, err.to_string())
            }
            Err(_) => {
                warn!(provider = %config.kind, "Provider fetch timed out");
                RateFetchOutcome::fail(
                    config.kind,
                    CurrencyError::Network(format!(
                        "Provider {} timed out after {:?}",
                        config.kind, timeout
                    ))
                    .to_string(),
                )
            }
        }
    }
}

/// Scripted provider for tests.
#[cfg(test)]
pub struct MockRateProvider {
    kind: ProviderKind,
    result: parking_lot::Mutex<Option<CurrencyResult<Decimal>>>,
    calls: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl MockRateProvider {
    pub fn new(kind: ProviderKind, rate: Decimal) -> Self {
        Self {
            kind,
            result: parking_lot::Mutex::new(Some(Ok(rate))),
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    pub fn failing(kind: ProviderKind, err: CurrencyError) -> Self {
        Self {
            kind,
            result: parking_lot::Mutex::new(Some(Err(err))),
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
#[async_trait]
impl RateProvider for MockRateProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn fetch(&self, _config: &ProviderConfig) -> CurrencyResult<ProviderQuote> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        match self.result.lock().clone() {
            Some(Ok(rate)) => Ok(ProviderQuote {
                rate,
                timestamp: time::now(),
                provider: self.kind,
            }),
            Some(Err(err)) => Err(err),
            None => Err(CurrencyError::Provider("unscripted".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn gateway() -> RateGateway {
        RateGateway::new(Arc::new(RwLock::new(dec!(91.50))))
    }

    #[tokio::test]
    async fn test_manual_fetch_no_io() {
        let outcome = gateway()
            .fetch(&ProviderConfig::default())
            .await;

        assert!(outcome.success());
        assert_eq!(outcome.rate, Some(dec!(91.50)));
        assert_eq!(outcome.provider, ProviderKind::Manual);
    }

    #[tokio::test]
    async fn test_manual_tracks_rate_cell() {
        let cell = Arc::new(RwLock::new(dec!(91.50)));
        let gateway = RateGateway::new(cell.clone());

        *cell.write() = dec!(37.2);

        let outcome = gateway.fetch(&ProviderConfig::default()).await;
        assert_eq!(outcome.rate, Some(dec!(37.2)));
    }

    #[tokio::test]
    async fn test_inactive_provider_not_called() {
        let mock = Arc::new(MockRateProvider::new(ProviderKind::CentralBank, dec!(90.50)));
        let mut gateway = gateway();
        gateway.register(mock.clone());

        let config = ProviderConfig::builder(ProviderKind::CentralBank)
            .active(false)
            .build()
            .unwrap();

        let outcome = gateway.fetch(&config).await;
        assert!(!outcome.success());
        assert!(outcome.error.unwrap().contains("inactive"));
        assert_eq!(mock.calls(), 0);
    }

    #[tokio::test]
    async fn test_apilayer_requires_key() {
        let config = ProviderConfig::builder(ProviderKind::ApiLayer)
            .build()
            .unwrap();

        let outcome = gateway().fetch(&config).await;
        assert!(!outcome.success());
        assert!(outcome.error.unwrap().contains("API key"));
    }

    #[tokio::test]
    async fn test_apilayer_with_key() {
        let config = ProviderConfig::builder(ProviderKind::ApiLayer)
            .api_key("k-123")
            .build()
            .unwrap();

        let outcome = gateway().fetch(&config).await;
        assert!(outcome.success());
        assert_eq!(outcome.rate, Some(dec!(90.50)));
    }

    #[tokio::test]
    async fn test_central_bank_quote() {
        let config = ProviderConfig::builder(ProviderKind::CentralBank)
            .build()
            .unwrap();

        let outcome = gateway().fetch(&config).await;
        assert!(outcome.success());
        assert_eq!(outcome.rate, Some(dec!(90.50)));
        assert!(outcome.timestamp.is_some());
    }

    #[tokio::test]
    async fn test_non_positive_quote_rejected() {
        for bad_rate in [dec!(0), dec!(-91.50)] {
            let mock = Arc::new(MockRateProvider::new(ProviderKind::CentralBank, bad_rate));
            let mut gateway = gateway();
            gateway.register(mock.clone());

            let config = ProviderConfig::builder(ProviderKind::CentralBank)
                .build()
                .unwrap();

            let outcome = gateway.fetch(&config).await;
            assert!(!outcome.success());
            assert!(outcome.error.as_ref().unwrap().contains("non-positive"));
            assert_eq!(outcome.into_result().unwrap_err().code(), "PROVIDER_ERROR");
            assert_eq!(mock.calls(), 1);
        }
    }

    #[tokio::test]
    async fn test_failure_normalized_not_panicking() {
        let mock = Arc::new(MockRateProvider::failing(
            ProviderKind::CentralBank,
            CurrencyError::Network("connection refused".to_string()),
        ));
        let mut gateway = gateway();
        gateway.register(mock);

        let config = ProviderConfig::builder(ProviderKind::CentralBank)
            .build()
            .unwrap();

        let outcome = gateway.fetch(&config).await;
        assert!(!outcome.success());
        assert!(outcome.error.unwrap().contains("connection refused"));
    }
}
