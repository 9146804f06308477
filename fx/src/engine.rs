//! The conversion engine.
//!
//! Orchestrates cache, provider gateway, and the reference rate table,
//! enforces numeric bounds, and records successful conversions in the
//! history ledger. Precondition violations return typed errors; failures
//! during async resolution are written to the store's shared error state
//! and surface as `Ok(None)`, so a UI caller never sees a rejected
//! future.

use std::sync::Arc;

use cambio_common::{format, time::constants, Currency, CurrencyCode, DurationExt};
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{info, instrument, warn};

use crate::config::{max_amount, min_amount, ProviderConfig, ProviderKind};
use crate::conversion::ConversionResult;
use crate::data;
use crate::error::{CurrencyError, CurrencyResult};
use crate::history::{HistoryEntry, HistoryRecord};
use crate::provider::RateGateway;
use crate::rate::{ConversionRate, RateSource};
use crate::store::CurrencyStore;
use crate::updater::AutoUpdater;

/// Decimal places of every converted amount.
const OUTPUT_SCALE: u32 = 2;

/// Currency conversion engine.
pub struct CurrencyEngine {
    store: Arc<CurrencyStore>,
    gateway: Arc<RateGateway>,
}

impl CurrencyEngine {
    /// Create an engine over the given store, with the stock providers.
    pub fn new(store: Arc<CurrencyStore>) -> Self {
        let gateway = Arc::new(RateGateway::new(store.manual_rate_cell()));
        Self { store, gateway }
    }

    /// Create an engine with a custom gateway.
    pub fn with_gateway(store: Arc<CurrencyStore>, gateway: Arc<RateGateway>) -> Self {
        Self { store, gateway }
    }

    /// The context store (read accessors for cache, history, flags).
    pub fn store(&self) -> &Arc<CurrencyStore> {
        &self.store
    }

    /// Load the available currencies.
    ///
    /// Reference data lives with the application; the load simulates the
    /// backend round trip and refreshes the store.
    pub async fn fetch_currencies(&self) -> Vec<Currency> {
        self.store.set_loading(true);
        self.store.clear_error();

        tokio::time::sleep(constants::network_delay().as_std()).await;
        let currencies = data::default_currencies();
        self.store.set_currencies(currencies.clone());

        self.store.set_loading(false);
        currencies
    }

    /// Resolve the conversion rate between two currencies.
    pub async fn fetch_conversion_rate(
        &self,
        from: &CurrencyCode,
        to: &CurrencyCode,
    ) -> CurrencyResult<Decimal> {
        Ok(self.resolve_rate(from, to).await?.rate)
    }

    /// Convert an amount between two currencies.
    ///
    /// Returns `Err` for precondition violations (amount out of bounds),
    /// `Ok(None)` when rate resolution fails (the error message lands in
    /// the store), and `Ok(Some(..))` on success.
    #[instrument(skip(self), fields(%from, %to, %amount))]
    pub async fn convert(
        &self,
        amount: Decimal,
        from: &CurrencyCode,
        to: &CurrencyCode,
    ) -> CurrencyResult<Option<ConversionResult>> {
        validate_amount(amount)?;

        self.store.set_loading(true);
        self.store.clear_error();

        let rate = match self.resolve_rate(from, to).await {
            Ok(rate) => rate,
            Err(err) => {
                warn!(error = %err, "Conversion failed");
                self.store.set_error(err.to_string());
                self.store.set_loading(false);
                return Ok(None);
            }
        };

        let converted = (amount * rate.rate)
            .round_dp_with_strategy(OUTPUT_SCALE, RoundingStrategy::MidpointAwayFromZero);

        let result = ConversionResult::new(amount, converted, &rate).with_formatting(
            self.format_amount(amount, from),
            self.format_amount(converted, to),
        );

        // Identity conversions are not audit-worthy.
        if from != to {
            self.store.history().append(HistoryRecord {
                from: from.clone(),
                to: to.clone(),
                rate: rate.rate,
                amount: Some(amount),
                converted_amount: Some(converted),
                source: rate.source,
                user: None,
            });
        }

        self.store.touch();
        self.store.set_loading(false);

        info!(
            rate = %rate.rate,
            converted = %converted,
            source = %rate.source,
            "Conversion completed"
        );

        Ok(Some(result))
    }

    /// Select the working currency pair. The pair must be distinct; use
    /// [`convert`](Self::convert) directly for identity conversions.
    pub fn set_selected_currencies(
        &self,
        from: CurrencyCode,
        to: CurrencyCode,
    ) -> CurrencyResult<()> {
        if from == to {
            return Err(CurrencyError::InvalidParams(
                "Source and target currencies must be different".to_string(),
            ));
        }
        self.store.set_selection(from, to);
        self.store.clear_error();
        Ok(())
    }

    /// Set the working amount, bounds-checked.
    pub fn set_amount(&self, amount: Decimal) -> CurrencyResult<()> {
        validate_amount(amount)?;
        self.store.set_amount(amount);
        self.store.clear_error();
        Ok(())
    }

    /// Convert the working amount between the selected currencies.
    pub async fn convert_selected(&self) -> CurrencyResult<Option<ConversionResult>> {
        let (from, to) = self.store.selection().ok_or_else(|| {
            CurrencyError::InvalidParams("No currency pair selected".to_string())
        })?;

        self.convert(self.store.amount(), &from, &to).await
    }

    /// Replace the manual rate. The provider pair's cached entries are
    /// invalidated so the next conversion sees the new rate.
    pub fn update_manual_rate(&self, rate: Decimal) -> CurrencyResult<HistoryEntry> {
        if rate <= Decimal::ZERO {
            return Err(CurrencyError::InvalidRate(rate));
        }

        self.store.set_manual_rate(rate);

        let base = self.store.provider().base_currency;
        let quote = self.store.config().quote_currency.clone();
        self.store.cache().remove_pair(&base, &quote);

        self.store.touch();
        self.store.clear_error();

        info!(%rate, "Manual rate updated");

        Ok(self.store.history().append(HistoryRecord {
            from: base,
            to: quote,
            rate,
            amount: None,
            converted_amount: None,
            source: RateSource::Manual,
            user: None,
        }))
    }

    /// Replace the provider configuration wholesale. Cancels any running
    /// auto-update schedule and arms a new one when the new provider is
    /// live and active.
    pub fn update_provider(&self, config: ProviderConfig) {
        info!(provider = %config.kind, active = config.active, "Provider configuration replaced");

        self.store.set_provider(config.clone());
        self.store.clear_error();

        let updater = AutoUpdater::start(self.store.clone(), self.gateway.clone(), config);
        self.store.install_updater(updater);
    }

    /// Format an amount for display in the given currency.
    pub fn format_amount(&self, amount: Decimal, code: &CurrencyCode) -> String {
        match self.store.currency(code) {
            Some(currency) => format::format_amount(amount, &currency),
            None => format::format_plain(amount),
        }
    }

    /// Restore the seeded defaults and cancel the auto-update timer.
    pub fn reset(&self) {
        self.store.reset();
    }

    // Rate resolution ------------------------------------------------

    async fn resolve_rate(
        &self,
        from: &CurrencyCode,
        to: &CurrencyCode,
    ) -> CurrencyResult<ConversionRate> {
        // Same-currency conversion bypasses cache and providers.
        if from == to {
            return Ok(ConversionRate::identity(from.clone()));
        }

        if let Some(hit) = self.store.cache().get(from, to) {
            return Ok(hit);
        }

        // A cached opposite entry yields the inverse rate. A zero rate
        // cannot be inverted and reads as a miss.
        if let Some(opposite) = self.store.cache().get(to, from) {
            if !opposite.rate.is_zero() {
                let inverse = opposite.inverted();
                self.store.cache().insert(inverse.clone());
                return Ok(inverse);
            }
        }

        if let Some(resolved) = self.provider_rate(from, to).await {
            self.store.cache().insert(resolved.clone());
            return Ok(resolved);
        }

        let resolved = self.table_rate(from, to)?;
        self.store.cache().insert(resolved.clone());
        Ok(resolved)
    }

    /// Ask the active provider, when the requested pair is the one it
    /// quotes. A failed fetch degrades to the reference table.
    async fn provider_rate(
        &self,
        from: &CurrencyCode,
        to: &CurrencyCode,
    ) -> Option<ConversionRate> {
        let config = self.store.provider();
        if !config.active {
            return None;
        }

        let quote_currency = &self.store.config().quote_currency;
        let direct = *from == config.base_currency && to == quote_currency;
        let inverse = *to == config.base_currency && from == quote_currency;
        if !direct && !inverse {
            return None;
        }

        match self.gateway.fetch(&config).await.into_result() {
            Ok(quote) => {
                let source = match config.kind {
                    ProviderKind::Manual => RateSource::Manual,
                    kind => RateSource::Provider(kind),
                };
                if config.kind.is_live() {
                    self.store.set_api_rate(Some(quote.rate));
                }

                let rate = ConversionRate::new(
                    config.base_currency.clone(),
                    quote_currency.clone(),
                    quote.rate,
                    source,
                );
                Some(if direct { rate } else { rate.inverted() })
            }
            Err(err) => {
                warn!(provider = %config.kind, error = %err, "Provider unavailable, using reference table");
                self.store.set_error(err.to_string());
                None
            }
        }
    }

    /// Cross-rate through the USD-quoted reference table.
    fn table_rate(
        &self,
        from: &CurrencyCode,
        to: &CurrencyCode,
    ) -> CurrencyResult<ConversionRate> {
        let from_rate = self.store.base_rate(from);
        let to_rate = self.store.base_rate(to);

        match (from_rate, to_rate) {
            (Some(from_rate), Some(to_rate)) if !from_rate.is_zero() => Ok(ConversionRate::new(
                from.clone(),
                to.clone(),
                to_rate / from_rate,
                RateSource::Calculated,
            )),
            _ => Err(CurrencyError::UnsupportedPair {
                from: from.clone(),
                to: to.clone(),
            }),
        }
    }
}

fn validate_amount(amount: Decimal) -> CurrencyResult<()> {
    if amount < min_amount() || amount > max_amount() {
        return Err(CurrencyError::InvalidAmount(amount));
    }
    Ok(())
}
