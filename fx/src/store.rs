//! Process-wide currency state.
//!
//! The store is an explicit context object created by the application and
//! handed to the engine; nothing else mutates the cache, ledger, or
//! configuration directly. `reset` restores the seeded defaults and
//! cancels any auto-update schedule.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use cambio_common::{time, Currency, CurrencyCode, Timestamp};
use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;

use crate::cache::RateCache;
use crate::config::{EngineConfig, ProviderConfig};
use crate::data;
use crate::history::HistoryLedger;
use crate::updater::AutoUpdater;

/// Single owner of the currency module's mutable state.
pub struct CurrencyStore {
    config: EngineConfig,
    currencies: RwLock<Vec<Currency>>,
    base_rates: RwLock<HashMap<CurrencyCode, Decimal>>,
    manual_rate: Arc<RwLock<Decimal>>,
    api_rate: RwLock<Option<Decimal>>,
    cache: RateCache,
    history: HistoryLedger,
    provider: RwLock<ProviderConfig>,
    selection: RwLock<Option<(CurrencyCode, CurrencyCode)>>,
    amount: RwLock<Decimal>,
    last_update: RwLock<Option<Timestamp>>,
    error: RwLock<Option<String>>,
    loading: AtomicBool,
    updater: Mutex<Option<AutoUpdater>>,
}

impl CurrencyStore {
    /// Create a store seeded with the reference currency set.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            cache: RateCache::with_config(config.cache.clone()),
            history: HistoryLedger::new(config.max_history_entries),
            currencies: RwLock::new(data::default_currencies()),
            base_rates: RwLock::new(data::base_rates()),
            manual_rate: Arc::new(RwLock::new(config.default_manual_rate)),
            api_rate: RwLock::new(None),
            provider: RwLock::new(ProviderConfig::default()),
            selection: RwLock::new(None),
            amount: RwLock::new(Decimal::ZERO),
            last_update: RwLock::new(None),
            error: RwLock::new(None),
            loading: AtomicBool::new(false),
            updater: Mutex::new(None),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // Reference data -------------------------------------------------

    pub fn currencies(&self) -> Vec<Currency> {
        self.currencies.read().clone()
    }

    pub fn set_currencies(&self, currencies: Vec<Currency>) {
        *self.currencies.write() = currencies;
    }

    /// Look up a currency descriptor by code.
    pub fn currency(&self, code: &CurrencyCode) -> Option<Currency> {
        self.currencies
            .read()
            .iter()
            .find(|c| &c.code == code)
            .cloned()
    }

    /// USD-quoted reference rate for a currency, if tabulated.
    pub fn base_rate(&self, code: &CurrencyCode) -> Option<Decimal> {
        self.base_rates.read().get(code).copied()
    }

    // Rates ----------------------------------------------------------

    pub fn manual_rate(&self) -> Decimal {
        *self.manual_rate.read()
    }

    pub fn set_manual_rate(&self, rate: Decimal) {
        *self.manual_rate.write() = rate;
    }

    /// Shared cell read by the manual provider source.
    pub fn manual_rate_cell(&self) -> Arc<RwLock<Decimal>> {
        Arc::clone(&self.manual_rate)
    }

    pub fn api_rate(&self) -> Option<Decimal> {
        *self.api_rate.read()
    }

    pub fn set_api_rate(&self, rate: Option<Decimal>) {
        *self.api_rate.write() = rate;
    }

    pub fn cache(&self) -> &RateCache {
        &self.cache
    }

    pub fn history(&self) -> &HistoryLedger {
        &self.history
    }

    // Provider configuration -----------------------------------------

    pub fn provider(&self) -> ProviderConfig {
        self.provider.read().clone()
    }

    pub fn set_provider(&self, config: ProviderConfig) {
        *self.provider.write() = config;
    }

    /// Replace the active updater, cancelling the previous schedule.
    pub fn install_updater(&self, updater: Option<AutoUpdater>) {
        let previous = {
            let mut slot = self.updater.lock();
            std::mem::replace(&mut *slot, updater)
        };
        if let Some(previous) = previous {
            previous.cancel();
        }
    }

    pub fn has_updater(&self) -> bool {
        self.updater.lock().is_some()
    }

    // UI state -------------------------------------------------------

    pub fn selection(&self) -> Option<(CurrencyCode, CurrencyCode)> {
        self.selection.read().clone()
    }

    pub fn set_selection(&self, from: CurrencyCode, to: CurrencyCode) {
        *self.selection.write() = Some((from, to));
    }

    pub fn amount(&self) -> Decimal {
        *self.amount.read()
    }

    pub fn set_amount(&self, amount: Decimal) {
        *self.amount.write() = amount;
    }

    pub fn last_update(&self) -> Option<Timestamp> {
        *self.last_update.read()
    }

    /// Record that shared rate state changed just now.
    pub fn touch(&self) {
        *self.last_update.write() = Some(time::now());
    }

    pub fn error(&self) -> Option<String> {
        self.error.read().clone()
    }

    pub fn set_error(&self, message: impl Into<String>) {
        *self.error.write() = Some(message.into());
    }

    pub fn clear_error(&self) {
        *self.error.write() = None;
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    pub fn set_loading(&self, loading: bool) {
        self.loading.store(loading, Ordering::SeqCst);
    }

    // Lifecycle ------------------------------------------------------

    /// Restore seeded defaults and cancel the auto-update timer.
    pub fn reset(&self) {
        self.install_updater(None);
        self.cache.clear();
        self.history.clear();
        *self.currencies.write() = data::default_currencies();
        *self.base_rates.write() = data::base_rates();
        *self.manual_rate.write() = self.config.default_manual_rate;
        *self.api_rate.write() = None;
        *self.provider.write() = ProviderConfig::default();
        *self.selection.write() = None;
        *self.amount.write() = Decimal::ZERO;
        *self.last_update.write() = None;
        *self.error.write() = None;
        self.loading.store(false, Ordering::SeqCst);
    }
}

impl Drop for CurrencyStore {
    fn drop(&mut self) {
        // Teardown must not leak the update timer.
        if let Some(updater) = self.updater.get_mut().take() {
            updater.cancel();
        }
    }
}
