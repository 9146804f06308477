//! Session persistence.
//!
//! A small subset of the store survives across sessions: the active
//! provider configuration (including its base currency), the manual
//! rate, and the tail of the history ledger. The snapshot is a JSON
//! file; restoring it re-arms the auto-update timer exactly once when
//! the persisted provider is live.

use std::path::Path;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::config::ProviderConfig;
use crate::history::HistoryEntry;
use crate::provider::RateGateway;
use crate::store::CurrencyStore;
use crate::updater::AutoUpdater;

/// How many history entries survive a session.
const PERSISTED_HISTORY_ENTRIES: usize = 10;

/// Errors while saving or loading a session snapshot.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("Snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Snapshot format error: {0}")]
    Format(#[from] serde_json::Error),
}

/// The persisted subset of the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub provider: ProviderConfig,
    pub manual_rate: Decimal,
    pub history: Vec<HistoryEntry>,
}

impl SessionSnapshot {
    /// Capture the persisted subset of a store.
    pub fn capture(store: &CurrencyStore) -> Self {
        Self {
            provider: store.provider(),
            manual_rate: store.manual_rate(),
            history: store.history().recent(PERSISTED_HISTORY_ENTRIES),
        }
    }

    /// Write the snapshot as JSON.
    pub fn save(&self, path: &Path) -> Result<(), PersistError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Read a snapshot back from disk.
    pub fn load(path: &Path) -> Result<Self, PersistError> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Apply the snapshot to a store and re-arm the auto-update timer
    /// when the persisted provider is live. The store's
    /// [`install_updater`](CurrencyStore::install_updater) replaces any
    /// existing schedule, so rehydration never duplicates timers.
    pub fn restore(self, store: &Arc<CurrencyStore>, gateway: &Arc<RateGateway>) {
        info!(provider = %self.provider.kind, "Restoring persisted session");

        store.set_manual_rate(self.manual_rate);
        store.history().restore(self.history);
        store.set_provider(self.provider.clone());

        let updater = AutoUpdater::start(Arc::clone(store), Arc::clone(gateway), self.provider);
        store.install_updater(updater);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EngineConfig, ProviderKind};
    use crate::history::HistoryRecord;
    use crate::rate::RateSource;
    use cambio_common::CurrencyCode;
    use rust_decimal_macros::dec;

    fn store_with_history(entries: usize) -> Arc<CurrencyStore> {
        let store = Arc::new(CurrencyStore::new(EngineConfig::default()));
        for i in 0..entries {
            store.history().append(HistoryRecord {
                from: CurrencyCode::usd(),
                to: CurrencyCode::ves(),
                rate: Decimal::from(i as u32 + 1),
                amount: None,
                converted_amount: None,
                source: RateSource::Manual,
                user: None,
            });
        }
        store
    }

    #[test]
    fn test_capture_keeps_recent_tail() {
        let store = store_with_history(25);
        let snapshot = SessionSnapshot::capture(&store);

        assert_eq!(snapshot.history.len(), 10);
        assert_eq!(snapshot.history[0].rate, dec!(25));
        assert_eq!(snapshot.manual_rate, dec!(91.50));
        // The base currency rides on the provider configuration.
        assert_eq!(snapshot.provider.base_currency, CurrencyCode::usd());
    }

    #[test]
    fn test_save_load_round_trip() {
        let store = store_with_history(3);
        store.set_manual_rate(dec!(37.2));
        let snapshot = SessionSnapshot::capture(&store);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        snapshot.save(&path).unwrap();

        let loaded = SessionSnapshot::load(&path).unwrap();
        assert_eq!(loaded, snapshot);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = SessionSnapshot::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, PersistError::Io(_)));
    }

    #[tokio::test]
    async fn test_restore_manual_provider_arms_nothing() {
        let source = store_with_history(2);
        source.set_manual_rate(dec!(37.2));
        let snapshot = SessionSnapshot::capture(&source);

        let store = Arc::new(CurrencyStore::new(EngineConfig::default()));
        let gateway = Arc::new(RateGateway::new(store.manual_rate_cell()));
        snapshot.restore(&store, &gateway);

        assert_eq!(store.manual_rate(), dec!(37.2));
        assert_eq!(store.history().len(), 2);
        assert!(!store.has_updater());
    }

    #[tokio::test]
    async fn test_restore_live_provider_rearms_once() {
        let source = Arc::new(CurrencyStore::new(EngineConfig::default()));
        source.set_provider(
            ProviderConfig::builder(ProviderKind::CentralBank)
                .base_currency("USD")
                .build()
                .unwrap(),
        );
        let snapshot = SessionSnapshot::capture(&source);

        let store = Arc::new(CurrencyStore::new(EngineConfig::default()));
        let gateway = Arc::new(RateGateway::new(store.manual_rate_cell()));
        snapshot.clone().restore(&store, &gateway);
        assert!(store.has_updater());
        assert_eq!(store.provider().base_currency, CurrencyCode::usd());

        // Restoring again replaces the schedule instead of stacking one.
        snapshot.restore(&store, &gateway);
        assert!(store.has_updater());
    }
}
