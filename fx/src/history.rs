//! Append-only bounded log of rate resolutions and conversions.

use cambio_common::{time, CurrencyCode, Timestamp};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::rate::RateSource;

/// A recorded conversion or manual rate update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Unique entry id, assigned on append.
    pub id: Uuid,
    /// When the entry was recorded.
    pub date: Timestamp,
    pub from: CurrencyCode,
    pub to: CurrencyCode,
    /// The realized rate.
    pub rate: Decimal,
    /// Converted amount; absent for pure rate updates.
    pub amount: Option<Decimal>,
    pub converted_amount: Option<Decimal>,
    /// Where the rate came from.
    pub source: RateSource,
    /// User who triggered the operation, when known.
    pub user: Option<String>,
}

/// Fields the caller supplies; id and date are assigned by the ledger.
#[derive(Debug, Clone)]
pub struct HistoryRecord {
    pub from: CurrencyCode,
    pub to: CurrencyCode,
    pub rate: Decimal,
    pub amount: Option<Decimal>,
    pub converted_amount: Option<Decimal>,
    pub source: RateSource,
    pub user: Option<String>,
}

/// Bounded, time-ordered append log.
///
/// Entries are stored oldest-first; read accessors return newest-first.
/// On overflow the oldest entries are silently dropped. Individual
/// entries are never mutated or removed.
pub struct HistoryLedger {
    entries: RwLock<Vec<HistoryEntry>>,
    max_entries: usize,
}

impl HistoryLedger {
    /// Create a ledger retaining at most `max_entries` entries.
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            max_entries,
        }
    }

    /// Append a record, assigning its id and timestamp. Returns the
    /// stored entry.
    pub fn append(&self, record: HistoryRecord) -> HistoryEntry {
        let entry = HistoryEntry {
            id: Uuid::now_v7(),
            date: time::now(),
            from: record.from,
            to: record.to,
            rate: record.rate,
            amount: record.amount,
            converted_amount: record.converted_amount,
            source: record.source,
            user: record.user,
        };

        let mut entries = self.entries.write();
        entries.push(entry.clone());
        if entries.len() > self.max_entries {
            let overflow = entries.len() - self.max_entries;
            entries.drain(..overflow);
            debug!(dropped = overflow, "History ledger truncated");
        }

        entry
    }

    /// All retained entries, newest first.
    pub fn entries(&self) -> Vec<HistoryEntry> {
        let entries = self.entries.read();
        entries.iter().rev().cloned().collect()
    }

    /// The `n` most recent entries, newest first.
    pub fn recent(&self, n: usize) -> Vec<HistoryEntry> {
        let entries = self.entries.read();
        entries.iter().rev().take(n).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Whole-ledger reset.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Replace the ledger contents (session rehydration). Input is
    /// newest-first, as produced by [`entries`](Self::entries).
    pub fn restore(&self, newest_first: Vec<HistoryEntry>) {
        let mut restored: Vec<HistoryEntry> = newest_first.into_iter().rev().collect();
        if restored.len() > self.max_entries {
            let overflow = restored.len() - self.max_entries;
            restored.drain(..overflow);
        }
        *self.entries.write() = restored;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn record(rate: Decimal) -> HistoryRecord {
        HistoryRecord {
            from: CurrencyCode::usd(),
            to: CurrencyCode::ves(),
            rate,
            amount: Some(dec!(100)),
            converted_amount: Some(rate * dec!(100)),
            source: RateSource::Manual,
            user: None,
        }
    }

    #[test]
    fn test_append_assigns_id_and_date() {
        let ledger = HistoryLedger::new(50);
        let entry = ledger.append(record(dec!(91.50)));

        assert_eq!(entry.rate, dec!(91.50));
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.entries()[0].id, entry.id);
    }

    #[test]
    fn test_fifo_bounding() {
        let ledger = HistoryLedger::new(50);
        for i in 0..55 {
            ledger.append(record(Decimal::from(i + 1)));
        }

        assert_eq!(ledger.len(), 50);
        let entries = ledger.entries();
        // Newest first: rates 55 down to 6.
        assert_eq!(entries.first().unwrap().rate, dec!(55));
        assert_eq!(entries.last().unwrap().rate, dec!(6));
    }

    #[test]
    fn test_newest_first_order() {
        let ledger = HistoryLedger::new(10);
        ledger.append(record(dec!(1)));
        ledger.append(record(dec!(2)));
        ledger.append(record(dec!(3)));

        let rates: Vec<Decimal> = ledger.entries().iter().map(|e| e.rate).collect();
        assert_eq!(rates, vec![dec!(3), dec!(2), dec!(1)]);
        assert_eq!(ledger.recent(2).len(), 2);
        assert_eq!(ledger.recent(2)[0].rate, dec!(3));
    }

    #[test]
    fn test_restore_round_trip() {
        let ledger = HistoryLedger::new(10);
        for i in 0..4 {
            ledger.append(record(Decimal::from(i + 1)));
        }

        let snapshot = ledger.recent(3);
        let restored = HistoryLedger::new(10);
        restored.restore(snapshot.clone());

        assert_eq!(restored.entries(), snapshot);
    }

    proptest! {
        #[test]
        fn prop_never_exceeds_bound(appends in 1usize..200) {
            let ledger = HistoryLedger::new(50);
            for i in 0..appends {
                ledger.append(record(Decimal::from(i as u32 + 1)));
            }

            prop_assert_eq!(ledger.len(), appends.min(50));
            // The retained entries are the most recent ones.
            let newest = ledger.entries().first().unwrap().rate;
            prop_assert_eq!(newest, Decimal::from(appends as u32));
        }
    }
}
