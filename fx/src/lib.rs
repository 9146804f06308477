//! Cambio FX Engine
//!
//! Currency conversion core for the cambio back office: rate provider
//! gateway, bounded rate cache, conversion engine, and history ledger.
//!
//! # Features
//!
//! - Manual and live rate providers behind one dispatch gateway
//! - Rate caching with a 5-minute freshness window
//! - Bounded, append-only conversion history
//! - Auto-update scheduling for live providers
//! - Session persistence for the provider configuration and history tail
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use cambio_fx::{CurrencyEngine, CurrencyStore, EngineConfig};
//! use cambio_common::CurrencyCode;
//! use rust_decimal_macros::dec;
//!
//! let store = Arc::new(CurrencyStore::new(EngineConfig::default()));
//! let engine = CurrencyEngine::new(store);
//!
//! let result = engine
//!     .convert(dec!(100), &CurrencyCode::usd(), &CurrencyCode::ves())
//!     .await?
//!     .expect("rate available");
//! println!("{}", result.formatted_converted_amount.unwrap());
//! ```

pub mod cache;
pub mod config;
pub mod conversion;
pub mod data;
pub mod engine;
pub mod error;
pub mod history;
pub mod persist;
pub mod provider;
pub mod rate;
pub mod store;
pub mod updater;

pub use cache::{RateCache, RateCacheConfig};
pub use config::{EngineConfig, ProviderConfig, ProviderConfigBuilder, ProviderKind};
pub use conversion::ConversionResult;
pub use engine::CurrencyEngine;
pub use error::{CurrencyError, CurrencyResult};
pub use history::{HistoryEntry, HistoryLedger};
pub use persist::SessionSnapshot;
pub use provider::{RateGateway, RateProvider};
pub use rate::{ConversionRate, RateSource};
pub use store::CurrencyStore;
pub use updater::AutoUpdater;
