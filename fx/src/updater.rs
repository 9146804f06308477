//! Periodic rate refresh for live providers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use cambio_common::DurationExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::ProviderConfig;
use crate::provider::RateGateway;
use crate::rate::RateSource;
use crate::store::CurrencyStore;

/// Handle to a running auto-update schedule.
///
/// Dropping or cancelling the handle aborts the timer task; arming a new
/// schedule always goes through [`AutoUpdater::start`], so two schedules
/// never run concurrently for one store.
pub struct AutoUpdater {
    handle: JoinHandle<()>,
}

impl AutoUpdater {
    /// Arm the schedule for an active live provider. Returns `None` for
    /// manual or inactive configurations, which need no timer.
    pub fn start(
        store: Arc<CurrencyStore>,
        gateway: Arc<RateGateway>,
        config: ProviderConfig,
    ) -> Option<Self> {
        if !config.active || !config.kind.is_live() {
            return None;
        }

        let period = config.effective_update_interval().as_std();
        info!(provider = %config.kind, ?period, "Auto-update armed");

        let in_flight = Arc::new(AtomicBool::new(false));
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;

                // Overlapping ticks are no-ops.
                if in_flight.swap(true, Ordering::SeqCst) {
                    debug!(provider = %config.kind, "Update already running, skipping tick");
                    continue;
                }

                run_tick(&store, &gateway, &config).await;

                in_flight.store(false, Ordering::SeqCst);
            }
        });

        Some(Self { handle })
    }

    /// Cancel the schedule.
    pub fn cancel(&self) {
        self.handle.abort();
    }
}

impl Drop for AutoUpdater {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// One refresh attempt. Failures are logged and retried on the next
/// interval; they never tear down the schedule.
async fn run_tick(store: &CurrencyStore, gateway: &RateGateway, config: &ProviderConfig) {
    let outcome = gateway.fetch(config).await;

    match (outcome.rate, outcome.error) {
        (Some(rate), _) => {
            store.cache().insert_rate(
                config.base_currency.clone(),
                store.config().quote_currency.clone(),
                rate,
                RateSource::Provider(config.kind),
            );
            store.set_api_rate(Some(rate));
            store.touch();
            debug!(provider = %config.kind, %rate, "Auto-update refreshed rate");
        }
        (None, error) => {
            warn!(
                provider = %config.kind,
                error = error.as_deref().unwrap_or("unknown"),
                "Auto-update tick failed"
            );
        }
    }
}
