//! Background sweep of expired cache entries.

use std::sync::Arc;
use std::time::Duration;

use gateway::MarketDataGateway;
use tokio::time::interval;
use tracing::{debug, info};

/// Starts the periodic cache sweep.
pub(crate) fn start_cache_sweeper(gateway: Arc<MarketDataGateway>, period: Duration) {
    tokio::spawn(async move {
        info!("Cache sweeper started ({}s interval)", period.as_secs());

        let mut sweep_interval = interval(period);
        // First tick completes immediately.
        sweep_interval.tick().await;

        loop {
            sweep_interval.tick().await;
            let removed = gateway.purge_expired().await;
            debug!(removed, "Swept expired cache entries");
        }
    });
}
