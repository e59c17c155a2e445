//! Single-entity fetch orchestration: cache, admission, fetch, populate.

use std::future::Future;
use std::sync::Arc;

use chrono::NaiveDate;
use gateway_cache::{CacheStore, CachedPayload};
use gateway_core::{
    CacheKey, DividendEvent, ErrorKind, MarketDataSource, OptionChainData, Result, Symbol,
    TickerInfo,
};
use polars::prelude::DataFrame;
use tracing::{debug, instrument, warn};

use crate::rate_limit::RateLimiter;
use crate::stats::GatewayStats;

/// Runs one logical fetch through the cache and the shared rate limiter.
#[derive(Debug, Clone)]
pub struct FetchDispatcher {
    cache: Arc<CacheStore>,
    limiter: Arc<RateLimiter>,
    stats: Arc<GatewayStats>,
}

impl FetchDispatcher {
    /// Create a dispatcher over shared cache, limiter and counters.
    #[must_use]
    pub const fn new(
        cache: Arc<CacheStore>,
        limiter: Arc<RateLimiter>,
        stats: Arc<GatewayStats>,
    ) -> Self {
        Self {
            cache,
            limiter,
            stats,
        }
    }

    /// Waits for the limiter to admit one upstream call and counts it.
    pub async fn admit(&self) {
        self.limiter.admit().await;
        self.stats.record_upstream_call();
    }

    /// Wraps `source` so that every call on it is admitted first.
    #[must_use]
    pub fn upstream<'a>(&'a self, source: &'a dyn MarketDataSource) -> Upstream<'a> {
        Upstream {
            source,
            dispatcher: self,
        }
    }

    /// Returns the cached payload for `key`, or fetches, caches and returns it.
    ///
    /// A hit never touches the limiter or the upstream. On a miss `fetch`
    /// performs the upstream calls and shapes the result; each of those calls
    /// must go through [`FetchDispatcher::admit`], usually via an [`Upstream`].
    /// Failures are returned as-is and never cached.
    #[instrument(skip(self, key, fetch), fields(key = %key))]
    pub async fn fetch_one<P, F, Fut>(&self, key: &CacheKey, fetch: F) -> Result<P>
    where
        P: CachedPayload,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<P>>,
    {
        if let Some(cached) = self.cache.lookup::<P>(key).await {
            self.stats.record_hit();
            return Ok(cached);
        }
        self.stats.record_miss();
        debug!("Fetching from upstream");

        match fetch().await {
            Ok(payload) => {
                self.cache.store(key, payload.clone()).await;
                Ok(payload)
            }
            Err(e) => {
                self.stats.record_upstream_failure();
                match e.kind() {
                    ErrorKind::UpstreamFailure => {
                        warn!(key = %key, error = %e, "Upstream fetch failed");
                    }
                    ErrorKind::NotFound | ErrorKind::MissingParameter => {
                        debug!(key = %key, error = %e, "Upstream returned no data");
                    }
                }
                Err(e)
            }
        }
    }
}

/// A [`MarketDataSource`] whose every call waits for rate limiter admission.
#[derive(Debug, Clone, Copy)]
pub struct Upstream<'a> {
    source: &'a dyn MarketDataSource,
    dispatcher: &'a FetchDispatcher,
}

impl Upstream<'_> {
    /// Admitted [`MarketDataSource::ticker_info`].
    pub async fn ticker_info(&self, symbol: &Symbol) -> Result<TickerInfo> {
        self.dispatcher.admit().await;
        self.source.ticker_info(symbol).await
    }

    /// Admitted [`MarketDataSource::history`].
    pub async fn history(&self, symbol: &Symbol, period: &str, interval: &str) -> Result<DataFrame> {
        self.dispatcher.admit().await;
        self.source.history(symbol, period, interval).await
    }

    /// Admitted [`MarketDataSource::option_expirations`].
    pub async fn option_expirations(&self, symbol: &Symbol) -> Result<Vec<NaiveDate>> {
        self.dispatcher.admit().await;
        self.source.option_expirations(symbol).await
    }

    /// Admitted [`MarketDataSource::option_chain`].
    pub async fn option_chain(
        &self,
        symbol: &Symbol,
        expiration: NaiveDate,
    ) -> Result<OptionChainData> {
        self.dispatcher.admit().await;
        self.source.option_chain(symbol, expiration).await
    }

    /// Admitted [`MarketDataSource::dividends`].
    pub async fn dividends(&self, symbol: &Symbol, period: &str) -> Result<Vec<DividendEvent>> {
        self.dispatcher.admit().await;
        self.source.dividends(symbol, period).await
    }

    /// [`MarketDataSource::search_candidates`], admitted like any other call.
    pub async fn search_candidates(&self, query: &str) -> Result<Vec<Symbol>> {
        self.dispatcher.admit().await;
        self.source.search_candidates(query).await
    }
}
