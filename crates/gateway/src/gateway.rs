//! Market data gateway: the per-category query surface over one upstream source.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::join_all;
use gateway_cache::CacheStore;
use gateway_core::{
    CacheCategory, CacheKey, ChartPayload, DataError, DividendsPayload, GatewayConfig,
    MarketDataSource, OptionChainPayload, QuotePayload, Result, SearchResults, Symbol,
};
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::batch::{BatchCoordinator, BatchResult};
use crate::dispatcher::{FetchDispatcher, Upstream};
use crate::rate_limit::RateLimiter;
use crate::shape;
use crate::stats::{GatewayStats, StatsSnapshot};

/// Period used for historical queries when the caller gives none.
pub const DEFAULT_HISTORY_PERIOD: &str = "30d";

/// Bar interval used for historical queries when the caller gives none.
pub const DEFAULT_HISTORY_INTERVAL: &str = "1d";

/// Period used for dividend queries when the caller gives none.
pub const DEFAULT_DIVIDEND_PERIOD: &str = "5y";

/// Gateway for cached, rate-limited market data queries.
///
/// Every query runs through a [`FetchDispatcher`]: a cache hit is returned
/// directly, a miss fetches from the [`MarketDataSource`], shapes the
/// canonical payload and caches it. Each upstream call inside a miss waits
/// for its own admission from the shared [`RateLimiter`]. Batch variants fan
/// symbols out through a [`BatchCoordinator`].
///
/// # Example
///
/// ```rust,ignore
/// use gateway::{GatewayConfig, MarketDataGateway};
///
/// let gateway = MarketDataGateway::yahoo(&GatewayConfig::default())?;
///
/// let quote = gateway.quote("AAPL").await?;
/// let quotes = gateway.quotes(&["AAPL".into(), "MSFT".into()]).await;
/// ```
pub struct MarketDataGateway {
    source: Arc<dyn MarketDataSource>,
    cache: Arc<CacheStore>,
    limiter: Arc<RateLimiter>,
    stats: Arc<GatewayStats>,
    dispatcher: FetchDispatcher,
    batch: BatchCoordinator,
}

impl std::fmt::Debug for MarketDataGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarketDataGateway")
            .field("source", &self.source.name())
            .field("limiter", &self.limiter)
            .field("batch", &self.batch)
            .finish_non_exhaustive()
    }
}

/// Point-in-time view of the gateway's caches, limiter and counters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayStatus {
    /// Upstream source name.
    pub provider: String,
    /// Runtime counters.
    pub stats: StatsSnapshot,
    /// Live entries per cache category.
    pub caches: BTreeMap<CacheCategory, usize>,
    /// Admissions inside the current limiter window.
    pub rate_limit_in_window: usize,
    /// Admissions allowed per limiter window.
    pub rate_limit_max_calls: usize,
}

impl MarketDataGateway {
    /// Create a gateway over `source` with its own cache and limiter.
    pub fn new(source: Arc<dyn MarketDataSource>, config: &GatewayConfig) -> Result<Self> {
        let limiter = Arc::new(RateLimiter::new(config.rate_limit));
        Self::with_limiter(source, config, limiter)
    }

    /// Create a gateway that shares an existing rate limiter.
    ///
    /// The configuration is validated as a whole, but its rate limit settings
    /// are otherwise ignored.
    pub fn with_limiter(
        source: Arc<dyn MarketDataSource>,
        config: &GatewayConfig,
        limiter: Arc<RateLimiter>,
    ) -> Result<Self> {
        config.validate()?;
        let cache = Arc::new(CacheStore::new(config));
        let stats = Arc::new(GatewayStats::default());
        let dispatcher =
            FetchDispatcher::new(Arc::clone(&cache), Arc::clone(&limiter), Arc::clone(&stats));

        debug!(provider = source.name(), "Created market data gateway");

        Ok(Self {
            source,
            cache,
            limiter,
            stats,
            dispatcher,
            batch: BatchCoordinator::new(config.batch_size),
        })
    }

    /// Create a gateway backed by Yahoo Finance.
    #[cfg(feature = "yahoo")]
    pub fn yahoo(config: &GatewayConfig) -> Result<Self> {
        let provider = gateway_yahoo::YahooProvider::new()?;
        Self::new(Arc::new(provider), config)
    }

    /// The shared cache store.
    #[must_use]
    pub fn cache(&self) -> &Arc<CacheStore> {
        &self.cache
    }

    /// The shared rate limiter.
    #[must_use]
    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Runtime counters.
    #[must_use]
    pub fn stats(&self) -> &GatewayStats {
        &self.stats
    }

    fn upstream(&self) -> Upstream<'_> {
        self.dispatcher.upstream(self.source.as_ref())
    }

    /// Fetches a quote.
    ///
    /// Payloads echo the symbol as the caller wrote it; the cache key is
    /// case-insensitive.
    #[instrument(skip(self))]
    pub async fn quote(&self, symbol: &str) -> Result<QuotePayload> {
        let requested = symbol.trim();
        let symbol = require_symbol(requested)?;
        let key = CacheKey::quote(&symbol);
        let upstream = self.upstream();
        let symbol = &symbol;

        self.dispatcher
            .fetch_one(&key, move || async move {
                let info = upstream.ticker_info(symbol).await?;
                Ok(shape::quote_payload(requested, info))
            })
            .await
    }

    /// Fetches a historical series in the chart envelope.
    #[instrument(skip(self))]
    pub async fn historical(
        &self,
        symbol: &str,
        period: &str,
        interval: &str,
    ) -> Result<ChartPayload> {
        let requested = symbol.trim();
        let symbol = require_symbol(requested)?;
        let key = CacheKey::historical(&symbol, period, interval);
        let upstream = self.upstream();
        let symbol = &symbol;

        self.dispatcher
            .fetch_one(&key, move || async move {
                let bars = upstream.history(symbol, period, interval).await?;
                let info = upstream.ticker_info(symbol).await?;
                shape::chart_payload(requested, &info, &bars)
            })
            .await
    }

    /// Fetches the option chain for one expiration.
    ///
    /// Without an expiration, or with one that is not listed, the first
    /// available expiration is used. A symbol with no expirations is
    /// [`DataError::NotFound`].
    #[instrument(skip(self))]
    pub async fn options(
        &self,
        symbol: &str,
        expiration: Option<&str>,
    ) -> Result<OptionChainPayload> {
        let requested = symbol.trim();
        let symbol = require_symbol(requested)?;
        let expiration = expiration.map(str::trim).filter(|e| !e.is_empty());
        let key = CacheKey::options(&symbol, expiration);
        let upstream = self.upstream();
        let symbol = &symbol;

        self.dispatcher
            .fetch_one(&key, move || async move {
                let expirations = upstream.option_expirations(symbol).await?;
                let selected = shape::select_expiration(&expirations, expiration).ok_or_else(
                    || DataError::NotFound(format!("No options available for {requested}")),
                )?;
                let chain = upstream.option_chain(symbol, selected).await?;
                Ok(shape::option_chain_payload(&expirations, chain))
            })
            .await
    }

    /// Fetches dividend summary and history over `period`.
    #[instrument(skip(self))]
    pub async fn dividends(&self, symbol: &str, period: &str) -> Result<DividendsPayload> {
        let requested = symbol.trim();
        let symbol = require_symbol(requested)?;
        let key = CacheKey::dividends(&symbol, period);
        let upstream = self.upstream();
        let symbol = &symbol;

        self.dispatcher
            .fetch_one(&key, move || async move {
                let info = upstream.ticker_info(symbol).await?;
                let events = upstream.dividends(symbol, period).await?;
                Ok(shape::dividends_payload(requested, &info, events))
            })
            .await
    }

    /// Searches for tickers matching `query`.
    ///
    /// Candidates whose info lookup fails or lacks a short name are left out
    /// of the results; they are logged and counted, never raised. Every
    /// candidate lookup is admitted separately, so a long query spreads over
    /// as many limiter windows as it needs.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<SearchResults> {
        let query = query.trim();
        if query.is_empty() {
            return Err(DataError::missing_query());
        }
        let key = CacheKey::search(query);
        let upstream = self.upstream();
        let stats = &self.stats;

        self.dispatcher
            .fetch_one(&key, move || async move {
                let candidates = upstream.search_candidates(query).await?;
                let infos = join_all(candidates.iter().map(|c| upstream.ticker_info(c))).await;
                let outcome = shape::search_outcome(candidates.into_iter().zip(infos).collect());

                if !outcome.filtered.is_empty() {
                    stats.record_search_filtered(outcome.filtered.len());
                    for filtered in &outcome.filtered {
                        warn!(
                            symbol = %filtered.symbol,
                            reason = ?filtered.reason,
                            "Search candidate filtered out"
                        );
                    }
                }
                Ok(outcome.results)
            })
            .await
    }

    /// Fetches quotes for several symbols, isolating per-symbol failures.
    pub async fn quotes(&self, symbols: &[String]) -> BatchResult<QuotePayload> {
        self.batch
            .fetch_many(symbols, move |symbol| async move { self.quote(&symbol).await })
            .await
    }

    /// Fetches historical series for several symbols.
    pub async fn historical_batch(
        &self,
        symbols: &[String],
        period: &str,
        interval: &str,
    ) -> BatchResult<ChartPayload> {
        self.batch
            .fetch_many(symbols, move |symbol| async move {
                self.historical(&symbol, period, interval).await
            })
            .await
    }

    /// Fetches dividend data for several symbols.
    pub async fn dividends_batch(
        &self,
        symbols: &[String],
        period: &str,
    ) -> BatchResult<DividendsPayload> {
        self.batch
            .fetch_many(symbols, move |symbol| async move {
                self.dividends(&symbol, period).await
            })
            .await
    }

    /// Drops expired entries from every cache category.
    pub async fn purge_expired(&self) -> usize {
        self.cache.purge_expired().await
    }

    /// Collects counters, cache sizes and limiter occupancy.
    pub async fn status(&self) -> GatewayStatus {
        let mut caches = BTreeMap::new();
        for category in CacheCategory::ALL {
            caches.insert(category, self.cache.len(category).await);
        }

        GatewayStatus {
            provider: self.source.name().to_string(),
            stats: self.stats.snapshot(),
            caches,
            rate_limit_in_window: self.limiter.in_window().await,
            rate_limit_max_calls: self.limiter.max_calls(),
        }
    }
}

fn require_symbol(symbol: &str) -> Result<Symbol> {
    let symbol = Symbol::new(symbol);
    if symbol.is_empty() {
        return Err(DataError::missing_symbol());
    }
    Ok(symbol)
}
