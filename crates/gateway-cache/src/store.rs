//! Five-category cache store.

use gateway_core::{
    CacheCategory, CacheKey, ChartPayload, DividendsPayload, GatewayConfig, OptionChainPayload,
    QuotePayload, SearchResults,
};
use tracing::{debug, instrument};

use crate::memory::TtlCache;

/// A payload type that is cached in exactly one category.
pub trait CachedPayload: Clone + Send + Sync + 'static {
    /// The category this payload is stored under.
    const CATEGORY: CacheCategory;

    /// The category cache holding payloads of this type.
    fn cache(store: &CacheStore) -> &TtlCache<Self>;
}

impl CachedPayload for QuotePayload {
    const CATEGORY: CacheCategory = CacheCategory::Quote;

    fn cache(store: &CacheStore) -> &TtlCache<Self> {
        &store.quote
    }
}

impl CachedPayload for ChartPayload {
    const CATEGORY: CacheCategory = CacheCategory::Historical;

    fn cache(store: &CacheStore) -> &TtlCache<Self> {
        &store.historical
    }
}

impl CachedPayload for OptionChainPayload {
    const CATEGORY: CacheCategory = CacheCategory::Options;

    fn cache(store: &CacheStore) -> &TtlCache<Self> {
        &store.options
    }
}

impl CachedPayload for DividendsPayload {
    const CATEGORY: CacheCategory = CacheCategory::Dividends;

    fn cache(store: &CacheStore) -> &TtlCache<Self> {
        &store.dividends
    }
}

impl CachedPayload for SearchResults {
    const CATEGORY: CacheCategory = CacheCategory::Search;

    fn cache(store: &CacheStore) -> &TtlCache<Self> {
        &store.search
    }
}

/// One independent [`TtlCache`] per [`CacheCategory`].
///
/// Each category has its own lock, capacity and TTL. Lookups and stores never
/// trigger a fetch.
#[derive(Debug)]
pub struct CacheStore {
    quote: TtlCache<QuotePayload>,
    historical: TtlCache<ChartPayload>,
    options: TtlCache<OptionChainPayload>,
    dividends: TtlCache<DividendsPayload>,
    search: TtlCache<SearchResults>,
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new(&GatewayConfig::default())
    }
}

impl CacheStore {
    /// Create empty caches sized from the configuration.
    #[must_use]
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            quote: sized(config, CacheCategory::Quote),
            historical: sized(config, CacheCategory::Historical),
            options: sized(config, CacheCategory::Options),
            dividends: sized(config, CacheCategory::Dividends),
            search: sized(config, CacheCategory::Search),
        }
    }

    /// Looks up a live entry. Expired entries are removed and reported as a miss.
    #[instrument(skip(self, key), fields(category = %key.category(), key = %key))]
    pub async fn lookup<P: CachedPayload>(&self, key: &CacheKey) -> Option<P> {
        debug_assert_eq!(key.category(), P::CATEGORY);

        let hit = P::cache(self).get(key.as_str()).await;
        if hit.is_some() {
            debug!("Cache hit");
        } else {
            debug!("Cache miss");
        }
        hit
    }

    /// Stores a payload, evicting the least recently used entry if the category is full.
    #[instrument(skip(self, key, value), fields(category = %key.category(), key = %key))]
    pub async fn store<P: CachedPayload>(&self, key: &CacheKey, value: P) {
        debug_assert_eq!(key.category(), P::CATEGORY);

        P::cache(self).insert(key.as_str().to_string(), value).await;
        debug!("Cached payload");
    }

    /// Number of stored entries in one category.
    pub async fn len(&self, category: CacheCategory) -> usize {
        match category {
            CacheCategory::Quote => self.quote.len().await,
            CacheCategory::Historical => self.historical.len().await,
            CacheCategory::Options => self.options.len().await,
            CacheCategory::Dividends => self.dividends.len().await,
            CacheCategory::Search => self.search.len().await,
        }
    }

    /// Removes expired entries from every category. Returns the number removed.
    #[instrument(skip(self))]
    pub async fn purge_expired(&self) -> usize {
        let total_removed = self.quote.purge_expired().await
            + self.historical.purge_expired().await
            + self.options.purge_expired().await
            + self.dividends.purge_expired().await
            + self.search.purge_expired().await;

        if total_removed > 0 {
            debug!("Invalidated {} stale cache entries", total_removed);
        }
        total_removed
    }

    /// Clears every category.
    #[instrument(skip(self))]
    pub async fn clear(&self) {
        self.quote.clear().await;
        self.historical.clear().await;
        self.options.clear().await;
        self.dividends.clear().await;
        self.search.clear().await;
        debug!("Cleared all cache entries");
    }
}

fn sized<V: Clone>(config: &GatewayConfig, category: CacheCategory) -> TtlCache<V> {
    let settings = config.cache(category);
    TtlCache::new(settings.capacity, settings.ttl)
}
