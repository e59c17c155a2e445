//! Runtime counters for cache, upstream and search-filter outcomes.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Monotonic counters updated by the dispatcher.
#[derive(Debug, Default)]
pub struct GatewayStats {
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    upstream_calls: AtomicU64,
    upstream_failures: AtomicU64,
    search_filtered: AtomicU64,
}

/// Point-in-time copy of [`GatewayStats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    /// Lookups answered from cache.
    pub cache_hits: u64,
    /// Lookups that required an upstream fetch.
    pub cache_misses: u64,
    /// Upstream calls admitted by the rate limiter.
    pub upstream_calls: u64,
    /// Cache misses whose fetch ended in an error.
    pub upstream_failures: u64,
    /// Search candidates dropped because their info was missing or failed.
    pub search_filtered: u64,
}

impl GatewayStats {
    pub(crate) fn record_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_upstream_call(&self) {
        self.upstream_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_upstream_failure(&self) {
        self.upstream_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_search_filtered(&self, count: usize) {
        self.search_filtered
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Reads every counter.
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            upstream_calls: self.upstream_calls.load(Ordering::Relaxed),
            upstream_failures: self.upstream_failures.load(Ordering::Relaxed),
            search_filtered: self.search_filtered.load(Ordering::Relaxed),
        }
    }
}
