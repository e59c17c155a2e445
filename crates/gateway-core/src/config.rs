//! Startup configuration for the gateway core.
//!
//! [`GatewayConfig`] bundles per-category cache settings, the rate limiter
//! window and the batch chunk size. Values are fixed once the gateway is built.

use std::time::Duration;

use crate::{
    category::CacheCategory,
    error::{DataError, Result},
};

/// Default rate limiter window.
pub const DEFAULT_RATE_WINDOW: Duration = Duration::from_secs(60);

/// Default number of upstream calls admitted per window.
pub const DEFAULT_RATE_MAX_CALLS: usize = 100;

/// Default number of symbols dispatched together in a batch.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Longest accepted cache TTL or rate limiter window (one year).
pub const MAX_DURATION: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Capacity and expiration for one cache category.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheSettings {
    /// Maximum number of live entries.
    pub capacity: usize,
    /// Maximum age of an entry.
    pub ttl: Duration,
}

impl CacheSettings {
    /// Default settings for a category.
    #[must_use]
    pub const fn for_category(category: CacheCategory) -> Self {
        Self {
            capacity: category.default_capacity(),
            ttl: category.default_ttl(),
        }
    }
}

/// Sliding-window rate limiter settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Length of the trailing window.
    pub window: Duration,
    /// Maximum number of calls admitted inside any window.
    pub max_calls: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_RATE_WINDOW,
            max_calls: DEFAULT_RATE_MAX_CALLS,
        }
    }
}

/// Complete gateway configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GatewayConfig {
    caches: [CacheSettings; 5],
    /// Rate limiter shared by every upstream fetch.
    pub rate_limit: RateLimitConfig,
    /// Number of symbols per batch chunk.
    pub batch_size: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            caches: CacheCategory::ALL.map(CacheSettings::for_category),
            rate_limit: RateLimitConfig::default(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl GatewayConfig {
    /// Settings for one category.
    #[must_use]
    pub const fn cache(&self, category: CacheCategory) -> CacheSettings {
        self.caches[category.index()]
    }

    /// Replaces the settings for one category.
    #[must_use]
    pub const fn with_cache(mut self, category: CacheCategory, settings: CacheSettings) -> Self {
        self.caches[category.index()] = settings;
        self
    }

    /// Replaces the rate limiter settings.
    #[must_use]
    pub const fn with_rate_limit(mut self, rate_limit: RateLimitConfig) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    /// Replaces the batch chunk size.
    #[must_use]
    pub const fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Checks that every bound is usable.
    pub fn validate(&self) -> Result<()> {
        for category in CacheCategory::ALL {
            let settings = self.cache(category);
            if settings.capacity == 0 {
                return Err(DataError::InvalidParameter(format!(
                    "{category} cache capacity must be greater than zero"
                )));
            }
            if settings.ttl.is_zero() {
                return Err(DataError::InvalidParameter(format!(
                    "{category} cache ttl must be greater than zero"
                )));
            }
            if settings.ttl > MAX_DURATION {
                return Err(DataError::InvalidParameter(format!(
                    "{category} cache ttl must not exceed {} seconds",
                    MAX_DURATION.as_secs()
                )));
            }
        }
        if self.rate_limit.window.is_zero() {
            return Err(DataError::InvalidParameter(
                "rate limit window must be greater than zero".to_string(),
            ));
        }
        if self.rate_limit.window > MAX_DURATION {
            return Err(DataError::InvalidParameter(format!(
                "rate limit window must not exceed {} seconds",
                MAX_DURATION.as_secs()
            )));
        }
        if self.rate_limit.max_calls == 0 {
            return Err(DataError::InvalidParameter(
                "rate limit max calls must be greater than zero".to_string(),
            ));
        }
        if self.batch_size == 0 {
            return Err(DataError::InvalidParameter(
                "batch size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::default();
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.rate_limit.max_calls, 100);
        assert_eq!(config.rate_limit.window, Duration::from_secs(60));
        assert_eq!(config.cache(CacheCategory::Quote).capacity, 1000);
        assert_eq!(config.cache(CacheCategory::Options).capacity, 500);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_with_cache_only_touches_one_category() {
        let config = GatewayConfig::default().with_cache(
            CacheCategory::Search,
            CacheSettings {
                capacity: 3,
                ttl: Duration::from_secs(1),
            },
        );
        assert_eq!(config.cache(CacheCategory::Search).capacity, 3);
        assert_eq!(config.cache(CacheCategory::Quote).capacity, 1000);
    }

    #[test]
    fn test_validate_rejects_zero_bounds() {
        let zero_batch = GatewayConfig::default().with_batch_size(0);
        assert!(matches!(
            zero_batch.validate(),
            Err(DataError::InvalidParameter(_))
        ));

        let zero_calls = GatewayConfig::default().with_rate_limit(RateLimitConfig {
            window: Duration::from_secs(60),
            max_calls: 0,
        });
        assert!(zero_calls.validate().is_err());

        let zero_capacity = GatewayConfig::default().with_cache(
            CacheCategory::Quote,
            CacheSettings {
                capacity: 0,
                ttl: Duration::from_secs(1),
            },
        );
        assert!(zero_capacity.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_overlong_durations() {
        let huge_ttl = GatewayConfig::default().with_cache(
            CacheCategory::Quote,
            CacheSettings {
                capacity: 10,
                ttl: Duration::from_secs(u64::MAX),
            },
        );
        assert!(matches!(
            huge_ttl.validate(),
            Err(DataError::InvalidParameter(_))
        ));

        let huge_window = GatewayConfig::default().with_rate_limit(RateLimitConfig {
            window: Duration::MAX,
            max_calls: 100,
        });
        assert!(huge_window.validate().is_err());

        let year_ttl = GatewayConfig::default().with_cache(
            CacheCategory::Dividends,
            CacheSettings {
                capacity: 10,
                ttl: MAX_DURATION,
            },
        );
        assert!(year_ttl.validate().is_ok());
    }
}
