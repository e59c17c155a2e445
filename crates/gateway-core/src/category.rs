//! Cache category definitions.
//!
//! Every cached payload belongs to exactly one [`CacheCategory`]. Each category
//! has its own capacity and time-to-live so that churn in one (e.g. search)
//! never evicts entries in another (e.g. quotes).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;

/// The five independent data categories served by the gateway.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheCategory {
    /// Latest quote for a symbol.
    Quote,
    /// Historical price series for a symbol, period and interval.
    Historical,
    /// Option chain for a symbol and expiration.
    Options,
    /// Dividend information and history for a symbol.
    Dividends,
    /// Symbol search results for a query.
    Search,
}

impl CacheCategory {
    /// All categories, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Quote,
        Self::Historical,
        Self::Options,
        Self::Dividends,
        Self::Search,
    ];

    /// Prefix used when building cache keys for this category.
    #[must_use]
    pub const fn prefix(&self) -> &'static str {
        match self {
            Self::Quote => "quote",
            Self::Historical => "historical",
            Self::Options => "options",
            Self::Dividends => "dividends",
            Self::Search => "search",
        }
    }

    /// Default time-to-live for entries of this category.
    #[must_use]
    pub const fn default_ttl(&self) -> Duration {
        match self {
            Self::Quote => Duration::from_secs(5 * MINUTE),
            Self::Historical => Duration::from_secs(DAY),
            Self::Options => Duration::from_secs(6 * HOUR),
            Self::Dividends => Duration::from_secs(7 * DAY),
            Self::Search => Duration::from_secs(DAY),
        }
    }

    /// Default maximum number of entries for this category.
    #[must_use]
    pub const fn default_capacity(&self) -> usize {
        match self {
            Self::Quote | Self::Search => 1000,
            Self::Historical | Self::Options | Self::Dividends => 500,
        }
    }

    /// Position of this category in [`CacheCategory::ALL`].
    #[must_use]
    pub const fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for CacheCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}
