//! Core data types shared by the gateway crates.
//!
//! This module defines:
//!
//! - [`Symbol`] - Normalized trading symbol/ticker
//! - [`CacheKey`] - Category-aware cache key built from normalized inputs
//! - [`TickerInfo`] - Raw ticker information returned by the upstream provider
//! - [`OptionContract`] / [`OptionChainData`] - Raw option chain records
//! - [`DividendEvent`] - A single raw dividend payment

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::category::CacheCategory;

/// A trading symbol/ticker.
///
/// Symbols are trimmed and uppercased on creation, so `"aapl"` and `" AAPL"`
/// are the same symbol.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Symbol(String);

impl Symbol {
    /// Creates a new symbol from a string, converting to uppercase.
    #[must_use]
    pub fn new(s: impl AsRef<str>) -> Self {
        Self(s.as_ref().trim().to_uppercase())
    }

    /// Returns the symbol as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the symbol is empty after normalization.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Symbol {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// A cache key: the owning category plus a deterministic composite string.
///
/// Keys are only built through the per-category constructors, which apply
/// the normalization rules (uppercased symbols, lowercased search queries).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    category: CacheCategory,
    key: String,
}

impl CacheKey {
    /// Key for a quote: `quote:{SYMBOL}`.
    #[must_use]
    pub fn quote(symbol: &Symbol) -> Self {
        Self::build(CacheCategory::Quote, symbol.as_str())
    }

    /// Key for a historical series: `historical:{SYMBOL}:{period}:{interval}`.
    #[must_use]
    pub fn historical(symbol: &Symbol, period: &str, interval: &str) -> Self {
        Self::build(
            CacheCategory::Historical,
            &format!("{symbol}:{period}:{interval}"),
        )
    }

    /// Key for an option chain: `options:{SYMBOL}:{expiration or "first"}`.
    #[must_use]
    pub fn options(symbol: &Symbol, expiration: Option<&str>) -> Self {
        Self::build(
            CacheCategory::Options,
            &format!("{symbol}:{}", expiration.unwrap_or("first")),
        )
    }

    /// Key for dividend data: `dividends:{SYMBOL}:{period}`.
    #[must_use]
    pub fn dividends(symbol: &Symbol, period: &str) -> Self {
        Self::build(CacheCategory::Dividends, &format!("{symbol}:{period}"))
    }

    /// Key for a search query: `search:{query lowercased}`.
    #[must_use]
    pub fn search(query: &str) -> Self {
        Self::build(CacheCategory::Search, &query.trim().to_lowercase())
    }

    fn build(category: CacheCategory, rest: &str) -> Self {
        Self {
            category,
            key: format!("{}:{rest}", category.prefix()),
        }
    }

    /// The category this key belongs to.
    #[must_use]
    pub const fn category(&self) -> CacheCategory {
        self.category
    }

    /// The composite key string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

/// Ticker information as reported by the upstream provider.
///
/// Every field is optional; absent values stay absent and are never
/// synthesized by the gateway.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickerInfo {
    /// Last traded price.
    pub regular_market_price: Option<f64>,
    /// Time of the last trade (Unix seconds).
    pub regular_market_time: Option<i64>,
    /// Previous session close.
    pub previous_close: Option<f64>,
    /// Market capitalization.
    pub market_cap: Option<f64>,
    /// Trading currency.
    pub currency: Option<String>,
    /// Short display name.
    pub short_name: Option<String>,
    /// Full name.
    pub long_name: Option<String>,
    /// Exchange code.
    pub exchange: Option<String>,
    /// Instrument type (EQUITY, ETF, ...).
    pub quote_type: Option<String>,
    /// Annual dividend rate.
    pub dividend_rate: Option<f64>,
    /// Dividend yield.
    pub dividend_yield: Option<f64>,
    /// Most recent ex-dividend date (Unix seconds).
    pub ex_dividend_date: Option<i64>,
    /// Payout ratio.
    pub payout_ratio: Option<f64>,
    /// Five year average dividend yield.
    pub five_year_avg_dividend_yield: Option<f64>,
}

/// One option contract as returned upstream, with its full field set.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OptionContract(pub Map<String, Value>);

impl OptionContract {
    /// Strike price of the contract, if present and numeric.
    #[must_use]
    pub fn strike(&self) -> Option<f64> {
        self.0.get("strike").and_then(Value::as_f64)
    }
}

/// Calls and puts for one expiration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OptionChainData {
    /// Call contracts, in upstream order.
    pub calls: Vec<OptionContract>,
    /// Put contracts, in upstream order.
    pub puts: Vec<OptionContract>,
}

/// A single dividend payment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DividendEvent {
    /// Payment (ex) date.
    pub date: DateTime<Utc>,
    /// Amount paid per share.
    pub amount: f64,
}

impl DividendEvent {
    /// Creates a new dividend event.
    #[must_use]
    pub const fn new(date: DateTime<Utc>, amount: f64) -> Self {
        Self { date, amount }
    }
}
