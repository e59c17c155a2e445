//! Provider traits for fetching upstream market data.
//!
//! This module defines the core provider traits:
//!
//! - [`DataProvider`] - Base trait for all upstream providers
//! - [`MarketDataSource`] - Raw quote, history, options, dividend and search data
//!
//! Providers return raw upstream data. Shaping into canonical payloads,
//! caching and rate limiting happen in the gateway, never in a provider.

use async_trait::async_trait;
use chrono::NaiveDate;
use polars::prelude::DataFrame;
use std::fmt::Debug;

use crate::{
    error::Result,
    types::{DividendEvent, OptionChainData, Symbol, TickerInfo},
};

/// Column holding bar timestamps (Unix seconds, `i64`) in a history frame.
pub const TIMESTAMP_COLUMN: &str = "timestamp";

/// Base trait for all data providers.
pub trait DataProvider: Send + Sync + Debug {
    /// Returns the name of this provider (e.g., "Yahoo Finance").
    fn name(&self) -> &str;

    /// Returns a description of this provider.
    fn description(&self) -> &str;
}

/// Upstream fetch collaborator used by the gateway.
///
/// Implementations may fail with any [`DataError`](crate::DataError); the
/// gateway classifies and propagates failures without caching them. Any
/// retry policy belongs to the implementation.
#[async_trait]
pub trait MarketDataSource: DataProvider {
    /// Fetches ticker information (price, names, dividend summary).
    async fn ticker_info(&self, symbol: &Symbol) -> Result<TickerInfo>;

    /// Fetches historical bars for a symbol.
    ///
    /// Returns a DataFrame with columns: timestamp (`i64` Unix seconds),
    /// open, high, low, close (`f64`) and volume (`u64`), one row per bar in
    /// ascending time order.
    async fn history(&self, symbol: &Symbol, period: &str, interval: &str) -> Result<DataFrame>;

    /// Fetches the available option expirations, in upstream order.
    async fn option_expirations(&self, symbol: &Symbol) -> Result<Vec<NaiveDate>>;

    /// Fetches calls and puts for one expiration.
    async fn option_chain(&self, symbol: &Symbol, expiration: NaiveDate)
    -> Result<OptionChainData>;

    /// Fetches dividend payments over a period (e.g. "5y").
    async fn dividends(&self, symbol: &Symbol, period: &str) -> Result<Vec<DividendEvent>>;

    /// Resolves a search query into candidate tickers.
    ///
    /// Default implementation treats the query as a comma or whitespace
    /// separated list of tickers.
    async fn search_candidates(&self, query: &str) -> Result<Vec<Symbol>> {
        let mut candidates: Vec<Symbol> = Vec::new();
        for token in query.split(|c: char| c == ',' || c.is_whitespace()) {
            let symbol = Symbol::new(token);
            if !symbol.is_empty() && !candidates.contains(&symbol) {
                candidates.push(symbol);
            }
        }
        Ok(candidates)
    }
}
