#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/gateway/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core traits and types for the market data gateway.
//!
//! This crate provides the foundational abstractions shared by every gateway crate:
//!
//! - [`MarketDataSource`](provider::MarketDataSource) - Upstream fetch collaborator
//! - [`CacheCategory`](category::CacheCategory) - The five cached data categories
//! - [`CacheKey`](types::CacheKey) - Normalized, category-aware cache keys
//! - [`GatewayConfig`](config::GatewayConfig) - Startup configuration
//! - [`payload`] - Canonical response payloads
//! - [`DataError`](error::DataError) - Classified errors

/// Cache category definitions.
pub mod category;
/// Startup configuration.
pub mod config;
/// Error types for gateway operations.
pub mod error;
/// Canonical response payloads.
pub mod payload;
/// Provider traits for fetching upstream data.
pub mod provider;
/// Core data types (Symbol, CacheKey, raw upstream records).
pub mod types;

// Re-export commonly used items at crate root
pub use category::CacheCategory;
pub use config::{CacheSettings, GatewayConfig, RateLimitConfig};
pub use error::{DataError, ErrorKind, Result};
pub use payload::{
    ChartPayload, DividendsPayload, OptionChainPayload, QuotePayload, SearchQuote, SearchResults,
};
pub use provider::{DataProvider, MarketDataSource};
pub use types::{CacheKey, DividendEvent, OptionChainData, OptionContract, Symbol, TickerInfo};
