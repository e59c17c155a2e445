#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/gateway/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Cached, rate-limited access to upstream market data.
//!
//! This crate re-exports the core types and provides [`MarketDataGateway`],
//! which routes every query through the five-category cache and a shared
//! sliding-window [`RateLimiter`] before calling the upstream
//! [`MarketDataSource`].
//!
//! # Features
//!
//! - `yahoo` - Yahoo Finance upstream source (enabled by default)
//!
//! # Example
//!
//! ```rust,ignore
//! use gateway::{GatewayConfig, MarketDataGateway};
//!
//! #[tokio::main]
//! async fn main() -> gateway::Result<()> {
//!     let gateway = MarketDataGateway::yahoo(&GatewayConfig::default())?;
//!
//!     let quote = gateway.quote("AAPL").await?;
//!     println!("{:?}", quote.regular_market_price);
//!
//!     let chart = gateway.historical("AAPL", "30d", "1d").await?;
//!     println!("{:?}", chart.series());
//!
//!     Ok(())
//! }
//! ```

// Core types and traits
pub use gateway_core::*;

// Cache implementations
pub use gateway_cache::{CacheStore, CachedPayload, TtlCache};

// Providers
#[cfg(feature = "yahoo")]
pub use gateway_yahoo::YahooProvider;

mod batch;
mod dispatcher;
mod gateway;
mod rate_limit;
pub mod shape;
mod stats;

pub use batch::{BatchCoordinator, BatchEntry, BatchError, BatchResult};
pub use dispatcher::{FetchDispatcher, Upstream};
pub use gateway::{
    DEFAULT_DIVIDEND_PERIOD, DEFAULT_HISTORY_INTERVAL, DEFAULT_HISTORY_PERIOD, GatewayStatus,
    MarketDataGateway,
};
pub use rate_limit::RateLimiter;
pub use stats::{GatewayStats, StatsSnapshot};
