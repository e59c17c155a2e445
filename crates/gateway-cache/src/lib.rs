#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/gateway/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Caching implementations for the market data gateway.
//!
//! - [`TtlCache`] - Generic LRU cache with lazy TTL expiry
//! - [`CacheStore`] - One [`TtlCache`] per cache category
//! - [`CachedPayload`] - Maps a payload type to its category cache

/// Generic TTL cache.
pub mod memory;
/// Per-category cache store.
pub mod store;

pub use memory::TtlCache;
pub use store::{CacheStore, CachedPayload};
