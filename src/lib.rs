//! Mini TTL Cache - An embedded in-memory key-value cache
//!
//! Entries carry a per-entry TTL and are kept in insertion order. A soft
//! capacity bound evicts the oldest expired entry, and a background sweeper
//! reclaims expired entries over time.

pub mod cache;
pub mod config;
pub mod error;
mod tasks;

pub use cache::{CacheStats, CachedValue, TtlCache};
pub use config::Config;
pub use error::{CacheError, Result};
