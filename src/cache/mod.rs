//! Cache Module
//!
//! Provides the in-memory TTL cache: entries, the insertion-ordered store,
//! the engine and its statistics.

mod engine;
mod entry;
mod stats;
mod store;


// Re-export public types
pub use engine::{CachedValue, TtlCache};
pub use entry::{Entry, EntryId};
pub use stats::CacheStats;
pub use store::{FindAll, Iter, Matches, Store};

pub(crate) use engine::Shared;
