//! Error types for the cache engine
//!
//! Set and Get never fail; only the engine lifecycle does.

use thiserror::Error;
use tokio::task::JoinError;

// == Cache Error Enum ==
/// Unified error type for the cache engine.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Configuration values rejected by validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The sweeper needs a Tokio runtime to be spawned on
    #[error("No Tokio runtime available to run the sweeper")]
    NoRuntime,

    /// `stop` was called on an engine whose sweeper is already gone
    #[error("Cache engine already stopped")]
    AlreadyStopped,

    /// The sweeper task panicked or was aborted
    #[error("Sweeper task failed: {0}")]
    Sweeper(#[from] JoinError),
}

// == Result Type Alias ==
/// Convenience Result type for the cache engine.
pub type Result<T> = std::result::Result<T, CacheError>;
