//! Error types for cache construction.
//!
//! Lookups, inserts and deletes never fail; the only failures happen while
//! building a cache.

use thiserror::Error;

/// Errors returned by the cache constructors.
#[derive(Error, Debug)]
pub enum CacheError {
    /// The entry bound must hold at least one entry.
    #[error("invalid max size {0}: a cache must hold at least one entry")]
    InvalidMaxSize(usize),

    /// The background thread delivering removal notifications could not be started.
    #[error("failed to start removal notification thread: {0}")]
    Dispatcher(#[from] std::io::Error),
}

/// Convenience Result type for cache construction.
pub type Result<T> = std::result::Result<T, CacheError>;
