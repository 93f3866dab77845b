//! Construction-time cache options.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::notify::{RemovalCause, RemovalListener};

/// Options consumed once when a cache is built.
///
/// All options are optional:
/// - `ttl` - entries older than this (measured from their last `put`) are
///   treated as absent. Defaults to no expiration; `Duration::ZERO` also
///   means no expiration.
/// - `initial_capacity` - pre-sizing hint for the key index.
/// - `on_removal` - listener notified of every entry leaving the cache.
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
/// use lru_ttl_cache::{CacheConfig, LruCache};
///
/// let config = CacheConfig::new()
///     .ttl(Duration::from_secs(30))
///     .initial_capacity(64)
///     .on_removal(|key: String, _value: Vec<u8>, cause| {
///         println!("{key} left the cache: {cause}");
///     });
/// let cache = LruCache::with_config(1024, config).unwrap();
/// assert_eq!(cache.ttl(), Some(Duration::from_secs(30)));
/// ```
pub struct CacheConfig<K, V> {
    pub(crate) ttl: Option<Duration>,
    pub(crate) initial_capacity: Option<usize>,
    pub(crate) removal_listener: Option<RemovalListener<K, V>>,
}

impl<K, V> CacheConfig<K, V> {
    /// Creates a config with no TTL, no capacity hint and no listener.
    pub fn new() -> Self {
        Self {
            ttl: None,
            initial_capacity: None,
            removal_listener: None,
        }
    }

    /// Sets the time-to-live applied to every entry on insert and update.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = (!ttl.is_zero()).then_some(ttl);
        self
    }

    /// Sets the number of entries the key index is pre-sized for.
    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = Some(capacity);
        self
    }

    /// Registers a listener called with every removed entry.
    pub fn on_removal<F>(mut self, listener: F) -> Self
    where
        F: Fn(K, V, RemovalCause) + Send + Sync + 'static,
    {
        self.removal_listener = Some(Arc::new(listener));
        self
    }
}

impl<K, V> Default for CacheConfig<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Clone for CacheConfig<K, V> {
    fn clone(&self) -> Self {
        Self {
            ttl: self.ttl,
            initial_capacity: self.initial_capacity,
            removal_listener: self.removal_listener.clone(),
        }
    }
}

impl<K, V> fmt::Debug for CacheConfig<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheConfig")
            .field("ttl", &self.ttl)
            .field("initial_capacity", &self.initial_capacity)
            .field("removal_listener", &self.removal_listener.is_some())
            .finish()
    }
}
