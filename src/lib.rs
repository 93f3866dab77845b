//! A bounded, thread-safe LRU cache with lazy TTL expiration and removal
//! notifications.
//!
//! This crate provides two cache implementations:
//!
//! 1. [`LruCache`] - A single-lock LRU cache; every operation is atomic with
//!    respect to every other operation on the same cache
//! 2. [`ShardedLruCache`] - A sharded LRU cache for lower lock contention,
//!    tracking recency per shard
//!
//! # Features
//!
//! - Thread-safe implementations
//! - Bounded entry count with least-recently-used eviction
//! - Optional time-to-live, checked lazily when an entry is accessed
//! - Removal listener invoked on a background thread for every evicted,
//!   expired or deleted entry
//! - Generic key and value types
//!
//! # Examples
//!
//! ```rust
//! use std::time::Duration;
//! use lru_ttl_cache::{Cache, CacheConfig, LruCache, RemovalCause, ShardedLruCache};
//!
//! // A plain LRU cache holding at most 1000 entries
//! let cache: LruCache<String, String> = LruCache::new(1000).unwrap();
//! assert_eq!(cache.put("key".to_string(), "v1".to_string()), None);
//! assert_eq!(cache.put("key".to_string(), "v2".to_string()), Some("v1".to_string()));
//!
//! // Entries expire 30 seconds after their last put; removed entries are reported
//! let config = CacheConfig::new()
//!     .ttl(Duration::from_secs(30))
//!     .on_removal(|key: u64, _value: String, cause: RemovalCause| {
//!         println!("entry {key} {cause}");
//!     });
//! let sessions = LruCache::with_config(100, config).unwrap();
//! sessions.put(42, "answer".to_string());
//! assert_eq!(sessions.get(&42), Some("answer".to_string()));
//! sessions.delete(&42);
//!
//! // Both caches implement the `Cache` trait
//! fn warm(cache: &dyn Cache<u64, u64>) {
//!     for i in 0..10 {
//!         cache.put(i, i * i);
//!     }
//! }
//! let sharded: ShardedLruCache<u64, u64> = ShardedLruCache::new(1000).unwrap();
//! warm(&sharded);
//! assert_eq!(sharded.len(), 10);
//! ```

mod config;
mod error;
pub mod lru_cache;
mod notify;
pub mod sharded_lru_cache;


pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use lru_cache::{Cache, LruCache};
pub use notify::{RemovalCause, RemovalListener};
pub use sharded_lru_cache::ShardedLruCache;
