use std::collections::hash_map::DefaultHasher;
use std::fmt::Debug;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::lru_cache::{Cache, LruCache};
use crate::notify::Dispatcher;

// Minimum capacity per shard
const MIN_SHARD_CAPACITY: usize = 4;
// Maximum number of shards, must be a power of 2
const MAX_SHARDS: usize = 16;

/// A sharded LRU cache implementation for high-concurrency scenarios.
///
/// This implementation divides the cache into multiple [`LruCache`] shards,
/// each protected by its own mutex, to reduce contention in concurrent
/// access scenarios. The number of shards is automatically determined based
/// on the total capacity, but will not exceed `MAX_SHARDS`.
///
/// Recency is tracked per shard: an insert evicts the least recently used
/// entry of the shard the key hashes to. TTL and removal notifications
/// behave as in [`LruCache`]; all shards share one notification thread.
///
/// # Examples
///
/// ```rust
/// use lru_ttl_cache::ShardedLruCache;
///
/// let cache = ShardedLruCache::new(1000).unwrap();
/// cache.put("key1".to_string(), "value1".to_string());
/// assert_eq!(cache.get(&"key1".to_string()), Some("value1".to_string()));
/// ```
pub struct ShardedLruCache<K, V>
where
    K: Clone + Debug + Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    shards: Vec<LruCache<K, V>>,
    total_capacity: usize,
    num_shards: usize, // Actual number of shards in use
}

impl<K, V> ShardedLruCache<K, V>
where
    K: Clone + Debug + Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Creates a new sharded LRU cache with the specified total capacity and
    /// no expiration.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvalidMaxSize`] if capacity is 0.
    pub fn new(capacity: usize) -> Result<Self> {
        Self::with_config(capacity, CacheConfig::new().initial_capacity(capacity))
    }

    /// Creates a new sharded LRU cache with the specified total capacity.
    ///
    /// The number of shards is automatically determined based on the capacity,
    /// ensuring that each shard has at least `MIN_SHARD_CAPACITY` entries
    /// and the total number of shards is a power of 2 not exceeding `MAX_SHARDS`.
    /// The capacity hint in `config` is split across shards like the capacity.
    pub fn with_config(capacity: usize, config: CacheConfig<K, V>) -> Result<Self> {
        if capacity == 0 {
            return Err(CacheError::InvalidMaxSize(capacity));
        }

        let num_shards = shard_count(capacity);
        let dispatcher = match config.removal_listener {
            Some(listener) => Some(Arc::new(Dispatcher::spawn(listener)?)),
            None => None,
        };
        let ttl: Option<Duration> = config.ttl;
        let hint_per_shard = config
            .initial_capacity
            .map(|hint| hint.div_ceil(num_shards));

        let base_shard_capacity = capacity / num_shards;
        let remaining_capacity = capacity % num_shards;

        let mut shards = Vec::with_capacity(num_shards);
        for i in 0..num_shards {
            let shard_capacity = if i < remaining_capacity {
                base_shard_capacity + 1
            } else {
                base_shard_capacity
            };
            shards.push(LruCache::from_parts(
                shard_capacity,
                ttl,
                hint_per_shard,
                dispatcher.clone(),
            )?);
        }
        debug!(capacity, num_shards, "created sharded LRU cache");

        Ok(Self {
            shards,
            total_capacity: capacity,
            num_shards,
        })
    }

    /// Returns the total capacity of the cache.
    pub fn capacity(&self) -> usize {
        self.total_capacity
    }

    /// Returns the number of shards in the cache.
    pub fn num_shards(&self) -> usize {
        self.num_shards
    }

    // Internal method to determine which shard a key belongs to
    fn shard_index(&self, key: &K) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        let hash = hasher.finish();
        (hash as usize) & (self.num_shards - 1)
    }

    fn shard(&self, key: &K) -> &LruCache<K, V> {
        &self.shards[self.shard_index(key)]
    }

    /// Retrieves a value from the cache by its key.
    ///
    /// If the key exists and has not expired, the value is cloned and
    /// returned, and the entry is marked as most recently used within its
    /// shard.
    pub fn get(&self, key: &K) -> Option<V> {
        self.shard(key).get(key)
    }

    /// Inserts a key-value pair into the cache.
    ///
    /// If the key already exists, the value is updated and the old value
    /// is returned. If the key's shard is full, its least recently used
    /// entry is evicted.
    pub fn put(&self, key: K, value: V) -> Option<V> {
        self.shard(&key).put(key, value)
    }

    /// Removes an entry from the cache by its key.
    pub fn delete(&self, key: &K) -> Option<V> {
        self.shard(key).delete(key)
    }

    /// Returns true if `key` is present and not expired.
    pub fn contains(&self, key: &K) -> bool {
        self.shard(key).contains(key)
    }

    /// Returns the number of entries in the cache.
    pub fn len(&self) -> usize {
        self.shards.iter().map(LruCache::len).sum()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.shards.iter().all(LruCache::is_empty)
    }

    /// Removes all entries from the cache.
    pub fn clear(&self) {
        for shard in &self.shards {
            shard.clear();
        }
    }
}

// Largest power of two not exceeding `MAX_SHARDS` that still leaves every
// shard at least `MIN_SHARD_CAPACITY` entries (always at least one shard).
fn shard_count(capacity: usize) -> usize {
    let theoretical_shards = capacity / MIN_SHARD_CAPACITY;
    if theoretical_shards >= MAX_SHARDS {
        MAX_SHARDS
    } else {
        let mut n = 1;
        while n * 2 <= theoretical_shards && n < MAX_SHARDS {
            n *= 2;
        }
        n
    }
}

impl<K, V> Cache<K, V> for ShardedLruCache<K, V>
where
    K: Clone + Debug + Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn get(&self, key: &K) -> Option<V> {
        self.get(key)
    }

    fn put(&self, key: K, value: V) -> Option<V> {
        self.put(key, value)
    }

    fn delete(&self, key: &K) -> Option<V> {
        self.delete(key)
    }

    fn len(&self) -> usize {
        self.len()
    }

    fn is_empty(&self) -> bool {
        self.is_empty()
    }

    fn clear(&self) {
        self.clear()
    }
}
