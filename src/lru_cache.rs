use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::mem;
use std::ptr::NonNull;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::notify::{Dispatcher, RemovalCause, RemovalNotice};

// Upper bound on the index slots allocated up front; larger caches grow on demand
const MAX_PREALLOCATED_ENTRIES: usize = 1 << 16;

/// The core trait that defines the behavior of a cache implementation.
///
/// This trait provides the basic operations that any cache implementation
/// must support, including get, put, delete, and various utility methods.
///
/// # Type Parameters
///
/// * `K` - The type of keys used in the cache. Must implement `Clone + Debug + Hash + Eq + Send + Sync + 'static`
/// * `V` - The type of values stored in the cache. Must implement `Clone + Send + Sync + 'static`
pub trait Cache<K, V>: Send + Sync
where
    K: Clone + Debug + Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Retrieves a value from the cache by its key.
    ///
    /// If the key exists and has not expired, the value is cloned and
    /// returned, and the entry is marked as most recently used. An expired
    /// entry is removed and reported as absent.
    fn get(&self, key: &K) -> Option<V>;

    /// Inserts a key-value pair into the cache.
    ///
    /// If the key already exists, the value is updated and the old value
    /// is returned. If the insert overflows the cache, the least recently
    /// used entry is evicted.
    ///
    /// # Returns
    ///
    /// * `Some(V)` if the key already existed (returns the old value, even
    ///   if its entry had expired)
    /// * `None` if the key didn't exist
    fn put(&self, key: K, value: V) -> Option<V>;

    /// Removes an entry from the cache by its key.
    ///
    /// # Returns
    ///
    /// * `Some(V)` if the key existed (returns the removed value)
    /// * `None` if the key didn't exist or its entry had expired
    fn delete(&self, key: &K) -> Option<V>;

    /// Returns the number of entries in the cache.
    fn len(&self) -> usize;

    /// Returns true if the cache is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes all entries from the cache.
    fn clear(&self);
}

// Internal node structure for the doubly linked list
struct Node<K, V> {
    key: K,
    value: V,
    expires_at: Option<Instant>,
    prev: *mut Node<K, V>,
    next: *mut Node<K, V>,
}

impl<K, V> Node<K, V> {
    fn new(key: K, value: V, expires_at: Option<Instant>) -> Self {
        Self {
            key,
            value,
            expires_at,
            prev: std::ptr::null_mut(),
            next: std::ptr::null_mut(),
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        matches!(self.expires_at, Some(at) if now >= at)
    }

    fn into_notice(self, cause: RemovalCause) -> RemovalNotice<K, V> {
        RemovalNotice {
            key: self.key,
            value: self.value,
            cause,
        }
    }
}

// Internal doubly linked list implementation
struct DoublyLinkedList<K, V> {
    head: *mut Node<K, V>,
    tail: *mut Node<K, V>,
    len: usize,
}

impl<K, V> DoublyLinkedList<K, V> {
    fn new() -> Self {
        Self {
            head: std::ptr::null_mut(),
            tail: std::ptr::null_mut(),
            len: 0,
        }
    }

    // Insert node at the front of the list
    fn push_front(&mut self, node: *mut Node<K, V>) {
        unsafe {
            (*node).prev = std::ptr::null_mut();
            (*node).next = self.head;

            if !self.head.is_null() {
                (*self.head).prev = node;
            } else {
                self.tail = node;
            }
            self.head = node;
            self.len += 1;
        }
    }

    // Unlink a node that is currently in the list
    fn remove(&mut self, node: *mut Node<K, V>) {
        unsafe {
            let prev = (*node).prev;
            let next = (*node).next;

            if !prev.is_null() {
                (*prev).next = next;
            } else {
                self.head = next;
            }

            if !next.is_null() {
                (*next).prev = prev;
            } else {
                self.tail = prev;
            }

            (*node).prev = std::ptr::null_mut();
            (*node).next = std::ptr::null_mut();
            self.len -= 1;
        }
    }

    fn pop_back(&mut self) -> Option<*mut Node<K, V>> {
        if self.tail.is_null() {
            return None;
        }
        let old_tail = self.tail;
        self.remove(old_tail);
        Some(old_tail)
    }

    fn len(&self) -> usize {
        self.len
    }

    fn move_to_front(&mut self, node: *mut Node<K, V>) {
        if self.head == node {
            return;
        }
        self.remove(node);
        self.push_front(node);
    }
}

// List and index, always updated together under the cache lock.
// Every pointer in `map` refers to a live, boxed node linked into `list`.
struct Inner<K, V> {
    list: DoublyLinkedList<K, V>,
    map: HashMap<K, NonNull<Node<K, V>>>,
}

// The raw pointers are only dereferenced while the owning mutex is held.
unsafe impl<K: Send, V: Send> Send for Inner<K, V> {}

impl<K, V> Inner<K, V>
where
    K: Hash + Eq,
{
    fn with_capacity(capacity: usize) -> Self {
        Self {
            list: DoublyLinkedList::new(),
            map: HashMap::with_capacity(capacity),
        }
    }

    fn find(&self, key: &K) -> Option<*mut Node<K, V>> {
        self.map.get(key).map(|node| node.as_ptr())
    }

    fn push_front(&mut self, key: K, node: Box<Node<K, V>>) {
        let node = NonNull::from(Box::leak(node));
        self.list.push_front(node.as_ptr());
        self.map.insert(key, node);
    }

    // Unlinks `node` from both structures and takes back ownership of it.
    // `node` must have been obtained from `find` under the same lock.
    fn detach(&mut self, node: *mut Node<K, V>) -> Box<Node<K, V>> {
        self.list.remove(node);
        let node = unsafe { Box::from_raw(node) };
        self.map.remove(&node.key);
        node
    }

    fn pop_lru(&mut self) -> Option<Box<Node<K, V>>> {
        let node = self.list.pop_back()?;
        let node = unsafe { Box::from_raw(node) };
        self.map.remove(&node.key);
        Some(node)
    }

    fn drain(&mut self) -> Vec<Box<Node<K, V>>> {
        let mut nodes = Vec::with_capacity(self.list.len());
        while let Some(node) = self.pop_lru() {
            nodes.push(node);
        }
        nodes
    }
}

impl<K, V> Drop for Inner<K, V> {
    fn drop(&mut self) {
        let mut current = self.list.head;
        while !current.is_null() {
            unsafe {
                let next = (*current).next;
                drop(Box::from_raw(current));
                current = next;
            }
        }
    }
}

/// A bounded LRU cache with optional lazy TTL expiration.
///
/// A `HashMap` index gives O(1) lookups into a doubly linked list that keeps
/// entries in recency order. Both live behind a single mutex, so every
/// operation is atomic with respect to every other operation on the same
/// cache. Expired entries are only discovered and removed when they are
/// accessed; there is no background sweep.
///
/// When a removal listener is configured, every evicted, expired or deleted
/// entry is handed to it on a background thread after the lock is released.
///
/// # Type Parameters
///
/// * `K` - The type of keys used in the cache. Must implement `Clone + Debug + Hash + Eq + Send + Sync + 'static`
/// * `V` - The type of values stored in the cache. Must implement `Clone + Send + Sync + 'static`
///
/// # Examples
///
/// ```rust
/// use lru_ttl_cache::LruCache;
///
/// let cache = LruCache::new(2).unwrap();
/// cache.put("key1".to_string(), "value1".to_string());
/// cache.put("key2".to_string(), "value2".to_string());
/// cache.put("key3".to_string(), "value3".to_string());
///
/// assert_eq!(cache.get(&"key1".to_string()), None);
/// assert_eq!(cache.get(&"key3".to_string()), Some("value3".to_string()));
/// ```
pub struct LruCache<K, V>
where
    K: Clone + Debug + Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    max_size: usize,
    ttl: Option<Duration>,
    inner: Mutex<Inner<K, V>>,
    dispatcher: Option<Arc<Dispatcher<K, V>>>,
}

impl<K, V> LruCache<K, V>
where
    K: Clone + Debug + Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Creates an LRU cache without expiration, pre-sized for `max_size` entries.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvalidMaxSize`] if `max_size` is 0.
    pub fn new(max_size: usize) -> Result<Self> {
        Self::with_config(max_size, CacheConfig::new().initial_capacity(max_size))
    }

    /// Creates an LRU cache without expiration, with a distinct initial capacity.
    pub fn with_initial_capacity(initial_capacity: usize, max_size: usize) -> Result<Self> {
        Self::with_config(
            max_size,
            CacheConfig::new().initial_capacity(initial_capacity),
        )
    }

    /// Creates a cache holding at most `max_size` entries, configured by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvalidMaxSize`] if `max_size` is 0, or
    /// [`CacheError::Dispatcher`] if the removal notification thread could
    /// not be started.
    pub fn with_config(max_size: usize, config: CacheConfig<K, V>) -> Result<Self> {
        let dispatcher = match config.removal_listener {
            Some(listener) => Some(Arc::new(Dispatcher::spawn(listener)?)),
            None => None,
        };
        Self::from_parts(max_size, config.ttl, config.initial_capacity, dispatcher)
    }

    pub(crate) fn from_parts(
        max_size: usize,
        ttl: Option<Duration>,
        initial_capacity: Option<usize>,
        dispatcher: Option<Arc<Dispatcher<K, V>>>,
    ) -> Result<Self> {
        if max_size == 0 {
            return Err(CacheError::InvalidMaxSize(max_size));
        }
        // An insert may briefly hold one entry over the bound before evicting.
        let capacity = initial_capacity
            .unwrap_or(0)
            .min(max_size.saturating_add(1))
            .min(MAX_PREALLOCATED_ENTRIES);
        debug!(max_size, ?ttl, capacity, "created LRU cache");

        Ok(Self {
            max_size,
            ttl,
            inner: Mutex::new(Inner::with_capacity(capacity)),
            dispatcher,
        })
    }

    /// Returns the maximum number of entries the cache holds.
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Returns the time-to-live applied to entries, if any.
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Retrieves a value and marks the entry as most recently used.
    ///
    /// An entry whose TTL has elapsed is removed, reported to the removal
    /// listener with [`RemovalCause::Expired`], and `None` is returned.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = Instant::now();
        let expired = {
            let mut inner = self.inner.lock();
            let node = inner.find(key)?;
            if unsafe { (*node).is_expired(now) } {
                inner.detach(node)
            } else {
                inner.list.move_to_front(node);
                return Some(unsafe { (*node).value.clone() });
            }
        };

        debug!(key = ?expired.key, "expired entry removed on access");
        self.notify(*expired, RemovalCause::Expired);
        None
    }

    /// Inserts or updates `key`, returning the previous value.
    ///
    /// Updating an existing key replaces its value, refreshes its
    /// expiration and promotes it; the cache size does not change. The
    /// replaced value is returned even if its entry had expired, and is not
    /// reported to the removal listener since it goes back to the caller.
    ///
    /// Inserting a new key that pushes the cache over its bound evicts the
    /// least recently used entry, which is reported with
    /// [`RemovalCause::Evicted`].
    pub fn put(&self, key: K, value: V) -> Option<V> {
        let now = Instant::now();
        // A TTL too large to represent as an instant never expires
        let expires_at = self.ttl.and_then(|ttl| now.checked_add(ttl));

        let mut inner = self.inner.lock();
        if let Some(node) = inner.find(&key) {
            let old_value = unsafe {
                (*node).expires_at = expires_at;
                mem::replace(&mut (*node).value, value)
            };
            inner.list.move_to_front(node);
            return Some(old_value);
        }

        inner.push_front(key.clone(), Box::new(Node::new(key, value, expires_at)));
        let evicted = if inner.map.len() > self.max_size {
            inner.pop_lru()
        } else {
            None
        };
        drop(inner);

        if let Some(evicted) = evicted {
            debug!(key = ?evicted.key, max_size = self.max_size, "evicted least recently used entry");
            self.notify(*evicted, RemovalCause::Evicted);
        }
        None
    }

    /// Removes `key`, returning its value if it was present and not expired.
    ///
    /// Deleting a missing key is a no-op. A removed entry is reported with
    /// [`RemovalCause::Explicit`], or [`RemovalCause::Expired`] if its TTL had
    /// already elapsed.
    pub fn delete(&self, key: &K) -> Option<V> {
        let now = Instant::now();
        let removed = {
            let mut inner = self.inner.lock();
            let node = inner.find(key)?;
            inner.detach(node)
        };

        let expired = removed.is_expired(now);
        let cause = if expired {
            RemovalCause::Expired
        } else {
            RemovalCause::Explicit
        };
        match &self.dispatcher {
            Some(dispatcher) => {
                let value = (!expired).then(|| removed.value.clone());
                dispatcher.dispatch((*removed).into_notice(cause));
                value
            }
            None => (!expired).then_some(removed.value),
        }
    }

    /// Returns true if `key` is present and not expired.
    ///
    /// Unlike [`get`](Self::get), this does not promote the entry and does
    /// not remove it when expired.
    pub fn contains(&self, key: &K) -> bool {
        let now = Instant::now();
        let inner = self.inner.lock();
        match inner.find(key) {
            Some(node) => unsafe { !(*node).is_expired(now) },
            None => false,
        }
    }

    /// Returns the number of entries in the cache.
    ///
    /// Expired entries that have not been accessed since they expired are
    /// still counted.
    pub fn len(&self) -> usize {
        self.inner.lock().map.len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().map.is_empty()
    }

    /// Removes all entries, reporting each one to the removal listener.
    pub fn clear(&self) {
        let removed = self.inner.lock().drain();
        trace!(count = removed.len(), "cache cleared");

        let now = Instant::now();
        for node in removed {
            let cause = if node.is_expired(now) {
                RemovalCause::Expired
            } else {
                RemovalCause::Explicit
            };
            self.notify(*node, cause);
        }
    }

    // Hands a removed node to the listener, or drops it when none is set.
    // Must be called after the lock is released.
    fn notify(&self, node: Node<K, V>, cause: RemovalCause) {
        if let Some(dispatcher) = &self.dispatcher {
            dispatcher.dispatch(node.into_notice(cause));
        }
    }
}

impl<K, V> Cache<K, V> for LruCache<K, V>
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
