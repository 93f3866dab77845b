//! Removal notifications.
//!
//! Every entry that leaves a cache (evicted, expired or deleted) can be
//! reported to a caller-supplied listener. Listeners never run on the thread
//! performing the cache operation: notices are queued to a dedicated
//! background thread, so a slow or panicking listener cannot stall or break
//! cache operations.

use std::fmt;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;

use tracing::{debug, warn};

// Name of the background thread delivering notices
const NOTIFY_THREAD_NAME: &str = "lru-ttl-cache-notify";

/// Describes why an entry was removed from the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemovalCause {
    /// The entry was the least recently used one when an insert overflowed the cache.
    Evicted,
    /// The entry's time-to-live had elapsed when it was next accessed.
    Expired,
    /// The entry was removed by `delete` or `clear`.
    Explicit,
}

impl fmt::Display for RemovalCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemovalCause::Evicted => write!(f, "evicted due to capacity"),
            RemovalCause::Expired => write!(f, "expired (TTL elapsed)"),
            RemovalCause::Explicit => write!(f, "explicitly removed"),
        }
    }
}

/// A listener invoked with the key, value and cause of every removed entry.
///
/// The listener runs on a background thread, after the cache operation that
/// removed the entry has released its lock. It is invoked exactly once per
/// removed entry. Delivery is best-effort: there is no ordering guarantee
/// relative to the triggering call returning.
pub type RemovalListener<K, V> = Arc<dyn Fn(K, V, RemovalCause) + Send + Sync + 'static>;

/// An entry that left the cache, waiting to be handed to the listener.
pub(crate) struct RemovalNotice<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) cause: RemovalCause,
}

/// Queues removal notices to a background thread running the listener.
///
/// The thread exits once every `Dispatcher` handle is dropped and the queue
/// is drained. It is detached: dropping a cache does not wait for pending
/// notices to be delivered.
pub(crate) struct Dispatcher<K, V> {
    sender: Sender<RemovalNotice<K, V>>,
}

impl<K, V> Dispatcher<K, V>
where
    K: Send + 'static,
    V: Send + 'static,
{
    /// Starts the background thread for `listener`.
    pub(crate) fn spawn(listener: RemovalListener<K, V>) -> io::Result<Self> {
        let (sender, receiver) = mpsc::channel();
        thread::Builder::new()
            .name(NOTIFY_THREAD_NAME.to_string())
            .spawn(move || deliver(listener, receiver))?;
        debug!(thread = NOTIFY_THREAD_NAME, "removal notification thread started");
        Ok(Self { sender })
    }

    /// Queues a notice. Never blocks.
    pub(crate) fn dispatch(&self, notice: RemovalNotice<K, V>) {
        if self.sender.send(notice).is_err() {
            warn!("removal notification thread is gone, dropping notice");
        }
    }
}

fn deliver<K, V>(listener: RemovalListener<K, V>, receiver: Receiver<RemovalNotice<K, V>>) {
    for RemovalNotice { key, value, cause } in receiver {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| listener(key, value, cause)));
        if outcome.is_err() {
            warn!(%cause, "removal listener panicked, notice dropped");
        }
    }
    debug!(thread = NOTIFY_THREAD_NAME, "removal notification thread exiting");
}
