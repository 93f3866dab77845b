use lru_ttl_cache::{CacheConfig, LruCache, RemovalCause};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const THREAD_COUNT: usize = 4;
const OPERATIONS_PER_THREAD: usize = 1_000_000;
const CACHE_CAPACITY: usize = 100_000;
const KEY_SPACE_SIZE: usize = 150_000;
const TTL: Duration = Duration::from_millis(200);

fn main() {
    println!("Starting LruCache pressure test with:");
    println!("- {} threads", THREAD_COUNT);
    println!("- {} operations per thread", OPERATIONS_PER_THREAD);
    println!("- Cache capacity: {}", CACHE_CAPACITY);
    println!("- Key space size: {}", KEY_SPACE_SIZE);
    println!("- TTL: {:?}", TTL);

    // Count removals by cause on the notification thread
    let evicted = Arc::new(AtomicUsize::new(0));
    let expired = Arc::new(AtomicUsize::new(0));
    let deleted = Arc::new(AtomicUsize::new(0));
    let config = {
        let (evicted, expired, deleted) = (evicted.clone(), expired.clone(), deleted.clone());
        CacheConfig::new()
            .ttl(TTL)
            .initial_capacity(CACHE_CAPACITY)
            .on_removal(move |_key: String, _value: String, cause| {
                let counter = match cause {
                    RemovalCause::Evicted => &evicted,
                    RemovalCause::Expired => &expired,
                    RemovalCause::Explicit => &deleted,
                };
                counter.fetch_add(1, Ordering::Relaxed);
            })
    };
    let cache = Arc::new(LruCache::with_config(CACHE_CAPACITY, config).unwrap());

    let get_hits = Arc::new(AtomicUsize::new(0));
    let get_misses = Arc::new(AtomicUsize::new(0));
    let puts = Arc::new(AtomicUsize::new(0));
    let deletes = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::with_capacity(THREAD_COUNT);
    let start_time = Instant::now();

    for thread_id in 0..THREAD_COUNT {
        let cache = Arc::clone(&cache);
        let get_hits = Arc::clone(&get_hits);
        let get_misses = Arc::clone(&get_misses);
        let puts = Arc::clone(&puts);
        let deletes = Arc::clone(&deletes);

        let handle = thread::spawn(move || {
            // Mix of operations: 75% gets, 20% puts, 5% deletes
            for i in 0..OPERATIONS_PER_THREAD {
                let key = format!("key_{}", (i * 7 + thread_id) % KEY_SPACE_SIZE);
                match i % 20 {
                    0..=3 => {
                        cache.put(key, format!("value_{}_{}", thread_id, i));
                        puts.fetch_add(1, Ordering::Relaxed);
                    }
                    4 => {
                        cache.delete(&key);
                        deletes.fetch_add(1, Ordering::Relaxed);
                    }
                    _ => {
                        if cache.get(&key).is_some() {
                            get_hits.fetch_add(1, Ordering::Relaxed);
                        } else {
                            get_misses.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                }
            }
        });

        handles.push(handle);
    }

    for handle in handles {
        handle.join().unwrap();
    }

    let duration = start_time.elapsed();
    let total_operations = get_hits.load(Ordering::Relaxed)
        + get_misses.load(Ordering::Relaxed)
        + puts.load(Ordering::Relaxed)
        + deletes.load(Ordering::Relaxed);

    // Give the notification thread a moment to drain
    thread::sleep(Duration::from_millis(500));

    println!("\nTest completed in {:.2?}", duration);
    println!("\nStatistics:");
    println!("- Total operations: {}", total_operations);
    println!(
        "- Operations per second: {:.0}",
        total_operations as f64 / duration.as_secs_f64()
    );
    println!("- GET hits: {}", get_hits.load(Ordering::Relaxed));
    println!("- GET misses: {}", get_misses.load(Ordering::Relaxed));
    println!("- PUT operations: {}", puts.load(Ordering::Relaxed));
    println!("- DELETE operations: {}", deletes.load(Ordering::Relaxed));
    println!(
        "- Hit rate: {:.2}%",
        get_hits.load(Ordering::Relaxed) as f64 * 100.0
            / (get_hits.load(Ordering::Relaxed) + get_misses.load(Ordering::Relaxed)) as f64
    );
    println!("- Evictions notified: {}", evicted.load(Ordering::Relaxed));
    println!("- Expirations notified: {}", expired.load(Ordering::Relaxed));
    println!("- Deletions notified: {}", deleted.load(Ordering::Relaxed));
    println!("- Final cache size: {}", cache.len());
}
