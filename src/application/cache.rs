//! Bounded TTL cache with tag invalidation.
//!
//! A process-local key/value store for expensive or frequently repeated
//! computations. Entries expire by TTL, can be invalidated in bulk by tag,
//! and the store is bounded: when `set` pushes it over capacity, expired
//! entries are dropped first, then the oldest-inserted entries.
//!
//! Expiry is lazy: nothing sweeps in the background; an expired entry is
//! removed the moment a `get` observes it (or during an eviction pass).

use crate::application::ports::Clock;
use crate::infrastructure::clock::SystemClock;
use indexmap::IndexMap;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Configuration for a [`TaggedCache`].
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL applied when `set` does not specify one
    pub default_ttl: Duration,
    /// Upper bound on stored entries
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(60),
            max_entries: 1000,
        }
    }
}

/// Error returned when a cache configuration is invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheConfigError {
    /// Max entries must be greater than zero
    ZeroMaxEntries,
}

impl std::fmt::Display for CacheConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheConfigError::ZeroMaxEntries => write!(f, "max_entries must be greater than 0"),
        }
    }
}

impl std::error::Error for CacheConfigError {}

#[derive(Debug)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
    tags: BTreeSet<String>,
}

/// Access statistics, readable without taking the store lock.
#[derive(Debug, Default)]
struct CacheCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

/// A point-in-time view of cache statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CacheStats {
    /// Lookups that returned a live entry
    pub hits: u64,
    /// Lookups that found nothing, or an expired entry
    pub misses: u64,
    /// Hit percentage rounded to a whole number; 0 with no accesses
    pub hit_rate: u32,
    /// Entries currently stored
    pub size: usize,
    /// Entries removed by capacity eviction over the cache's lifetime
    pub evictions: u64,
}

/// Bounded TTL store with tag invalidation.
///
/// Keys are opaque strings; values are cloned out on `get`. Eviction runs
/// only on `set` and drops oldest-inserted entries first - re-reading an
/// entry does not renew its eviction priority, only re-`set`ting it does.
///
/// # Example
/// ```
/// use resilience_toolkit::TaggedCache;
/// use std::time::Duration;
///
/// let cache: TaggedCache<String> = TaggedCache::new();
/// cache.set_with("animal:7", "Luna".to_string(), Some(Duration::from_secs(30)), &["animals"]);
/// assert_eq!(cache.get("animal:7"), Some("Luna".to_string()));
///
/// cache.invalidate_by_tag("animals");
/// assert_eq!(cache.get("animal:7"), None);
/// ```
#[derive(Debug)]
pub struct TaggedCache<V> {
    entries: Mutex<IndexMap<String, CacheEntry<V>>>,
    counters: CacheCounters,
    config: CacheConfig,
    clock: Arc<dyn Clock>,
}

impl<V: Clone> TaggedCache<V> {
    /// Create a cache with default configuration and the system clock.
    pub fn new() -> Self {
        Self::from_parts(CacheConfig::default(), Arc::new(SystemClock::new()))
    }

    /// Create a cache with custom configuration.
    pub fn with_config(config: CacheConfig) -> Result<Self, CacheConfigError> {
        Self::validate(&config)?;
        Ok(Self::from_parts(config, Arc::new(SystemClock::new())))
    }

    /// Create a cache with custom configuration and clock (mainly for testing).
    pub fn with_config_and_clock(
        config: CacheConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, CacheConfigError> {
        Self::validate(&config)?;
        Ok(Self::from_parts(config, clock))
    }

    fn validate(config: &CacheConfig) -> Result<(), CacheConfigError> {
        if config.max_entries == 0 {
            return Err(CacheConfigError::ZeroMaxEntries);
        }
        Ok(())
    }

    fn from_parts(config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(IndexMap::new()),
            counters: CacheCounters::default(),
            config,
            clock,
        }
    }

    /// Store a value under the default TTL with no tags.
    pub fn set(&self, key: impl Into<String>, value: V) {
        self.set_with(key, value, None, &[]);
    }

    /// Store a value with an explicit TTL and tags.
    ///
    /// A `ttl` of zero expires the entry on the very next `get` - a valid
    /// write-then-invalidate pattern. Re-setting an existing key makes it
    /// the newest insertion for eviction purposes.
    pub fn set_with(
        &self,
        key: impl Into<String>,
        value: V,
        ttl: Option<Duration>,
        tags: &[&str],
    ) {
        let key = key.into();
        let now = self.clock.now();
        let entry = CacheEntry {
            value,
            expires_at: now + ttl.unwrap_or(self.config.default_ttl),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        };

        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        // shift_remove + insert moves a re-set key to the back of the
        // insertion order; a plain insert would keep its old position.
        entries.shift_remove(&key);
        entries.insert(key, entry);
        self.evict_over_capacity(&mut entries, now);
    }

    /// Look up a value, counting a hit or miss.
    ///
    /// An entry whose TTL has elapsed is removed as a side effect and
    /// reported as a miss.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().expect("cache mutex poisoned");

        let expired = match entries.get(key) {
            Some(entry) if now < entry.expires_at => {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.shift_remove(key);
        }

        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Remove one entry. Returns whether it existed.
    pub fn invalidate(&self, key: &str) -> bool {
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        entries.shift_remove(key).is_some()
    }

    /// Remove every entry carrying the tag. Returns the number removed.
    ///
    /// O(n) scan over the store; acceptable because the store is bounded
    /// by `max_entries`.
    pub fn invalidate_by_tag(&self, tag: &str) -> usize {
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        let before = entries.len();
        entries.retain(|_, entry| !entry.tags.contains(tag));
        before - entries.len()
    }

    /// Empty the store and reset the hit/miss counters.
    pub fn clear(&self) {
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        entries.clear();
        self.counters.hits.store(0, Ordering::Relaxed);
        self.counters.misses.store(0, Ordering::Relaxed);
    }

    /// Entries currently stored (expired-but-unobserved entries included).
    pub fn len(&self) -> usize {
        self.entries.lock().expect("cache mutex poisoned").len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current statistics.
    pub fn stats(&self) -> CacheStats {
        let hits = self.counters.hits.load(Ordering::Relaxed);
        let misses = self.counters.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total == 0 {
            0
        } else {
            (hits as f64 / total as f64 * 100.0).round() as u32
        };

        CacheStats {
            hits,
            misses,
            hit_rate,
            size: self.len(),
            evictions: self.counters.evictions.load(Ordering::Relaxed),
        }
    }

    /// Bring the store back under `max_entries`: drop expired entries
    /// first, then oldest-inserted entries until at the limit.
    fn evict_over_capacity(&self, entries: &mut IndexMap<String, CacheEntry<V>>, now: Instant) {
        if entries.len() <= self.config.max_entries {
            return;
        }

        let before = entries.len();
        entries.retain(|_, entry| now < entry.expires_at);
        while entries.len() > self.config.max_entries {
            entries.shift_remove_index(0);
        }

        let evicted = (before - entries.len()) as u64;
        self.counters.evictions.fetch_add(evicted, Ordering::Relaxed);
        tracing::debug!(evicted, capacity = self.config.max_entries, "cache evicted entries");
    }
}

impl<V: Clone> Default for TaggedCache<V> {
    fn default() -> Self {
        Self::new()
    }
}
