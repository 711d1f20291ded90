//! Result cache.
//!
//! Time-bounded, invalidation-aware store of computed stat bundles keyed by
//! (actor, element). Recomputation is lazy: mutations only mark entries
//! dirty, and the next read misses and recomputes. This trades a small
//! staleness window for avoiding recomputation storms when many
//! contributions change in a burst.
//!
//! Every entry carries the collector version stamp its bundle was computed
//! from. A read serves an entry only if the stamp still matches the actor's
//! current version, which closes the race where a bundle computed from a
//! pre-mutation snapshot is stored after the invalidation: such an entry
//! has a stale stamp and is simply never served.

use crate::bundle::StatBundle;
use crate::catalog::ElementIndex;
use crate::ids::ActorId;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

/// Cache key: one actor's bundle for one element.
pub type CacheKey = (ActorId, ElementIndex);

/// Cache tuning knobs. Policy, not mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Entry time-to-live in seconds.
    pub ttl_seconds: u64,
    /// Maximum number of entries before LRU eviction.
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: 3600,
            capacity: 1024,
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    bundle: StatBundle,
    computed_at: Instant,
    stamp: u64,
    dirty: bool,
}

/// Counters observed through [`ResultCache::stats`].
#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

/// A point-in-time view of the cache counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub len: usize,
}

/// Bounded, TTL- and invalidation-aware bundle store.
#[derive(Debug)]
pub struct ResultCache {
    entries: DashMap<CacheKey, CacheEntry>,
    /// Recency order, most recently used at the back. May contain keys of
    /// already-evicted entries; those are skipped during eviction.
    lru: Mutex<VecDeque<CacheKey>>,
    config: CacheConfig,
    counters: Counters,
}

impl ResultCache {
    /// Create a cache with the given configuration.
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: DashMap::new(),
            lru: Mutex::new(VecDeque::new()),
            config,
            counters: Counters::default(),
        }
    }

    /// Fetch the bundle for `key` if it is clean, within TTL, and was
    /// computed at the actor's `current_stamp`. Anything else is a miss.
    pub fn get(&self, key: &CacheKey, current_stamp: u64) -> Option<StatBundle> {
        let hit = self.entries.get(key).and_then(|entry| {
            let fresh = entry.computed_at.elapsed() < Duration::from_secs(self.config.ttl_seconds);
            if !entry.dirty && entry.stamp == current_stamp && fresh {
                Some(entry.bundle.clone())
            } else {
                None
            }
        });
        match hit {
            Some(bundle) => {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                self.touch(key);
                Some(bundle)
            }
            None => {
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// The stored bundle regardless of validity. Used to diff against a
    /// fresh computation for change notifications.
    pub fn peek(&self, key: &CacheKey) -> Option<StatBundle> {
        self.entries.get(key).map(|entry| entry.bundle.clone())
    }

    /// Store a freshly computed bundle, replacing any previous entry whole.
    pub fn put(&self, key: CacheKey, stamp: u64, bundle: StatBundle) {
        if !self.entries.contains_key(&key) {
            self.evict_to_fit();
        }
        self.entries.insert(
            key.clone(),
            CacheEntry {
                bundle,
                computed_at: Instant::now(),
                stamp,
                dirty: false,
            },
        );
        self.touch(&key);
    }

    /// Mark the entry dirty; the next `get` will miss.
    pub fn invalidate(&self, key: &CacheKey) {
        if let Some(mut entry) = self.entries.get_mut(key) {
            entry.dirty = true;
        }
    }

    /// Drop every entry belonging to an actor.
    pub fn remove_actor(&self, actor: &ActorId) {
        self.entries.retain(|key, _| &key.0 != actor);
        if let Ok(mut lru) = self.lru.lock() {
            lru.retain(|key| &key.0 != actor);
        }
    }

    /// Current counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            evictions: self.counters.evictions.load(Ordering::Relaxed),
            len: self.entries.len(),
        }
    }

    /// Move a key to the most-recently-used position.
    fn touch(&self, key: &CacheKey) {
        if let Ok(mut lru) = self.lru.lock() {
            if let Some(pos) = lru.iter().position(|k| k == key) {
                lru.remove(pos);
            }
            lru.push_back(key.clone());
        }
    }

    /// Evict least-recently-used entries until one slot is free.
    fn evict_to_fit(&self) {
        while self.entries.len() >= self.config.capacity {
            let Ok(mut lru) = self.lru.lock() else {
                return;
            };
            let Some(oldest) = lru.pop_front() else {
                return;
            };
            drop(lru);
            if self.entries.remove(&oldest).is_some() {
                self.counters.evictions.fetch_add(1, Ordering::Relaxed);
                debug!(actor = %oldest.0, element = %oldest.1, "evicted cached bundle");
            }
        }
    }
}
