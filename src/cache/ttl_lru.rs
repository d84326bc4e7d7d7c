//! LRU cache with whole-cache TTL expiry, a memory ceiling and statistics.
//!
//! Expiry is checked lazily on access; [`TtlLruCache::cleanup`] performs the
//! same check for hosts that run a periodic cleanup timer.

use super::memory::MemoryFootprint;
use crate::services::time_source::SharedTimeSource;
use serde::Serialize;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Limits for one cache
#[derive(Debug, Clone, Copy)]
pub struct CacheOptions {
    pub capacity: NonZeroUsize,
    /// Whole-cache lifetime; `None` never expires
    pub ttl: Option<Duration>,
    /// Estimated memory ceiling in bytes
    pub max_memory: Option<usize>,
}

impl CacheOptions {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN),
            ttl: None,
            max_memory: None,
        }
    }

    pub fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_max_memory(mut self, max_memory: Option<usize>) -> Self {
        self.max_memory = max_memory;
        self
    }
}

/// Counters reported by [`TtlLruCache::stats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub entries: usize,
    pub memory_bytes: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Debug)]
struct CacheEntry<V> {
    value: Arc<V>,
    size: usize,
}

#[derive(Debug)]
pub struct TtlLruCache<K: Hash + Eq, V> {
    name: &'static str,
    entries: lru::LruCache<K, CacheEntry<V>>,
    options: CacheOptions,
    memory: usize,
    stats: CacheStats,
    /// Start of the current TTL window
    epoch: Instant,
    time: SharedTimeSource,
}

impl<K: Hash + Eq, V: MemoryFootprint> TtlLruCache<K, V> {
    pub fn new(name: &'static str, options: CacheOptions, time: SharedTimeSource) -> Self {
        let epoch = time.now();
        Self {
            name,
            entries: lru::LruCache::new(options.capacity),
            options,
            memory: 0,
            stats: CacheStats::default(),
            epoch,
            time,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn get(&mut self, key: &K) -> Option<Arc<V>> {
        self.expire_if_stale();
        match self.entries.get(key) {
            Some(entry) => {
                self.stats.hits += 1;
                Some(Arc::clone(&entry.value))
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Insert a value, evicting least recently used entries as needed.
    /// Returns the shared handle to the stored value.
    pub fn put(&mut self, key: K, value: V) -> Arc<V> {
        self.expire_if_stale();
        let size = value.estimated_size();
        let value = Arc::new(value);

        if let Some(old) = self.entries.pop(&key) {
            self.memory -= old.size;
        }
        if let Some((_, evicted)) = self.entries.push(
            key,
            CacheEntry {
                value: Arc::clone(&value),
                size,
            },
        ) {
            self.memory -= evicted.size;
            self.stats.evictions += 1;
            tracing::debug!("{} cache: evicted least recently used entry", self.name);
        }
        self.memory += size;
        self.enforce_memory_limit();
        value
    }

    pub fn remove(&mut self, key: &K) -> bool {
        match self.entries.pop(key) {
            Some(entry) => {
                self.memory -= entry.size;
                true
            }
            None => false,
        }
    }

    /// Remove every entry whose key matches. Returns how many were removed.
    pub fn remove_where(&mut self, mut predicate: impl FnMut(&K) -> bool) -> usize
    where
        K: Clone,
    {
        let doomed: Vec<K> = self
            .entries
            .iter()
            .filter(|(k, _)| predicate(k))
            .map(|(k, _)| k.clone())
            .collect();
        doomed.iter().filter(|k| self.remove(k)).count()
    }

    /// Drop every entry and start a new TTL window. Statistics are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.memory = 0;
        self.epoch = self.time.now();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn memory_usage(&self) -> usize {
        self.memory
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            memory_bytes: self.memory,
            ..self.stats
        }
    }

    /// Periodic maintenance: expire, re-check limits and run the self-check
    pub fn cleanup(&mut self) {
        self.expire_if_stale();
        self.enforce_memory_limit();
        self.verify_integrity();
    }

    /// Compare the tracked memory total and entry count against the
    /// entries actually stored. On mismatch the cache is discarded.
    pub fn verify_integrity(&mut self) -> bool {
        let actual: usize = self.entries.iter().map(|(_, e)| e.size).sum();
        let ok = actual == self.memory && self.entries.len() <= self.options.capacity.get();
        if !ok {
            tracing::warn!(
                "{} cache failed self-check (tracked {} bytes, actual {} bytes, {} entries); clearing",
                self.name,
                self.memory,
                actual,
                self.entries.len()
            );
            self.clear();
        }
        ok
    }

    fn expire_if_stale(&mut self) {
        let Some(ttl) = self.options.ttl else {
            return;
        };
        let now = self.time.now();
        if now.duration_since(self.epoch) < ttl {
            return;
        }
        if !self.entries.is_empty() {
            tracing::debug!("{} cache: TTL elapsed, dropping {} entries", self.name, self.entries.len());
            self.stats.expirations += self.entries.len() as u64;
        }
        self.entries.clear();
        self.memory = 0;
        self.epoch = now;
    }

    fn enforce_memory_limit(&mut self) {
        let Some(limit) = self.options.max_memory else {
            return;
        };
        while self.memory > limit {
            let Some((_, evicted)) = self.entries.pop_lru() else {
                break;
            };
            self.memory -= evicted.size;
            self.stats.evictions += 1;
            tracing::debug!("{} cache: evicted entry over memory budget", self.name);
        }
    }

    #[cfg(test)]
    fn corrupt_memory_total(&mut self) {
        self.memory += 1;
    }
}
