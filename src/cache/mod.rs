//! The three shelter caches: parsed variables per buffer state, computed
//! overlays per buffer state and masking configuration, and per-variable
//! line masks.

pub mod memory;
pub mod ttl_lru;

pub use memory::MemoryFootprint;
pub use ttl_lru::{CacheOptions, CacheStats, TtlLruCache};

use crate::config::CacheConfig;
use crate::model::{ExtmarkSpec, LineMask, ParsedVariable, ParsedVariables, QuoteChar, ValueSegment};
use crate::primitives::ContentHash;
use crate::services::time_source::SharedTimeSource;
use serde::Serialize;
use std::time::Duration;

/// Extmark cache key: buffer content plus everything that shapes the overlays
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExtmarkKey {
    pub content_hash: ContentHash,
    pub config: ContentHash,
    pub source: Option<String>,
}

/// Mask cache key: identifies one variable's masking inputs.
///
/// Cached line masks carry absolute columns, so the key includes where every
/// piece of the value sits.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MaskKey {
    pub key: String,
    pub source: Option<String>,
    pub mask_length: Option<usize>,
    pub quote_char: Option<QuoteChar>,
    pub start_line: usize,
    pub end_line: usize,
    pub segments: Vec<ValueSegment>,
    /// Digest of the raw value, so an edited value never reuses a stale mask
    pub value: ContentHash,
    pub config: ContentHash,
}

impl MaskKey {
    pub fn for_variable(
        variable: &ParsedVariable,
        source: Option<&str>,
        mask_length: Option<usize>,
        config: &ContentHash,
    ) -> Self {
        Self {
            key: variable.key.clone(),
            source: source.map(str::to_string),
            mask_length,
            quote_char: variable.quote_char,
            start_line: variable.start_line,
            end_line: variable.end_line,
            segments: variable.segments.clone(),
            value: ContentHash::of_bytes(variable.value.as_bytes()),
            config: config.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ShelterCacheStats {
    pub parsed: CacheStats,
    pub extmarks: CacheStats,
    pub masks: CacheStats,
}

#[derive(Debug)]
pub struct ShelterCaches {
    pub parsed: TtlLruCache<ContentHash, ParsedVariables>,
    pub extmarks: TtlLruCache<ExtmarkKey, Vec<ExtmarkSpec>>,
    pub masks: TtlLruCache<MaskKey, Vec<LineMask>>,
}

impl ShelterCaches {
    pub fn new(config: &CacheConfig, time: SharedTimeSource) -> Self {
        let ttl = (config.ttl_secs > 0).then(|| Duration::from_secs(config.ttl_secs));
        let options = |capacity: usize| {
            CacheOptions::new(capacity)
                .with_ttl(ttl)
                .with_max_memory(config.max_memory_bytes)
        };
        Self {
            parsed: TtlLruCache::new("parsed", options(config.parsed_capacity), time.clone()),
            extmarks: TtlLruCache::new("extmark", options(config.extmark_capacity), time.clone()),
            masks: TtlLruCache::new("mask", options(config.mask_capacity), time),
        }
    }

    pub fn clear_all(&mut self) {
        self.parsed.clear();
        self.extmarks.clear();
        self.masks.clear();
    }

    pub fn cleanup(&mut self) {
        self.parsed.cleanup();
        self.extmarks.cleanup();
        self.masks.cleanup();
    }

    /// Drop the entries computed from one buffer state
    pub fn evict_content(&mut self, content_hash: &ContentHash) {
        let parsed = usize::from(self.parsed.remove(content_hash));
        let extmarks = self.extmarks.remove_where(|key| &key.content_hash == content_hash);
        tracing::debug!(
            "Evicted {} parsed and {} extmark entries for content {}",
            parsed,
            extmarks,
            content_hash
        );
    }

    pub fn stats(&self) -> ShelterCacheStats {
        ShelterCacheStats {
            parsed: self.parsed.stats(),
            extmarks: self.extmarks.stats(),
            masks: self.masks.stats(),
        }
    }
}
