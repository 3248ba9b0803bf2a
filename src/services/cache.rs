use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::models::RawResult;

/// Default lifetime of a cached search
pub const DEFAULT_TTL: Duration = Duration::from_secs(600);

/// One cached search result set
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub data: Vec<RawResult>,
    pub timestamp: Instant,
}

impl CacheEntry {
    /// An entry is valid while it is younger than the TTL
    pub fn is_valid_at(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.timestamp) < ttl
    }
}

/// In-process search cache
///
/// Entries expire after the TTL. `moka` evicts them on its own schedule; the
/// stored timestamp is checked on every read as well, so a caller never sees
/// a stale entry and expiry can be tested with an explicit clock.
pub struct SearchCache {
    entries: moka::future::Cache<String, CacheEntry>,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl SearchCache {
    pub fn new(ttl: Duration) -> Self {
        let entries = moka::future::Cache::builder().time_to_live(ttl).build();

        Self {
            entries,
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Get cached results for a key
    pub async fn get(&self, key: &str) -> Option<Vec<RawResult>> {
        self.get_at(key, Instant::now()).await
    }

    /// Get cached results as seen at `now`, evicting the entry if it expired
    pub async fn get_at(&self, key: &str, now: Instant) -> Option<Vec<RawResult>> {
        match self.entries.get(key).await {
            Some(entry) if entry.is_valid_at(now, self.ttl) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                tracing::trace!("Cache hit: {}", key);
                Some(entry.data)
            }
            Some(_) => {
                self.entries.invalidate(key).await;
                self.misses.fetch_add(1, Ordering::Relaxed);
                tracing::trace!("Cache entry expired: {}", key);
                None
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                tracing::trace!("Cache miss: {}", key);
                None
            }
        }
    }

    /// Store results under a key
    pub async fn set(&self, key: &str, data: Vec<RawResult>) {
        let entry = CacheEntry {
            data,
            timestamp: Instant::now(),
        };
        self.entries.insert(key.to_string(), entry).await;
        tracing::trace!("Cache set: {}", key);
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;

        CacheStats {
            entries: self.entries.entry_count(),
            hit_count: hits,
            miss_count: misses,
            hit_rate: if total > 0 { hits as f64 / total as f64 } else { 0.0 },
            ttl_secs: self.ttl.as_secs(),
        }
    }
}

impl Default for SearchCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

/// Cache statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: u64,
    pub hit_count: u64,
    pub miss_count: u64,
    pub hit_rate: f64,
    pub ttl_secs: u64,
}

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    /// Build a cache key for a search query
    pub fn search(query: &str) -> String {
        query.to_lowercase()
    }
}
