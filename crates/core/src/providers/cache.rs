use std::collections::HashMap;
use std::time::{Duration, Instant};

/// In-process cache of quoted values (prices and FX rates), owned by the
/// quote provider instance.
///
/// Bounded and TTL'd: both limits are fixed at construction. Entries past
/// their TTL are treated as absent, and when the cache is full the stalest
/// entry is evicted to make room. Keys are the provider's resolved symbols
/// (e.g., "px:hk00700", "fx:USDHKD").
#[derive(Debug)]
pub struct QuoteCache {
    entries: HashMap<String, CachedQuote>,
    capacity: usize,
    ttl: Duration,
}

#[derive(Debug, Clone, Copy)]
struct CachedQuote {
    value: f64,
    fetched_at: Instant,
}

impl QuoteCache {
    /// Create a cache holding at most `capacity` entries, each valid for `ttl`.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            capacity,
            ttl,
        }
    }

    /// Get a cached value if present and not expired.
    pub fn get(&self, key: &str) -> Option<f64> {
        let entry = self.entries.get(key)?;
        if entry.fetched_at.elapsed() > self.ttl {
            return None;
        }
        Some(entry.value)
    }

    /// Insert or refresh a value. Evicts the stalest entry when full.
    pub fn insert(&mut self, key: impl Into<String>, value: f64) {
        let key = key.into();
        if self.capacity == 0 {
            return;
        }
        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            // Evict the entry fetched longest ago
            if let Some(stalest) = self
                .entries
                .iter()
                .min_by_key(|(_, e)| e.fetched_at)
                .map(|(k, _)| k.clone())
            {
                self.entries.remove(&stalest);
            }
        }
        self.entries.insert(
            key,
            CachedQuote {
                value,
                fetched_at: Instant::now(),
            },
        );
    }

    /// Number of entries currently held (including expired ones not yet evicted).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all cached values.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
