//! Quote cache
//!
//! In-memory memoization of primary-path quotes, so repeated checkouts for
//! the same route do not call the completion service again.
//!
//! ## Usage
//!
//! ```
//! use shipping_fee_engine::{EstimateRequest, QuoteCache, RuleEstimator};
//!
//! let cache = QuoteCache::new(1000, 3600); // 1000 entries, 1 hour TTL
//! let req = EstimateRequest::new("Manila", "Cebu City", "Cebu");
//!
//! if cache.get(&req).is_none() {
//!     let quote = RuleEstimator::new().quote(&req);
//!     cache.set(&req, quote);
//! }
//! assert!(cache.get(&req).is_some());
//! ```

use crate::geo::normalize;
use crate::{EstimateRequest, EstimateResult};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tracing::debug;

/// Cache entry with expiration
#[derive(Clone)]
struct CacheEntry {
    value: EstimateResult,
    expires_at: SystemTime,
}

struct Store {
    entries: DashMap<QuoteKey, CacheEntry>,
    max_entries: usize,
    ttl: Duration,
}

/// Bounded TTL cache of quotes, cheap to clone and share between tasks.
#[derive(Clone)]
pub struct QuoteCache {
    store: Arc<Store>,
}

impl QuoteCache {
    /// Create a cache holding at most `max_entries` quotes for `ttl_secs` each.
    pub fn new(max_entries: usize, ttl_secs: u64) -> Self {
        Self {
            store: Arc::new(Store {
                entries: DashMap::new(),
                max_entries,
                ttl: Duration::from_secs(ttl_secs),
            }),
        }
    }

    /// Cached quote for this request, if present and not expired.
    pub fn get(&self, req: &EstimateRequest) -> Option<EstimateResult> {
        let key = quote_key(req);
        let now = SystemTime::now();
        if let Some(entry) = self.store.entries.get(&key) {
            if entry.expires_at > now {
                debug!(key = ?key, "quote cache hit");
                return Some(entry.value.clone());
            }
            // Expired
            drop(entry);
            self.evict_if_expired(&key, now);
            debug!(key = ?key, "quote cache expired");
        }
        debug!(key = ?key, "quote cache miss");
        None
    }

    /// Remove `key` only if the entry stored now is still expired at `now`.
    /// A fresh quote written by another task in the meantime survives.
    fn evict_if_expired(&self, key: &QuoteKey, now: SystemTime) {
        self.store
            .entries
            .remove_if(key, |_, entry| entry.expires_at <= now);
    }

    /// Store a quote for this request.
    pub fn set(&self, req: &EstimateRequest, quote: EstimateResult) {
        let key = quote_key(req);
        let store = &self.store;

        // Evict if at capacity
        if store.max_entries > 0
            && store.entries.len() >= store.max_entries
            && !store.entries.contains_key(&key)
        {
            // Collect key first to release all DashMap read-guards
            // before calling remove (avoids shard deadlock).
            let evict_key = store.entries.iter().next().map(|e| e.key().clone());
            if let Some(key_to_evict) = evict_key {
                store.entries.remove(&key_to_evict);
            }
        }

        store.entries.insert(
            key.clone(),
            CacheEntry {
                value: quote,
                expires_at: SystemTime::now() + store.ttl,
            },
        );
        debug!(key = ?key, ttl_secs = store.ttl.as_secs(), "quote cached");
    }

    /// Remove every cached quote.
    pub fn clear(&self) {
        self.store.entries.clear();
        debug!("quote cache cleared");
    }

    /// Number of entries currently held (expired entries included until read).
    pub fn len(&self) -> usize {
        self.store.entries.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.store.entries.is_empty()
    }
}

/// Cache key: normalized seller, buyer city, buyer province, and the bit
/// pattern of the effective weight.
///
/// Fields are kept apart rather than joined into one string, so free text
/// containing a separator cannot collide with another request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QuoteKey {
    seller: String,
    buyer_city: String,
    buyer_province: String,
    weight_bits: u64,
}

/// Cache key for a request. Weight is part of it because the fee depends on it.
pub fn quote_key(req: &EstimateRequest) -> QuoteKey {
    QuoteKey {
        seller: normalize(req.effective_seller()),
        buyer_city: normalize(&req.buyer_city),
        buyer_province: normalize(&req.buyer_province),
        weight_bits: req.effective_weight().to_bits(),
    }
}
