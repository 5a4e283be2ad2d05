use dashmap::DashMap;
use std::time::{Duration, Instant};

use crate::market::types::Observation;

/// TTL cache for fetched observations, keyed by (product, platform).
///
/// Lets repeated scans within the TTL window reuse results instead of hitting
/// the same search endpoint again. Stale entries are evicted on read.
pub struct ObservationCache {
    cache: DashMap<String, CachedBatch>,
    ttl: Duration,
}

struct CachedBatch {
    observations: Vec<Observation>,
    fetched_at: Instant,
}

impl ObservationCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: DashMap::new(),
            ttl,
        }
    }

    fn key(product: &str, platform: &str) -> String {
        format!("{}\u{1f}{}", product, platform)
    }

    pub fn insert(&self, product: &str, platform: &str, observations: Vec<Observation>) {
        self.cache.insert(
            Self::key(product, platform),
            CachedBatch {
                observations,
                fetched_at: Instant::now(),
            },
        );
    }

    pub fn get(&self, product: &str, platform: &str) -> Option<Vec<Observation>> {
        let key = Self::key(product, platform);
        self.cache.get(&key).and_then(|entry| {
            if entry.fetched_at.elapsed() > self.ttl {
                drop(entry); // release the read lock before removing
                self.cache.remove(&key);
                None
            } else {
                Some(entry.observations.clone())
            }
        })
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
