use crate::canonical::CacheKey;
use crate::pipeline::FlightRow;
use chrono::{DateTime, Utc};
use lru::LruCache;
use serde::Serialize;
use std::num::NonZeroUsize;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub rows: Arc<[FlightRow]>,
    pub computed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
    pub capacity: usize,
}

/// Memoized pipeline output keyed by canonical criteria.
///
/// Entries are never modified after insertion. Eviction is least-recently-used
/// and only costs a recomputation.
pub struct ResultCache {
    entries: LruCache<CacheKey, CacheEntry>,
    hits: u64,
    misses: u64,
}

impl ResultCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: LruCache::new(capacity),
            hits: 0,
            misses: 0,
        }
    }

    pub fn get(&mut self, key: &CacheKey) -> Option<Arc<[FlightRow]>> {
        match self.entries.get(key) {
            Some(entry) => {
                self.hits += 1;
                log::debug!(
                    "Result cache hit for {} ({} rows, computed {})",
                    key.short(),
                    entry.rows.len(),
                    entry.computed_at
                );
                Some(Arc::clone(&entry.rows))
            }
            None => {
                self.misses += 1;
                log::debug!("Result cache miss for {}", key.short());
                None
            }
        }
    }

    /// Looks at an entry without touching recency or the hit counters.
    pub fn peek(&self, key: &CacheKey) -> Option<&CacheEntry> {
        self.entries.peek(key)
    }

    pub fn put(&mut self, key: CacheKey, rows: Arc<[FlightRow]>) {
        let entry = CacheEntry {
            rows,
            computed_at: Utc::now(),
        };
        if let Some((evicted, _)) = self.entries.push(key.clone(), entry) {
            if evicted != key {
                log::debug!("Evicted cached result {}", evicted.short());
            }
        }
    }

    pub fn clear(&mut self) {
        let dropped = self.entries.len();
        self.entries.clear();
        log::info!("Cleared {} cached results", dropped);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            entries: self.entries.len(),
            capacity: self.entries.cap().get(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::CriteriaCanonicalizer;
    use crate::criteria::{FilterCriteria, TimeBucket};
    use crate::pipeline::Leg;
    use crate::record::sample_record;

    fn key_for(bucket: TimeBucket) -> CacheKey {
        CriteriaCanonicalizer::key(&FilterCriteria {
            time_bucket: bucket,
            ..Default::default()
        })
    }

    fn rows() -> Arc<[FlightRow]> {
        vec![FlightRow {
            leg: Leg::OneWay,
            record: Arc::new(sample_record()),
        }]
        .into()
    }

    #[test]
    fn test_hit_and_miss_counting() {
        let mut cache = ResultCache::new(NonZeroUsize::new(4).unwrap());
        let key = key_for(TimeBucket::Morning);

        assert!(cache.get(&key).is_none());
        cache.put(key.clone(), rows());
        assert_eq!(cache.get(&key).unwrap().len(), 1);
        assert!(cache.get(&key).is_some());

        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses, stats.entries), (2, 1, 1));
    }

    #[test]
    fn test_lru_eviction() {
        let mut cache = ResultCache::new(NonZeroUsize::new(2).unwrap());
        let morning = key_for(TimeBucket::Morning);
        let night = key_for(TimeBucket::Night);
        let evening = key_for(TimeBucket::Evening);

        cache.put(morning.clone(), rows());
        cache.put(night.clone(), rows());
        // Touch morning so night becomes the eviction candidate.
        cache.get(&morning);
        cache.put(evening.clone(), rows());

        assert_eq!(cache.len(), 2);
        assert!(cache.peek(&morning).is_some());
        assert!(cache.peek(&night).is_none());
        assert!(cache.peek(&evening).is_some());
    }

    #[test]
    fn test_clear_keeps_counters() {
        let mut cache = ResultCache::new(NonZeroUsize::new(2).unwrap());
        let key = key_for(TimeBucket::All);
        cache.put(key.clone(), rows());
        cache.get(&key);
        cache.clear();

        assert!(cache.is_empty());
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.stats().capacity, 2);
    }
}
