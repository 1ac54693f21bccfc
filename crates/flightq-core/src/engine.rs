use crate::cache::{CacheStats, ResultCache};
use crate::canonical::{CacheKey, CanonicalCriteria, CriteriaCanonicalizer};
use crate::config::EngineConfig;
use crate::criteria::{FilterCriteria, TimeBucket, TripType};
use crate::dataset::Dataset;
use crate::pipeline::{FilterPipeline, FlightRow, Leg};
use crate::record::FlightRecord;
use crate::EngineError;
use chrono::Weekday;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryStats {
    pub total_count: usize,
    pub filtered_count: usize,
    pub outbound_count: usize,
    pub return_count: usize,
    pub cache_hit: bool,
    pub summary: String,
}

impl QueryStats {
    pub fn no_results(&self) -> bool {
        self.filtered_count == 0
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    pub rows: Arc<[FlightRow]>,
    pub stats: QueryStats,
}

/// Owns the dataset, the live filter criteria and the result cache for one session.
///
/// Setters only commit criteria; evaluation happens in [`QueryEngine::apply`], so a
/// burst of setter calls costs a single evaluation of the final state.
pub struct QueryEngine {
    config: EngineConfig,
    pipeline: FilterPipeline,
    dataset: Dataset,
    criteria: FilterCriteria,
    cache: ResultCache,
}

impl QueryEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            pipeline: FilterPipeline::new(&config),
            cache: ResultCache::new(config.capacity()),
            dataset: Dataset::default(),
            criteria: FilterCriteria::default(),
            config,
        }
    }

    pub fn with_records(
        config: EngineConfig,
        records: Vec<FlightRecord>,
    ) -> Result<Self, EngineError> {
        let mut engine = Self::new(config);
        engine.load(records)?;
        Ok(engine)
    }

    /// Replaces the dataset wholesale and clears the cache.
    /// On validation failure the previous dataset and cache stay untouched.
    pub fn load(&mut self, records: Vec<FlightRecord>) -> Result<(), EngineError> {
        let dataset = Dataset::from_records(records)?;

        for index in dataset.stale_night_flags(self.config.night_includes_evening) {
            let record = &dataset.all()[index];
            log::warn!(
                "Ignoring stale is_night={} on record {} ({} departs {})",
                record.is_night,
                index,
                record.flight_number,
                record.departure_time
            );
        }

        log::info!("Loaded {} flight records", dataset.len());
        self.dataset = dataset;
        self.cache.clear();
        Ok(())
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn all(&self) -> &[Arc<FlightRecord>] {
        self.dataset.all()
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn current_key(&self) -> CacheKey {
        CriteriaCanonicalizer::key(&self.criteria)
    }

    pub fn set_trip_type(&mut self, trip_type: TripType) {
        self.criteria.trip_type = trip_type;
    }

    /// Parses a selector value such as `round-trip` or `往返`.
    pub fn select_trip_type(&mut self, value: &str) -> Result<(), EngineError> {
        let trip_type = value.parse::<TripType>().inspect_err(|e| {
            log::warn!("Rejected trip type {:?}: {}", value, e);
        })?;
        self.set_trip_type(trip_type);
        Ok(())
    }

    /// Sets both city queries together. Either both are accepted or neither is.
    pub fn set_city_search(
        &mut self,
        departure: &str,
        destination: &str,
    ) -> Result<(), EngineError> {
        self.check_query("departure", departure)?;
        self.check_query("destination", destination)?;
        self.criteria.departure_query = departure.to_string();
        self.criteria.destination_query = destination.to_string();
        Ok(())
    }

    pub fn set_time_bucket(&mut self, bucket: TimeBucket) {
        self.criteria.time_bucket = bucket;
    }

    /// Parses a selector value such as `night`.
    pub fn select_time_bucket(&mut self, value: &str) -> Result<(), EngineError> {
        let bucket = value.parse::<TimeBucket>().inspect_err(|e| {
            log::warn!("Rejected time bucket {:?}: {}", value, e);
        })?;
        self.set_time_bucket(bucket);
        Ok(())
    }

    pub fn set_availability_only(&mut self, availability_only: bool) {
        self.criteria.availability_only = availability_only;
    }

    pub fn toggle_availability(&mut self) {
        self.criteria.availability_only = !self.criteria.availability_only;
    }

    pub fn set_operating_day(&mut self, day: Option<Weekday>) {
        self.criteria.operating_day = day;
    }

    fn check_query(&self, side: &str, query: &str) -> Result<(), EngineError> {
        let reason = if query.chars().count() > self.config.max_query_chars {
            Some(format!(
                "{} query longer than {} characters",
                side, self.config.max_query_chars
            ))
        } else if query.chars().any(char::is_control) {
            Some(format!("{} query contains control characters", side))
        } else {
            None
        };

        match reason {
            Some(reason) => {
                log::warn!("Rejected city search: {}", reason);
                Err(EngineError::InvalidCriteria(reason))
            }
            None => Ok(()),
        }
    }

    /// Evaluates the current criteria, serving from the cache when possible.
    ///
    /// Only fails with [`EngineError::CacheConsistency`], and only when hit
    /// verification is enabled.
    pub fn apply(&mut self) -> Result<QueryResult, EngineError> {
        let canonical = CriteriaCanonicalizer::canonicalize(&self.criteria);
        let key = canonical.key();

        let (rows, cache_hit) = match self.cache.get(&key) {
            Some(rows) => {
                if self.config.verify_cache_hits {
                    self.check_consistency(&key, &canonical, &rows)?;
                }
                (rows, true)
            }
            None => {
                let rows = self.evaluate(&canonical);
                self.cache.put(key, Arc::clone(&rows));
                (rows, false)
            }
        };

        Ok(self.finish(rows, cache_hit))
    }

    /// Restores unconstrained criteria and evaluates them.
    pub fn reset(&mut self) -> Result<QueryResult, EngineError> {
        self.criteria = FilterCriteria::default();
        self.apply()
    }

    /// Recomputes the current criteria bypassing the cache and compares with
    /// the cached rows, if any.
    pub fn verify_current(&self) -> Result<(), EngineError> {
        let canonical = CriteriaCanonicalizer::canonicalize(&self.criteria);
        let key = canonical.key();
        match self.cache.peek(&key) {
            Some(entry) => self.check_consistency(&key, &canonical, &entry.rows),
            None => Ok(()),
        }
    }

    fn check_consistency(
        &self,
        key: &CacheKey,
        canonical: &CanonicalCriteria,
        cached: &[FlightRow],
    ) -> Result<(), EngineError> {
        let fresh = self.evaluate(canonical);
        if *fresh == *cached {
            Ok(())
        } else {
            log::error!(
                "Cached rows for {} disagree with recomputation ({} cached, {} fresh)",
                key.short(),
                cached.len(),
                fresh.len()
            );
            Err(EngineError::CacheConsistency {
                key: key.to_string(),
            })
        }
    }

    fn evaluate(&self, canonical: &CanonicalCriteria) -> Arc<[FlightRow]> {
        self.pipeline.run(self.dataset.all(), canonical).into()
    }

    fn finish(&self, rows: Arc<[FlightRow]>, cache_hit: bool) -> QueryResult {
        let count_leg = |leg: Leg| rows.iter().filter(|r| r.leg == leg).count();
        let stats = QueryStats {
            total_count: self.dataset.len(),
            filtered_count: rows.len(),
            outbound_count: count_leg(Leg::Outbound),
            return_count: count_leg(Leg::Return),
            cache_hit,
            summary: self.criteria.summary(),
        };
        QueryResult { rows, stats }
    }
}
