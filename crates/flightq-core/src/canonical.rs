use crate::criteria::{FilterCriteria, TimeBucket, TripType};
use chrono::Weekday;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;

/// Stable digest of a [`CanonicalCriteria`], used as the result cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Leading characters of the digest, enough to tell keys apart in logs.
    pub fn short(&self) -> &str {
        self.0.get(..12).unwrap_or(&self.0)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalized criteria. This is what the pipeline evaluates, so two inputs that
/// share a key are guaranteed to produce the same rows.
///
/// Field order here is the serialization order of the canonical form. Append new
/// dimensions at the end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CanonicalCriteria {
    pub trip_type: TripType,
    pub departure: String,
    pub destination: String,
    pub time_bucket: TimeBucket,
    pub availability_only: bool,
    pub operating_day: Option<Weekday>,
}

impl CanonicalCriteria {
    /// The serialized form the key is digested from.
    pub fn canonical_form(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{:?}", self))
    }

    pub fn key(&self) -> CacheKey {
        let digest = Sha256::digest(self.canonical_form().as_bytes());
        CacheKey(format!("{:x}", digest))
    }
}

pub struct CriteriaCanonicalizer;

impl CriteriaCanonicalizer {
    pub fn normalize_query(query: &str) -> String {
        query.trim().to_lowercase()
    }

    pub fn canonicalize(criteria: &FilterCriteria) -> CanonicalCriteria {
        CanonicalCriteria {
            trip_type: criteria.trip_type,
            departure: Self::normalize_query(&criteria.departure_query),
            destination: Self::normalize_query(&criteria.destination_query),
            time_bucket: criteria.time_bucket,
            availability_only: criteria.availability_only,
            operating_day: criteria.operating_day,
        }
    }

    pub fn key(criteria: &FilterCriteria) -> CacheKey {
        Self::canonicalize(criteria).key()
    }
}
