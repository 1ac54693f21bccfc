// SPDX-License-Identifier: MIT
// Copyright (c) 2020 Austin Goudge
// Copyright (c) 2026 StarTuz

pub mod cache;
pub mod canonical;
pub mod config;
pub mod criteria;
pub mod dataset;
pub mod engine;
pub mod pipeline;
pub mod record;

use std::path::PathBuf;
use thiserror::Error;

pub use canonical::{CacheKey, CanonicalCriteria, CriteriaCanonicalizer};
pub use config::{ConfigManager, EngineConfig};
pub use criteria::{FilterCriteria, TimeBucket, TripType};
pub use dataset::{Dataset, DatasetLoader};
pub use engine::{QueryEngine, QueryResult, QueryStats};
pub use pipeline::{FilterPipeline, FlightRow, Leg};
pub use record::FlightRecord;

#[derive(Error, Debug)]
pub enum EngineError {
    /// A record failed structural validation; the previously loaded dataset stays active.
    #[error("Invalid dataset: record #{index}: {reason}")]
    InvalidDataset { index: usize, reason: String },
    /// A setter received input it cannot represent; the prior criteria stay active.
    #[error("Invalid filter criteria: {0}")]
    InvalidCriteria(String),
    /// A cached result disagreed with a fresh evaluation of the same key.
    /// This is a programming defect, never a user-facing condition.
    #[error("Cache consistency violated for key {key}")]
    CacheConsistency { key: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Returns the per-user configuration directory for flightq.
/// Falls back to a relative `.flightq` directory when no home directory is known.
pub fn get_config_root() -> PathBuf {
    directories::ProjectDirs::from("org", "flightq", "flightq")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".flightq"))
}
