use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

pub const DEFAULT_CACHE_CAPACITY: usize = 50;
pub const DEFAULT_AVAILABILITY_MARKER: &str = "2666";
pub const DEFAULT_MAX_QUERY_CHARS: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of memoized result sets.
    pub cache_capacity: usize,
    /// Seat code a record must carry to pass the availability filter.
    pub availability_marker: String,
    /// Widen Night to [18:00, 06:00).
    pub night_includes_evening: bool,
    /// City queries longer than this are rejected by the setters.
    pub max_query_chars: usize,
    /// Recompute on every cache hit and fail on disagreement. Debug aid.
    pub verify_cache_hits: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            availability_marker: DEFAULT_AVAILABILITY_MARKER.to_string(),
            night_includes_evening: false,
            max_query_chars: DEFAULT_MAX_QUERY_CHARS,
            verify_cache_hits: false,
        }
    }
}

impl EngineConfig {
    pub fn capacity(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.cache_capacity).unwrap_or(NonZeroUsize::MIN)
    }
}

#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_path: PathBuf,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManager {
    pub fn new() -> Self {
        Self {
            config_path: crate::get_config_root().join("engine.json"),
        }
    }

    pub fn with_path<P: AsRef<Path>>(path: P) -> Self {
        Self {
            config_path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    pub fn load(&self) -> Result<EngineConfig> {
        if !self.config_path.exists() {
            log::debug!(
                "No engine config at {}, using defaults",
                self.config_path.display()
            );
            return Ok(EngineConfig::default());
        }

        let content = fs::read_to_string(&self.config_path).context("Failed to read engine.json")?;

        serde_json::from_str(&content).context("Failed to parse engine.json")
    }

    pub fn save(&self, config: &EngineConfig) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).context("Failed to create config directory")?;
            }
        }

        let content =
            serde_json::to_string_pretty(config).context("Failed to serialize engine config")?;

        fs::write(&self.config_path, content).context("Failed to write engine.json")
    }
}
