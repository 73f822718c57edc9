use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub directory: DirectoryConfig,

    pub places: PlacesConfig,

    pub search: SearchConfig,

    pub cache: CacheConfig,

    pub history: HistoryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub log_level: String,

    /// Directory for the persisted cache and history store.
    pub data_dir: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            data_dir: "data".to_string(),
            worker_threads: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    pub base_url: String,

    /// Request timeout in seconds (default: 30)
    pub timeout_seconds: u64,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:7070".to_string(),
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacesConfig {
    pub base_url: String,

    /// Place autocomplete can be turned off entirely; location suggestions
    /// then stay empty.
    pub enabled: bool,
}

impl Default for PlacesConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:7071".to_string(),
            enabled: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Quiet period before a debounced search fires (default: 300)
    pub debounce_ms: u64,

    /// Quiet period before a debounced suggestion lookup fires (default: 150)
    pub suggestion_debounce_ms: u64,

    /// Review count at which the popularity score component saturates.
    pub review_count_cap: f64,

    /// Distance in meters at which the distance score component reaches zero.
    pub distance_cap_m: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 300,
            suggestion_debounce_ms: 150,
            review_count_cap: 100.0,
            distance_cap_m: 10_000.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Result cache time-to-live in seconds (default: 600)
    pub ttl_seconds: u64,

    /// Maximum number of cached result sets before the oldest is evicted.
    pub capacity: usize,

    /// Decimal places kept when a location is folded into a cache key.
    /// Three decimals is roughly a 110 m grid.
    pub grid_decimals: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: 600,
            capacity: 100,
            grid_decimals: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum retained history entries (default: 50)
    pub capacity: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { capacity: 50 }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("kompass").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".kompass").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.directory.base_url.is_empty() {
            anyhow::bail!("Directory base URL cannot be empty");
        }

        if self.places.enabled && self.places.base_url.is_empty() {
            anyhow::bail!("Places base URL cannot be empty when enabled");
        }

        if self.cache.capacity == 0 {
            anyhow::bail!("Cache capacity must be > 0");
        }

        if self.history.capacity == 0 {
            anyhow::bail!("History capacity must be > 0");
        }

        if self.search.review_count_cap <= 0.0 || self.search.distance_cap_m <= 0.0 {
            anyhow::bail!("Ranking caps must be > 0");
        }

        Ok(())
    }
}
