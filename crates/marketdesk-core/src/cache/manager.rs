use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

/// Minutes before a cached response is refetched.
pub const DEFAULT_STALE_MINUTES: i64 = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    pub fn age_minutes(&self) -> i64 {
        let now = Utc::now();
        (now - self.cached_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            // Also covers clock skew
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            if minutes % 60 >= 30 {
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            let days = minutes / 1440;
            if (minutes % 1440) / 60 >= 12 {
                format!("{}d ago", days + 1)
            } else {
                format!("{}d ago", days)
            }
        }
    }

    pub fn is_stale(&self, stale_minutes: i64) -> bool {
        self.age_minutes() >= stale_minutes
    }
}

pub struct CacheManager {
    cache_dir: PathBuf,
    stale_minutes: i64,
}

impl CacheManager {
    pub fn new(cache_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&cache_dir)
            .with_context(|| format!("Failed to create cache directory {}", cache_dir.display()))?;
        Ok(Self {
            cache_dir,
            stale_minutes: DEFAULT_STALE_MINUTES,
        })
    }

    pub fn with_stale_minutes(mut self, minutes: i64) -> Self {
        self.stale_minutes = minutes.max(0);
        self
    }

    pub fn stale_minutes(&self) -> i64 {
        self.stale_minutes
    }

    pub fn dir(&self) -> &Path {
        &self.cache_dir
    }

    fn cache_path(&self, name: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", name))
    }

    pub fn load<T: DeserializeOwned>(&self, name: &str) -> Result<Option<CachedData<T>>> {
        let path = self.cache_path(name);
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read cache file: {}", name))?;

        let cached: CachedData<T> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse cache file: {}", name))?;

        Ok(Some(cached))
    }

    pub fn save<T: Serialize>(&self, name: &str, data: &T) -> Result<()> {
        let cached = CachedData::new(data);
        let contents = serde_json::to_string_pretty(&cached)?;
        std::fs::write(self.cache_path(name), contents)
            .with_context(|| format!("Failed to write cache file: {}", name))?;
        Ok(())
    }

    /// The cached entry if it is younger than the staleness window.
    /// Unreadable entries count as missing.
    pub fn fresh<T: DeserializeOwned>(&self, name: &str) -> Option<CachedData<T>> {
        match self.load(name) {
            Ok(Some(cached)) if !cached.is_stale(self.stale_minutes) => Some(cached),
            Ok(_) => None,
            Err(e) => {
                debug!(cache = name, error = %e, "Ignoring unreadable cache entry");
                None
            }
        }
    }

    /// Remove every entry whose name starts with `prefix`. Returns how many
    /// were removed.
    pub fn invalidate(&self, prefix: &str) -> Result<usize> {
        let mut removed = 0;
        let entries = std::fs::read_dir(&self.cache_dir).context("Failed to list cache directory")?;
        for entry in entries {
            let path = entry?.path();
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if path.extension().is_some_and(|ext| ext == "json") && stem.starts_with(prefix) {
                std::fs::remove_file(&path)
                    .with_context(|| format!("Failed to remove cache file: {}", stem))?;
                removed += 1;
            }
        }
        debug!(prefix, removed, "Invalidated cache entries");
        Ok(removed)
    }

    /// Human-readable age of an entry, "never" when there is none.
    pub fn age(&self, name: &str) -> String {
        match self.load::<serde_json::Value>(name) {
            Ok(Some(cached)) => cached.age_display(),
            Ok(None) => "never".to_string(),
            Err(e) => {
                debug!(cache = name, error = %e, "Failed to load cache for age display");
                "never".to_string()
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
