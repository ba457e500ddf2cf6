use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Configuration for the last-known snapshot cache
#[derive(Clone, Debug)]
pub struct CacheConfig {
    pub enabled: bool, // false when --no-cache
    pub path: PathBuf,
}

impl CacheConfig {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            path: get_cache_path(),
        }
    }
}

/// Rows as fetched, stamped with when they were fetched
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot<T> {
    pub saved_at: DateTime<Utc>,
    pub data: T,
}

/// Get the platform-appropriate cache directory for scoreboard
pub fn get_cache_path() -> PathBuf {
    dirs::cache_dir()
        .map(|p| p.join("scoreboard/snapshots"))
        .unwrap_or_else(|| {
            PathBuf::from(format!(
                "{}/.cache/scoreboard/snapshots",
                std::env::var("HOME").unwrap_or_default()
            ))
        })
}

/// Remove every cached snapshot
pub fn clear_cache(path: &Path) -> Result<()> {
    match std::fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).context("Failed to remove cache directory"),
    }
}

pub fn store_snapshot<T: Serialize>(config: &CacheConfig, key: &str, data: &T) -> Result<()> {
    if !config.enabled {
        return Ok(());
    }
    let snapshot = Snapshot {
        saved_at: Utc::now(),
        data,
    };
    let bytes = serde_json::to_vec(&snapshot).context("Failed to serialize snapshot")?;
    let previous = cacache::metadata_sync(&config.path, key)
        .ok()
        .flatten()
        .map(|meta| meta.integrity);
    let integrity = cacache::write_sync(&config.path, key, bytes)
        .with_context(|| format!("Failed to write snapshot '{}'", key))?;

    // Content is addressed by hash, so the replaced blob would otherwise stay forever
    if let Some(old) = previous.filter(|old| *old != integrity) {
        if let Err(e) = cacache::remove_hash_sync(&config.path, &old) {
            debug!(key, error = %e, "failed to remove replaced snapshot content");
        }
    }
    debug!(key, "snapshot stored");
    Ok(())
}

/// Load a snapshot. Missing, unreadable or stale-format entries read as `None`.
pub fn load_snapshot<T: DeserializeOwned>(config: &CacheConfig, key: &str) -> Option<Snapshot<T>> {
    if !config.enabled {
        return None;
    }
    let bytes = cacache::read_sync(&config.path, key).ok()?;
    serde_json::from_slice(&bytes).ok()
}
