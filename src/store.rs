//! Persistence for the record, hash-cache, and summary stores.
//!
//! All three stores are JSON files replaced wholesale via write-to-temp
//! then rename, so a crash mid-write leaves the previous run's file intact
//! rather than a truncated one. The hash cache additionally only ever sees
//! a fully merged mapping; staging happens in [`crate::detect::HashCache`].

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::fs;
use tracing::{debug, info};

use crate::errors::PersistenceError;
use crate::models::{FetchedRecord, Summary};

/// Load the hash cache, treating a missing file as an empty cache (first
/// run on a fresh deployment).
pub async fn load_cache(path: &Path) -> Result<BTreeMap<String, String>, PersistenceError> {
    match fs::read_to_string(path).await {
        Ok(raw) => serde_json::from_str(&raw).map_err(|e| PersistenceError::Decode {
            path: path.display().to_string(),
            source: e,
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no hash cache yet; starting empty");
            Ok(BTreeMap::new())
        }
        Err(e) => Err(PersistenceError::io("read", path.display().to_string(), e)),
    }
}

pub async fn write_records(
    path: &Path,
    records: &[FetchedRecord],
) -> Result<(), PersistenceError> {
    atomic_write_json(path, &records, "records").await?;
    info!(count = records.len(), path = %path.display(), "wrote record store");
    Ok(())
}

pub async fn write_cache(
    path: &Path,
    cache: &BTreeMap<String, String>,
) -> Result<(), PersistenceError> {
    atomic_write_json(path, cache, "hash cache").await?;
    info!(entries = cache.len(), path = %path.display(), "wrote hash cache");
    Ok(())
}

pub async fn write_summaries(path: &Path, summaries: &[Summary]) -> Result<(), PersistenceError> {
    atomic_write_json(path, &summaries, "summaries").await?;
    info!(count = summaries.len(), path = %path.display(), "wrote summary store");
    Ok(())
}

/// Read a JSON store back. Used by tests and by the watchdog's emptiness
/// probe; the pipeline itself hands records forward in memory.
pub async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, PersistenceError> {
    let raw = fs::read_to_string(path)
        .await
        .map_err(|e| PersistenceError::io("read", path.display().to_string(), e))?;
    serde_json::from_str(&raw).map_err(|e| PersistenceError::Decode {
        path: path.display().to_string(),
        source: e,
    })
}

async fn atomic_write_json<T: Serialize>(
    path: &Path,
    value: &T,
    what: &'static str,
) -> Result<(), PersistenceError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| PersistenceError::Encode { what, source: e })?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| PersistenceError::io("create dir", parent.display().to_string(), e))?;
    }

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json)
        .await
        .map_err(|e| PersistenceError::io("write", tmp.display().to_string(), e))?;
    fs::rename(&tmp, path)
        .await
        .map_err(|e| PersistenceError::io("rename", path.display().to_string(), e))?;

    Ok(())
}
