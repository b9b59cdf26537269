//! Compressed on-disk snapshot of the enrichment cache.
//!
//! The file is a gzip-compressed JSON object mapping `<kind>_<id>` tokens to
//! upstream records.

use std::collections::BTreeMap;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::CacheMap;
use crate::media::CacheKey;
use crate::upstream::UpstreamRecord;

/// Errors raised while reading or writing a snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid snapshot JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Reads and writes the snapshot file.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size of the snapshot file in bytes, if it exists.
    pub async fn file_size(&self) -> Option<u64> {
        tokio::fs::metadata(&self.path).await.ok().map(|m| m.len())
    }

    /// Load the snapshot, falling back to an empty map on any failure.
    pub fn load(&self) -> CacheMap {
        if !self.path.exists() {
            warn!(path = %self.path.display(), "No cache snapshot found, starting empty");
            return CacheMap::new();
        }

        match self.try_load() {
            Ok(map) => {
                info!(
                    path = %self.path.display(),
                    entries = map.len(),
                    "Loaded cache snapshot"
                );
                map
            }
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Failed to load cache snapshot, starting empty"
                );
                CacheMap::new()
            }
        }
    }

    fn try_load(&self) -> Result<CacheMap, SnapshotError> {
        let file = fs::File::open(&self.path).map_err(|e| self.io_error(e))?;
        let mut json = String::new();
        GzDecoder::new(file)
            .read_to_string(&mut json)
            .map_err(|e| self.io_error(e))?;

        let raw: BTreeMap<String, Value> = serde_json::from_str(&json)?;
        Ok(decode_entries(raw))
    }

    /// Serialize and compress `map`, replacing the previous file.
    ///
    /// Returns the number of bytes written.
    pub fn save(&self, map: &CacheMap) -> Result<u64, SnapshotError> {
        let flat: BTreeMap<String, &UpstreamRecord> = map
            .iter()
            .map(|(key, record)| (key.to_token(), record.as_ref()))
            .collect();
        let json = serde_json::to_vec(&flat)?;

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&json).map_err(|e| self.io_error(e))?;
        let compressed = encoder.finish().map_err(|e| self.io_error(e))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, &compressed).map_err(|e| self.io_error(e))?;
        fs::rename(&tmp_path, &self.path).map_err(|e| self.io_error(e))?;

        debug!(
            path = %self.path.display(),
            entries = map.len(),
            bytes = compressed.len(),
            "Wrote cache snapshot"
        );
        Ok(compressed.len() as u64)
    }

    fn io_error(&self, source: std::io::Error) -> SnapshotError {
        SnapshotError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

/// Turn flattened tokens back into keys, dropping anything unparseable.
fn decode_entries(raw: BTreeMap<String, Value>) -> CacheMap {
    let mut map = CacheMap::new();

    for (token, value) in raw {
        let key = match CacheKey::parse_token(&token) {
            Ok(key) => key,
            Err(e) => {
                warn!(token = %token, error = %e, "Dropping snapshot entry with bad key");
                continue;
            }
        };

        match UpstreamRecord::from_value(value) {
            Some(record) => {
                map.insert(key, record.into());
            }
            None => warn!(key = %key, "Dropping snapshot entry without a record"),
        }
    }

    map
}
