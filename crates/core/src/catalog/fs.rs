//! Filesystem-backed catalog store.

use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use async_trait::async_trait;
use flate2::read::GzDecoder;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use super::{validate_category, CatalogDocument, CatalogError, CatalogStore};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// A parsed document together with the file state it was read from.
struct Memoised {
    path: PathBuf,
    modified: SystemTime,
    document: Arc<CatalogDocument>,
}

/// Reads `<dir>/<category>.json.gz` (or `.json`).
///
/// Parsed documents are kept in memory and re-read when the file's
/// modification time changes.
pub struct FsCatalogStore {
    dir: PathBuf,
    documents: RwLock<HashMap<String, Memoised>>,
}

impl FsCatalogStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            documents: RwLock::new(HashMap::new()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn candidates(&self, category: &str) -> [PathBuf; 2] {
        [
            self.dir.join(format!("{}.json.gz", category)),
            self.dir.join(format!("{}.json", category)),
        ]
    }

    async fn memoised(
        &self,
        category: &str,
        path: &Path,
        modified: SystemTime,
    ) -> Option<Arc<CatalogDocument>> {
        let documents = self.documents.read().await;
        documents
            .get(category)
            .filter(|m| m.path == path && m.modified == modified)
            .map(|m| Arc::clone(&m.document))
    }
}

#[async_trait]
impl CatalogStore for FsCatalogStore {
    async fn load(&self, category: &str) -> Result<Arc<CatalogDocument>, CatalogError> {
        validate_category(category)?;

        let mut found = None;
        for path in self.candidates(category) {
            if let Ok(metadata) = tokio::fs::metadata(&path).await {
                found = Some((path, metadata.modified().ok()));
                break;
            }
        }
        let (path, modified) =
            found.ok_or_else(|| CatalogError::NotFound(category.to_string()))?;

        if let Some(modified) = modified {
            if let Some(document) = self.memoised(category, &path, modified).await {
                return Ok(document);
            }
        }

        let bytes = tokio::fs::read(&path).await.map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let document = tokio::task::spawn_blocking(move || {
            decode_document_bytes(&bytes).and_then(CatalogDocument::from_value)
        })
        .await
        .map_err(|e| CatalogError::Json(format!("decode task failed: {}", e)))??;
        let document = Arc::new(document);

        debug!(
            category = %category,
            path = %path.display(),
            entries = document.len(),
            "Loaded catalog document"
        );

        if let Some(modified) = modified {
            self.documents.write().await.insert(
                category.to_string(),
                Memoised {
                    path,
                    modified,
                    document: Arc::clone(&document),
                },
            );
        }

        Ok(document)
    }
}

/// Parse JSON from bytes that may or may not be gzip-compressed.
pub(crate) fn decode_document_bytes(bytes: &[u8]) -> Result<Value, CatalogError> {
    let text = if bytes.starts_with(&GZIP_MAGIC) {
        let mut text = String::new();
        GzDecoder::new(bytes)
            .read_to_string(&mut text)
            .map_err(|e| CatalogError::Json(format!("gzip decode failed: {}", e)))?;
        text
    } else {
        String::from_utf8(bytes.to_vec())
            .map_err(|e| CatalogError::Json(format!("invalid UTF-8: {}", e)))?
    };

    serde_json::from_str(&text).map_err(|e| CatalogError::Json(e.to_string()))
}
