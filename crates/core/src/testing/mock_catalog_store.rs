//! In-memory catalog store for testing.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::catalog::{validate_category, CatalogDocument, CatalogError, CatalogStore};

/// Catalog documents held in memory, keyed by category.
#[derive(Debug, Default)]
pub struct MemoryCatalogStore {
    documents: RwLock<HashMap<String, Arc<CatalogDocument>>>,
}

impl MemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `category`, failing if it is not a catalog shape.
    pub async fn insert(&self, category: &str, value: Value) -> Result<(), CatalogError> {
        let document = CatalogDocument::from_value(value)?;
        self.documents
            .write()
            .await
            .insert(category.to_string(), Arc::new(document));
        Ok(())
    }

    pub async fn remove(&self, category: &str) {
        self.documents.write().await.remove(category);
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalogStore {
    async fn load(&self, category: &str) -> Result<Arc<CatalogDocument>, CatalogError> {
        validate_category(category)?;
        self.documents
            .read()
            .await
            .get(category)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(category.to_string()))
    }
}
