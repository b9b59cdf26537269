//! Page assembly: load, partition against the cache, fetch misses, project.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use super::{project, BatchFetcher, CatalogItem, EnrichedItem};
use crate::cache::{CacheInfo, EnrichmentCache};
use crate::catalog::{CatalogDocument, CatalogError, CatalogStore};
use crate::page::{PageEnvelope, PageResults, Pagination};

/// Number of keys listed by [`PagePipeline::cache_info`].
pub const CACHE_INFO_SAMPLE: usize = 10;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("page must be at least 1")]
    InvalidPage,

    #[error("per_page must be at least 1")]
    InvalidPerPage,

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("Invalid cache secret")]
    Forbidden,
}

/// Serves catalog pages enriched from the cache and the upstream API.
pub struct PagePipeline {
    catalog: Arc<dyn CatalogStore>,
    cache: Arc<EnrichmentCache>,
    fetcher: BatchFetcher,
    clear_secret: String,
}

impl PagePipeline {
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        cache: Arc<EnrichmentCache>,
        fetcher: BatchFetcher,
        clear_secret: String,
    ) -> Self {
        Self {
            catalog,
            cache,
            fetcher,
            clear_secret,
        }
    }

    pub fn cache(&self) -> &Arc<EnrichmentCache> {
        &self.cache
    }

    /// Build one page of `category`.
    ///
    /// Totals are computed from the catalog, so entries dropped for lack
    /// of a record shorten the page without changing the page count.
    pub async fn fetch_page(
        &self,
        category: &str,
        page: usize,
        per_page: usize,
    ) -> Result<PageEnvelope, PipelineError> {
        if page == 0 {
            return Err(PipelineError::InvalidPage);
        }
        if per_page == 0 {
            return Err(PipelineError::InvalidPerPage);
        }

        let document = self.catalog.load(category).await?;
        let pagination = Pagination::new(page, per_page, document.len());
        let range = pagination.range();

        let results = match document.as_ref() {
            CatalogDocument::Items(entries) => {
                let offset = range.start;
                PageResults::Enriched(self.enrich(category, offset, &entries[range]).await)
            }
            other => PageResults::Raw(other.entries()[range].to_vec()),
        };

        debug!(
            category = %category,
            page,
            per_page,
            returned = results.len(),
            total = pagination.total,
            "Served catalog page"
        );

        Ok(PageEnvelope::new(pagination, results))
    }

    async fn enrich(
        &self,
        category: &str,
        offset: usize,
        entries: &[serde_json::Value],
    ) -> Vec<EnrichedItem> {
        let items: Vec<CatalogItem> = entries
            .iter()
            .enumerate()
            .filter_map(|(i, entry)| match CatalogItem::from_value(entry) {
                Ok(item) => Some(item),
                Err(e) => {
                    warn!(
                        category = %category,
                        index = offset + i,
                        error = %e,
                        "Skipping malformed catalog item"
                    );
                    None
                }
            })
            .collect();

        let lookup = self.cache.lookup(items.iter().map(CatalogItem::key)).await;
        let mut records = lookup.hits;

        if !lookup.misses.is_empty() {
            let batch = self.fetcher.fetch(lookup.misses).await;
            records.extend(batch.records);
        }

        items
            .iter()
            .filter_map(|item| {
                let record = records.get(&item.key());
                if record.is_none() {
                    debug!(key = %item.key(), "No record for item, dropping from page");
                }
                record.map(|record| project(item, record))
            })
            .collect()
    }

    /// Empty the cache if `secret` matches the configured one.
    pub async fn clear_cache(&self, secret: &str) -> Result<(), PipelineError> {
        if !constant_time_eq(secret.as_bytes(), self.clear_secret.as_bytes()) {
            warn!("Rejected cache clear with invalid secret");
            return Err(PipelineError::Forbidden);
        }

        self.cache.clear().await;
        Ok(())
    }

    pub async fn cache_info(&self) -> CacheInfo {
        self.cache.info(CACHE_INFO_SAMPLE).await
    }
}

/// Constant-time byte comparison to prevent timing attacks.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}
