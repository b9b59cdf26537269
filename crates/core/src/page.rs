//! Page envelope and pagination arithmetic shared by every paged endpoint.

use std::ops::Range;

use serde::Serialize;
use serde_json::Value;

use crate::enrich::EnrichedItem;

/// Pagination math for one request. Independent of enrichment results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: usize,
    pub per_page: usize,
    pub total: usize,
}

impl Pagination {
    /// `page` and `per_page` are expected to be at least 1.
    pub fn new(page: usize, per_page: usize, total: usize) -> Self {
        Self {
            page,
            per_page,
            total,
        }
    }

    pub fn total_pages(&self) -> usize {
        self.total.div_ceil(self.per_page.max(1))
    }

    /// Slice bounds into the full list; empty for pages past the end.
    pub fn range(&self) -> Range<usize> {
        let start = self
            .page
            .saturating_sub(1)
            .saturating_mul(self.per_page)
            .min(self.total);
        let end = start.saturating_add(self.per_page).min(self.total);
        start..end
    }
}

/// Entries of one page: raw documents or enriched items.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum PageResults {
    Raw(Vec<Value>),
    Enriched(Vec<EnrichedItem>),
}

impl PageResults {
    pub fn len(&self) -> usize {
        match self {
            PageResults::Raw(items) => items.len(),
            PageResults::Enriched(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// `{page, results, total_pages, total_results}` response body.
#[derive(Debug, Clone, Serialize)]
pub struct PageEnvelope {
    pub page: usize,
    pub results: PageResults,
    pub total_pages: usize,
    pub total_results: usize,
}

impl PageEnvelope {
    pub fn new(pagination: Pagination, results: PageResults) -> Self {
        Self {
            page: pagination.page,
            results,
            total_pages: pagination.total_pages(),
            total_results: pagination.total,
        }
    }

    /// Page over raw entries without any enrichment.
    pub fn raw(entries: &[Value], page: usize, per_page: usize) -> Self {
        let pagination = Pagination::new(page, per_page, entries.len());
        Self::new(pagination, PageResults::Raw(entries[pagination.range()].to_vec()))
    }
}
