//! Catalog enrichment: resolve missing records upstream, project entries,
//! and assemble pages.

mod fetcher;
mod item;
mod pipeline;
mod projection;

pub use fetcher::{BatchFetcher, BatchResult, FetchStats, FetcherConfig};
pub use item::{CatalogItem, ItemError, TorrentEntry};
pub use pipeline::{PagePipeline, PipelineError, CACHE_INFO_SAMPLE};
pub use projection::{project, EnrichedItem};
