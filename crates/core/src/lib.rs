pub mod cache;
pub mod catalog;
pub mod config;
pub mod enrich;
pub mod media;
pub mod metrics;
pub mod page;
pub mod profile_cache;
pub mod testing;
pub mod upstream;

pub use cache::{
    create_cache_system, CacheInfo, CacheMap, EnrichmentCache, SnapshotStore, SnapshotWriter,
};
pub use catalog::{CatalogDocument, CatalogError, CatalogStore, FsCatalogStore};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use enrich::{BatchFetcher, FetcherConfig, PagePipeline, PipelineError};
pub use media::{CacheKey, MediaKind};
pub use page::{PageEnvelope, PageResults};
pub use profile_cache::{ProfileCacheError, ProfileCacheKey, ProfileCacheStore, ProfileDocument};
pub use upstream::{MetadataSource, TmdbClient, UpstreamError, UpstreamRecord};
