use std::sync::Arc;

use marquee_core::{Config, PagePipeline, ProfileCacheStore, SanitizedConfig};

/// Shared application state
pub struct AppState {
    config: Config,
    pipeline: Arc<PagePipeline>,
    profiles: ProfileCacheStore,
}

impl AppState {
    pub fn new(config: Config, pipeline: Arc<PagePipeline>, profiles: ProfileCacheStore) -> Self {
        Self {
            config,
            pipeline,
            profiles,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn pipeline(&self) -> &PagePipeline {
        &self.pipeline
    }

    pub fn profiles(&self) -> &ProfileCacheStore {
        &self.profiles
    }
}
