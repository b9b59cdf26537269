//! Bounded-concurrency resolution of cache misses.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use crate::cache::EnrichmentCache;
use crate::config::UpstreamConfig;
use crate::media::CacheKey;
use crate::metrics::{UPSTREAM_DURATION, UPSTREAM_REQUESTS};
use crate::upstream::{MetadataSource, UpstreamError, UpstreamRecord};

/// Limits applied to each batch.
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Maximum in-flight upstream calls.
    pub max_concurrent: usize,
    /// Deadline for a single call.
    pub timeout: Duration,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 10,
            timeout: Duration::from_secs(5),
        }
    }
}

impl From<&UpstreamConfig> for FetcherConfig {
    fn from(config: &UpstreamConfig) -> Self {
        Self {
            max_concurrent: config.max_concurrent.max(1),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

/// Counters for one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchStats {
    /// Distinct keys requested.
    pub requested: usize,
    pub fetched: usize,
    pub failed: usize,
}

/// Records resolved by one batch. Failed keys are absent.
#[derive(Debug, Default)]
pub struct BatchResult {
    pub records: HashMap<CacheKey, Arc<UpstreamRecord>>,
    pub stats: FetchStats,
}

/// Resolves cache misses against the upstream API.
pub struct BatchFetcher {
    source: Arc<dyn MetadataSource>,
    cache: Arc<EnrichmentCache>,
    config: FetcherConfig,
}

impl BatchFetcher {
    pub fn new(
        source: Arc<dyn MetadataSource>,
        cache: Arc<EnrichmentCache>,
        config: FetcherConfig,
    ) -> Self {
        Self {
            source,
            cache,
            config,
        }
    }

    /// Fetch every key once, at most `max_concurrent` at a time.
    ///
    /// This method:
    /// 1. Deduplicates the keys
    /// 2. Issues the calls in parallel with a per-call timeout
    /// 3. Writes each success into the cache as soon as it completes
    /// 4. Requests a snapshot once the whole batch has resolved
    ///
    /// A failed call only loses its own key.
    pub async fn fetch<I>(&self, keys: I) -> BatchResult
    where
        I: IntoIterator<Item = CacheKey>,
    {
        let mut seen = HashSet::new();
        let keys: Vec<CacheKey> = keys.into_iter().filter(|k| seen.insert(*k)).collect();

        let mut result = BatchResult::default();
        result.stats.requested = keys.len();
        if keys.is_empty() {
            return result;
        }

        debug!(
            count = keys.len(),
            concurrency = self.config.max_concurrent,
            "Fetching upstream records"
        );

        let service = self.source.name();
        let timeout = self.config.timeout;
        let mut completions = stream::iter(keys)
            .map(|key| {
                let source = Arc::clone(&self.source);
                async move {
                    let started = Instant::now();
                    let outcome = match tokio::time::timeout(timeout, source.fetch(key)).await {
                        Ok(outcome) => outcome,
                        Err(_) => Err(UpstreamError::Timeout(timeout.as_millis())),
                    };
                    (key, outcome, started.elapsed())
                }
            })
            .buffer_unordered(self.config.max_concurrent.max(1));

        while let Some((key, outcome, elapsed)) = completions.next().await {
            UPSTREAM_DURATION
                .with_label_values(&[service])
                .observe(elapsed.as_secs_f64());

            match outcome {
                Ok(record) => {
                    UPSTREAM_REQUESTS
                        .with_label_values(&[service, key.kind().as_str(), "success"])
                        .inc();
                    let record = self.cache.update(key, record).await;
                    result.records.insert(key, record);
                    result.stats.fetched += 1;
                }
                Err(e) => {
                    UPSTREAM_REQUESTS
                        .with_label_values(&[service, key.kind().as_str(), e.status_label()])
                        .inc();
                    warn!(key = %key, error = %e, "Upstream lookup failed");
                    result.stats.failed += 1;
                }
            }
        }

        self.cache.request_persist();

        debug!(
            requested = result.stats.requested,
            fetched = result.stats.fetched,
            failed = result.stats.failed,
            "Upstream batch finished"
        );

        result
    }
}
