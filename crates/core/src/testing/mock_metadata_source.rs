//! Mock upstream metadata source for testing.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::media::CacheKey;
use crate::upstream::{MetadataSource, UpstreamError, UpstreamRecord};

/// Mock implementation of the MetadataSource trait.
///
/// Provides controllable behavior for testing:
/// - Return configured records by key
/// - Fail selected keys
/// - Delay responses, globally or per key
/// - Record every call and the peak number of concurrent calls
#[derive(Debug, Default)]
pub struct MockMetadataSource {
    records: Arc<RwLock<HashMap<CacheKey, UpstreamRecord>>>,
    failing: Arc<RwLock<HashSet<CacheKey>>>,
    delay: Arc<RwLock<Option<Duration>>>,
    key_delays: Arc<RwLock<HashMap<CacheKey, Duration>>>,
    calls: Arc<RwLock<Vec<CacheKey>>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl MockMetadataSource {
    /// Create a new mock with no records.
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Serve `record` for `key`.
    pub async fn add_record(&self, key: CacheKey, record: UpstreamRecord) {
        self.records.write().await.insert(key, record);
    }

    /// Make every fetch of `key` fail with a server error.
    pub async fn fail_key(&self, key: CacheKey) {
        self.failing.write().await.insert(key);
    }

    /// Delay every response by `delay`.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    /// Delay responses for `key` only. Overrides the global delay.
    pub async fn set_key_delay(&self, key: CacheKey, delay: Duration) {
        self.key_delays.write().await.insert(key, delay);
    }

    // =========================================================================
    // Assertions
    // =========================================================================

    /// Every key fetched so far, in call order.
    pub async fn calls(&self) -> Vec<CacheKey> {
        self.calls.read().await.clone()
    }

    /// How many times `key` was fetched.
    pub async fn call_count(&self, key: CacheKey) -> usize {
        self.calls.read().await.iter().filter(|k| **k == key).count()
    }

    /// Highest number of fetches observed in flight at once.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    async fn delay_for(&self, key: &CacheKey) -> Option<Duration> {
        if let Some(delay) = self.key_delays.read().await.get(key) {
            return Some(*delay);
        }
        *self.delay.read().await
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl MetadataSource for MockMetadataSource {
    async fn fetch(&self, key: CacheKey) -> Result<UpstreamRecord, UpstreamError> {
        self.calls.write().await.push(key);

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        if let Some(delay) = self.delay_for(&key).await {
            tokio::time::sleep(delay).await;
        }

        if self.failing.read().await.contains(&key) {
            return Err(UpstreamError::ApiError {
                status: 500,
                message: format!("mock failure for {key}"),
            });
        }

        self.records
            .read()
            .await
            .get(&key)
            .cloned()
            .ok_or_else(|| UpstreamError::NotFound(key.to_string()))
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
