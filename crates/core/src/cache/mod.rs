//! Process-wide enrichment cache.
//!
//! Maps `(kind, id)` keys to upstream records. Only successful lookups are
//! stored, so a failed key is retried on every later request until it
//! resolves. Persistence is delegated to a background [`SnapshotWriter`].

mod persister;
mod snapshot;

pub use persister::{PersistCommand, PersistHandle, SnapshotWriter};
pub use snapshot::{SnapshotError, SnapshotStore};

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info};

use crate::media::CacheKey;
use crate::metrics::{CACHE_ENTRIES, CACHE_LOOKUPS};
use crate::upstream::UpstreamRecord;

/// The cache contents. Records are shared and never mutated in place.
pub type CacheMap = HashMap<CacheKey, Arc<UpstreamRecord>>;

/// Buffer for persistence requests. Saves coalesce, so this stays small.
const PERSIST_BUFFER_SIZE: usize = 16;

/// State shared between the cache and its writer.
pub(crate) struct CacheState {
    entries: RwLock<CacheMap>,
    /// Bumped under the write lock on every mutation.
    generation: AtomicU64,
}

impl CacheState {
    /// Clone of the map together with the generation it corresponds to.
    async fn consistent_view(&self) -> (CacheMap, u64) {
        let entries = self.entries.read().await;
        (entries.clone(), self.generation.load(Ordering::SeqCst))
    }
}

/// Diagnostic summary of the cache.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CacheInfo {
    pub size: usize,
    pub approximate_file_size_mb: f64,
    pub sample_keys: Vec<String>,
}

/// Result of looking up several keys at once.
#[derive(Debug, Default)]
pub struct Lookup {
    pub hits: HashMap<CacheKey, Arc<UpstreamRecord>>,
    pub misses: Vec<CacheKey>,
}

/// The enrichment cache.
pub struct EnrichmentCache {
    state: Arc<CacheState>,
    store: Arc<SnapshotStore>,
    persister: PersistHandle,
    persist_every: u64,
    successful_updates: AtomicU64,
}

/// Create a cache seeded with `initial` and the writer that persists it
///
/// Returns:
/// - `EnrichmentCache` - share it behind an `Arc`
/// - `SnapshotWriter` - spawn this with `tokio::spawn(writer.run())`
pub fn create_cache_system(
    initial: CacheMap,
    store: SnapshotStore,
    persist_every: usize,
) -> (EnrichmentCache, SnapshotWriter) {
    CACHE_ENTRIES.set(initial.len() as i64);

    let state = Arc::new(CacheState {
        entries: RwLock::new(initial),
        generation: AtomicU64::new(0),
    });
    let store = Arc::new(store);
    let (tx, rx) = mpsc::channel(PERSIST_BUFFER_SIZE);

    let cache = EnrichmentCache {
        state: Arc::clone(&state),
        store: Arc::clone(&store),
        persister: PersistHandle::new(tx),
        persist_every: persist_every.max(1) as u64,
        successful_updates: AtomicU64::new(0),
    };
    let writer = SnapshotWriter::new(rx, state, store);
    (cache, writer)
}

impl EnrichmentCache {
    pub async fn get(&self, key: &CacheKey) -> Option<Arc<UpstreamRecord>> {
        self.state.entries.read().await.get(key).cloned()
    }

    pub async fn contains(&self, key: &CacheKey) -> bool {
        self.state.entries.read().await.contains_key(key)
    }

    pub async fn len(&self) -> usize {
        self.state.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Split `keys` into cached records and missing keys under one read lock.
    ///
    /// Duplicate keys are reported once.
    pub async fn lookup<I>(&self, keys: I) -> Lookup
    where
        I: IntoIterator<Item = CacheKey>,
    {
        let entries = self.state.entries.read().await;
        let mut lookup = Lookup::default();

        for key in keys {
            if lookup.hits.contains_key(&key) || lookup.misses.contains(&key) {
                continue;
            }
            match entries.get(&key) {
                Some(record) => {
                    lookup.hits.insert(key, Arc::clone(record));
                }
                None => lookup.misses.push(key),
            }
        }

        CACHE_LOOKUPS
            .with_label_values(&["hit"])
            .inc_by(lookup.hits.len() as u64);
        CACHE_LOOKUPS
            .with_label_values(&["miss"])
            .inc_by(lookup.misses.len() as u64);

        lookup
    }

    /// Insert or replace the record for `key`.
    ///
    /// Every `persist_every` updates a snapshot save is requested.
    pub async fn update(&self, key: CacheKey, record: UpstreamRecord) -> Arc<UpstreamRecord> {
        let record = Arc::new(record);
        {
            let mut entries = self.state.entries.write().await;
            entries.insert(key, Arc::clone(&record));
            self.state.generation.fetch_add(1, Ordering::SeqCst);
            CACHE_ENTRIES.set(entries.len() as i64);
        }

        let count = self.successful_updates.fetch_add(1, Ordering::SeqCst) + 1;
        if count % self.persist_every == 0 {
            debug!(updates = count, "Periodic cache snapshot requested");
            self.persister.request_save();
        }

        record
    }

    /// Drop every entry and persist the empty cache before returning.
    pub async fn clear(&self) {
        let removed = {
            let mut entries = self.state.entries.write().await;
            let removed = entries.len();
            *entries = CacheMap::new();
            self.state.generation.fetch_add(1, Ordering::SeqCst);
            CACHE_ENTRIES.set(0);
            removed
        };

        info!(removed, "Enrichment cache cleared");
        self.persister.flush().await;
    }

    /// Ask the writer to persist if anything changed.
    pub fn request_persist(&self) {
        self.persister.request_save();
    }

    /// Persist now and wait for the write to finish.
    pub async fn flush(&self) {
        self.persister.flush().await;
    }

    /// Copy of the current contents.
    pub async fn snapshot(&self) -> CacheMap {
        self.state.entries.read().await.clone()
    }

    /// Size, snapshot file size and up to `sample` keys (sorted).
    pub async fn info(&self, sample: usize) -> CacheInfo {
        let (size, mut keys) = {
            let entries = self.state.entries.read().await;
            (entries.len(), entries.keys().copied().collect::<Vec<_>>())
        };
        keys.sort();

        let bytes = self.store.file_size().await.unwrap_or(0);
        let megabytes = bytes as f64 / (1024.0 * 1024.0);

        CacheInfo {
            size,
            approximate_file_size_mb: (megabytes * 100.0).round() / 100.0,
            sample_keys: keys.iter().take(sample).map(CacheKey::to_token).collect(),
        }
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// Total successful updates since startup.
    pub fn successful_updates(&self) -> u64 {
        self.successful_updates.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MediaKind;
    use serde_json::json;
    use std::time::Duration;
    use tempfile::TempDir;

    fn key(id: i64) -> CacheKey {
        CacheKey::new(MediaKind::Movie, id).unwrap()
    }

    fn record(title: &str) -> UpstreamRecord {
        UpstreamRecord::from_value(json!({ "title": title })).unwrap()
    }

    async fn wait_for_file(store: &SnapshotStore) {
        for _ in 0..100 {
            if store.path().exists() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("snapshot was never written");
    }

    #[tokio::test]
    async fn test_get_and_update() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path().join("cache.json.gz"));
        let (cache, _writer) = create_cache_system(CacheMap::new(), store, 10);

        assert!(cache.get(&key(1)).await.is_none());
        cache.update(key(1), record("Alien")).await;
        assert_eq!(
            cache.get(&key(1)).await.unwrap().str_field("title"),
            Some("Alien")
        );
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_update_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path().join("cache.json.gz"));
        let (cache, _writer) = create_cache_system(CacheMap::new(), store, 10);

        cache.update(key(1), record("Alien")).await;
        let first = cache.get(&key(1)).await.unwrap();
        cache.update(key(1), record("Alien")).await;
        let second = cache.get(&key(1)).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.successful_updates(), 2);
    }

    #[tokio::test]
    async fn test_lookup_partitions_and_dedupes() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path().join("cache.json.gz"));
        let (cache, _writer) = create_cache_system(CacheMap::new(), store, 10);
        cache.update(key(1), record("Alien")).await;

        let lookup = cache.lookup([key(1), key(2), key(2), key(1), key(3)]).await;
        assert_eq!(lookup.hits.len(), 1);
        assert_eq!(lookup.misses, vec![key(2), key(3)]);
    }

    #[tokio::test]
    async fn test_periodic_persist_after_threshold() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path().join("cache.json.gz"));
        let probe = store.clone();
        let (cache, writer) = create_cache_system(CacheMap::new(), store, 3);
        tokio::spawn(writer.run());

        cache.update(key(1), record("a")).await;
        cache.update(key(2), record("b")).await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!probe.path().exists());

        cache.update(key(3), record("c")).await;
        wait_for_file(&probe).await;
        cache.flush().await;
        assert_eq!(probe.load().len(), 3);
    }

    #[tokio::test]
    async fn test_clear_persists_empty_cache() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path().join("cache.json.gz"));
        let probe = store.clone();
        let (cache, writer) = create_cache_system(CacheMap::new(), store, 10);
        tokio::spawn(writer.run());

        cache.update(key(1), record("a")).await;
        cache.flush().await;
        assert_eq!(probe.load().len(), 1);

        cache.clear().await;
        assert!(cache.is_empty().await);
        assert!(probe.load().is_empty());
    }

    #[tokio::test]
    async fn test_writer_final_save_on_shutdown() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path().join("cache.json.gz"));
        let probe = store.clone();
        let (cache, writer) = create_cache_system(CacheMap::new(), store, 100);
        let handle = tokio::spawn(writer.run());

        cache.update(key(7), record("g")).await;
        drop(cache);
        handle.await.unwrap();

        assert_eq!(probe.load().len(), 1);
    }

    #[tokio::test]
    async fn test_unchanged_cache_is_not_rewritten() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path().join("cache.json.gz"));
        let probe = store.clone();
        let (cache, writer) = create_cache_system(CacheMap::new(), store, 10);
        tokio::spawn(writer.run());

        cache.request_persist();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!probe.path().exists());
    }

    #[tokio::test]
    async fn test_info_reports_size_and_sorted_sample() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path().join("cache.json.gz"));
        let (cache, writer) = create_cache_system(CacheMap::new(), store, 10);
        tokio::spawn(writer.run());

        for id in [5, 3, 9] {
            cache.update(key(id), record("x")).await;
        }
        cache.flush().await;

        let info = cache.info(2).await;
        assert_eq!(info.size, 3);
        assert_eq!(info.sample_keys, vec!["movie_3", "movie_5"]);
        assert!(info.approximate_file_size_mb >= 0.0);
    }
}
