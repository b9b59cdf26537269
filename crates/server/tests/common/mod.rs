//! Common test utilities for in-process API testing with mocks.
//!
//! This module provides a test fixture that builds the router over a mock
//! upstream source, a temp catalog directory and a temp snapshot file.

use std::io::Write;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use flate2::write::GzEncoder;
use flate2::Compression;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use marquee_core::{
    config::{CacheConfig, CatalogConfig, ProfileCacheConfig, ServerConfig, UpstreamConfig},
    create_cache_system,
    testing::MockMetadataSource,
    BatchFetcher, CatalogStore, Config, EnrichmentCache, FetcherConfig, FsCatalogStore,
    MetadataSource, PagePipeline, ProfileCacheStore, SnapshotStore,
};
use marquee_server::{api::create_router, state::AppState};

/// Re-export fixtures for test convenience
pub use marquee_core::testing::fixtures;

/// Secret accepted by the cache clear endpoint.
pub const CLEAR_SECRET: &str = "fixture-secret";

/// Test fixture for API testing with mock dependencies.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_page() {
///     let fixture = TestFixture::new().await;
///     fixture.write_catalog("movies", &fixtures::items_document(vec![]));
///
///     let response = fixture.get("/movies?page=1").await;
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock upstream source - configure records and failures
    pub source: Arc<MockMetadataSource>,
    /// The enrichment cache behind the router
    pub cache: Arc<EnrichmentCache>,
    /// Temporary directory for catalogs, snapshot and profile blobs
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Create a new test fixture.
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let catalog_dir = temp_dir.path().join("releases");
        std::fs::create_dir_all(&catalog_dir).expect("Failed to create catalog dir");

        // Create config
        let config = Config {
            server: ServerConfig {
                host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                port: 0, // Not used for in-process testing
            },
            catalog: CatalogConfig {
                dir: catalog_dir.clone(),
            },
            upstream: UpstreamConfig {
                api_token: "fixture-token".to_string(),
                ..Default::default()
            },
            cache: CacheConfig {
                snapshot_path: temp_dir.path().join("cache.json.gz"),
                persist_every: 10,
                clear_secret: CLEAR_SECRET.to_string(),
            },
            profile_cache: ProfileCacheConfig {
                dir: temp_dir.path().join("profiles"),
            },
        };

        // Create cache system
        let store = SnapshotStore::new(&config.cache.snapshot_path);
        let (cache, writer) = create_cache_system(store.load(), store, config.cache.persist_every);
        let cache = Arc::new(cache);

        // Spawn snapshot writer
        tokio::spawn(writer.run());

        // Create pipeline over the mock source
        let source = Arc::new(MockMetadataSource::new());
        let fetcher = BatchFetcher::new(
            Arc::clone(&source) as Arc<dyn MetadataSource>,
            Arc::clone(&cache),
            FetcherConfig::from(&config.upstream),
        );
        let catalog: Arc<dyn CatalogStore> = Arc::new(FsCatalogStore::new(&catalog_dir));
        let pipeline = Arc::new(PagePipeline::new(
            catalog,
            Arc::clone(&cache),
            fetcher,
            CLEAR_SECRET.to_string(),
        ));
        let profiles = ProfileCacheStore::new(&config.profile_cache.dir);

        let state = Arc::new(AppState::new(config, pipeline, profiles));
        let router = create_router(state);

        Self {
            router,
            source,
            cache,
            temp_dir,
        }
    }

    /// Write `document` as `<category>.json.gz` in the catalog directory.
    pub fn write_catalog(&self, category: &str, document: &Value) {
        let path = self
            .temp_dir
            .path()
            .join("releases")
            .join(format!("{category}.json.gz"));
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(&serde_json::to_vec(document).unwrap())
            .unwrap();
        std::fs::write(path, encoder.finish().unwrap()).unwrap();
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, &[], None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, &[], Some(body)).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path, &[], None).await
    }

    /// Send a request with extra headers.
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        headers: &[(&str, &str)],
        body: Option<Value>,
    ) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);
        for (name, value) in headers {
            request_builder = request_builder.header(*name, *value);
        }

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}
