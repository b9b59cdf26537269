use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use marquee_core::{
    create_cache_system, load_config, validate_config, BatchFetcher, CatalogStore, FetcherConfig,
    FsCatalogStore, MetadataSource, PagePipeline, ProfileCacheStore, SnapshotStore, TmdbClient,
};
use marquee_server::{api::create_router, state::AppState};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("MARQUEE_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Catalog directory: {:?}", config.catalog.dir);
    info!("Cache snapshot: {:?}", config.cache.snapshot_path);

    // Restore the enrichment cache from its last snapshot
    let store = SnapshotStore::new(&config.cache.snapshot_path);
    let initial = store.load();
    info!(entries = initial.len(), "Enrichment cache restored");

    let (cache, snapshot_writer) = create_cache_system(initial, store, config.cache.persist_every);
    let cache = Arc::new(cache);

    // Spawn snapshot writer task
    let writer_handle = tokio::spawn(snapshot_writer.run());

    // Upstream metadata client
    let upstream: Arc<dyn MetadataSource> = Arc::new(
        TmdbClient::new(&config.upstream).context("Failed to create TMDB client")?,
    );
    info!(
        "Upstream metadata via {} (max {} concurrent, {}s timeout)",
        upstream.name(),
        config.upstream.max_concurrent,
        config.upstream.timeout_secs
    );

    let fetcher = BatchFetcher::new(
        upstream,
        Arc::clone(&cache),
        FetcherConfig::from(&config.upstream),
    );
    let catalog: Arc<dyn CatalogStore> = Arc::new(FsCatalogStore::new(&config.catalog.dir));
    let pipeline = Arc::new(PagePipeline::new(
        catalog,
        Arc::clone(&cache),
        fetcher,
        config.cache.clear_secret.clone(),
    ));
    let profiles = ProfileCacheStore::new(&config.profile_cache.dir);

    // Create app state
    let state = Arc::new(AppState::new(config.clone(), pipeline, profiles));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down...");

    // Write the latest state, then close the writer's channel by dropping
    // the last cache handle. The router (and its clones) is already gone.
    cache.flush().await;
    drop(cache);

    // Wait for writer to finish its final save
    let _ = writer_handle.await;
    info!("Snapshot writer stopped");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
