use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::{cache, catalog, handlers, middleware::metrics_middleware, profiles};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Enrichment cache
        .route("/cache/info", get(cache::get_info))
        .route("/cache/clear", post(cache::clear))
        // Profile cache
        .route(
            "/profiles/{hashed_login}/{path}/{file_hash}",
            get(profiles::get_profile_cache)
                .post(profiles::save_profile_cache)
                .delete(profiles::delete_profile_cache),
        );

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        // Catalog pages
        .route("/{category}", get(catalog::get_page))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
