//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Enrichment cache (lookups, size)
//! - Upstream metadata API (requests, latency)
//! - Snapshot persistence

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Enrichment Cache
// =============================================================================

/// Cache lookups by result.
pub static CACHE_LOOKUPS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("marquee_cache_lookups_total", "Total enrichment cache lookups"),
        &["result"], // "hit", "miss"
    )
    .unwrap()
});

/// Entries currently held in the cache.
pub static CACHE_ENTRIES: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "marquee_cache_entries",
        "Number of records in the enrichment cache",
    )
    .unwrap()
});

// =============================================================================
// Upstream API
// =============================================================================

/// Upstream requests total.
pub static UPSTREAM_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "marquee_upstream_requests_total",
            "Total upstream metadata requests",
        ),
        &["service", "kind", "status"], // status: "success" or an error label
    )
    .unwrap()
});

/// Upstream request duration.
pub static UPSTREAM_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "marquee_upstream_duration_seconds",
            "Duration of upstream metadata requests",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["service"],
    )
    .unwrap()
});

// =============================================================================
// Snapshot
// =============================================================================

/// Snapshot writes by result.
pub static SNAPSHOT_SAVES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("marquee_snapshot_saves_total", "Total snapshot writes"),
        &["result"], // "success", "failed"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(CACHE_LOOKUPS.clone()),
        Box::new(CACHE_ENTRIES.clone()),
        Box::new(UPSTREAM_REQUESTS.clone()),
        Box::new(UPSTREAM_DURATION.clone()),
        Box::new(SNAPSHOT_SAVES.clone()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::Registry;

    #[test]
    fn test_all_metrics_register_without_conflicts() {
        let registry = Registry::new();
        for metric in all_metrics() {
            registry.register(metric).unwrap();
        }
    }
}
