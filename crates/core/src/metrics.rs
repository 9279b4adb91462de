//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Classifier (filesets classified, exclusions)
//! - Orchestrator (acquisition attempts, bytes written)
//! - Content API (requests, latency)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Classifier Metrics
// =============================================================================

/// Filesets classified by content kind.
pub static FILESETS_CLASSIFIED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "versekit_filesets_classified_total",
            "Total filesets classified",
        ),
        &["kind"], // "audio", "text", "other"
    )
    .unwrap()
});

/// Exclusion records by category.
pub static EXCLUSIONS_RECORDED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "versekit_exclusions_recorded_total",
            "Total filesets excluded from acquisition",
        ),
        &["category"],
    )
    .unwrap()
});

// =============================================================================
// Orchestrator Metrics
// =============================================================================

/// Acquisition attempts by content type and result.
pub static ACQUISITION_ATTEMPTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "versekit_acquisition_attempts_total",
            "Total content acquisition attempts",
        ),
        &["content_type", "result"], // result: "downloaded", "existing", "failed"
    )
    .unwrap()
});

/// Bytes written to the content store.
pub static BYTES_WRITTEN: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "versekit_bytes_written_total",
        "Total bytes written to the content store",
    )
    .unwrap()
});

// =============================================================================
// Content API Metrics
// =============================================================================

/// Content API requests by operation and outcome.
pub static CONTENT_API_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "versekit_content_api_requests_total",
            "Total content API requests",
        ),
        &["operation", "status"], // status: "ok", "empty", "error"
    )
    .unwrap()
});

/// Content API request duration in seconds.
pub static CONTENT_API_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "versekit_content_api_duration_seconds",
            "Duration of content API requests",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &["operation"],
    )
    .unwrap()
});

/// All core metrics, for registration with a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Classifier
        Box::new(FILESETS_CLASSIFIED.clone()),
        Box::new(EXCLUSIONS_RECORDED.clone()),
        // Orchestrator
        Box::new(ACQUISITION_ATTEMPTS.clone()),
        Box::new(BYTES_WRITTEN.clone()),
        // Content API
        Box::new(CONTENT_API_REQUESTS.clone()),
        Box::new(CONTENT_API_DURATION.clone()),
    ]
}
