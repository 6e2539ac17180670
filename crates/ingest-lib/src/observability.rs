//! Observability infrastructure for the ingestor
//!
//! Prometheus metrics for the hot path: fetch latency, flushed batch sizes,
//! delivered record counts, and retry/failure counters.

use prometheus::{
    register_histogram, register_int_counter, Histogram, IntCounter,
};
use std::sync::OnceLock;

/// Histogram buckets for feed fetch latency (in seconds)
const FETCH_LATENCY_BUCKETS: &[f64] = &[0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0];

/// Histogram buckets for flushed batch sizes (in bytes)
const BATCH_BYTES_BUCKETS: &[f64] = &[
    1_000.0, 10_000.0, 100_000.0, 500_000.0, 1_000_000.0, 2_000_000.0, 4_000_000.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<IngestMetricsInner> = OnceLock::new();

struct IngestMetricsInner {
    records_delivered: IntCounter,
    batches_flushed: IntCounter,
    delivery_retries: IntCounter,
    delivery_failures: IntCounter,
    feed_fetch_errors: IntCounter,
    feed_fetch_latency_seconds: Histogram,
    batch_bytes: Histogram,
}

impl IngestMetricsInner {
    fn new() -> Self {
        Self {
            records_delivered: register_int_counter!(
                "quake_ingest_records_delivered_total",
                "Total number of records accepted by the sink"
            )
            .expect("Failed to register records_delivered"),

            batches_flushed: register_int_counter!(
                "quake_ingest_batches_flushed_total",
                "Total number of batches flushed to the sink"
            )
            .expect("Failed to register batches_flushed"),

            delivery_retries: register_int_counter!(
                "quake_ingest_delivery_retries_total",
                "Total number of partial-failure retry attempts"
            )
            .expect("Failed to register delivery_retries"),

            delivery_failures: register_int_counter!(
                "quake_ingest_delivery_failures_total",
                "Total number of batches abandoned after exhausting retries"
            )
            .expect("Failed to register delivery_failures"),

            feed_fetch_errors: register_int_counter!(
                "quake_ingest_feed_fetch_errors_total",
                "Total number of failed feed fetch attempts"
            )
            .expect("Failed to register feed_fetch_errors"),

            feed_fetch_latency_seconds: register_histogram!(
                "quake_ingest_feed_fetch_latency_seconds",
                "Time spent fetching the earthquake feed",
                FETCH_LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register feed_fetch_latency_seconds"),

            batch_bytes: register_histogram!(
                "quake_ingest_batch_bytes",
                "Aggregate byte size of flushed batches",
                BATCH_BYTES_BUCKETS.to_vec()
            )
            .expect("Failed to register batch_bytes"),
        }
    }
}

/// Ingestion metrics for Prometheus exposition
///
/// This is a lightweight handle to the global metrics instance.
/// Multiple clones share the same underlying metrics.
#[derive(Clone)]
pub struct IngestMetrics {
    _private: (),
}

impl Default for IngestMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl IngestMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(IngestMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &IngestMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    pub fn add_records_delivered(&self, count: u64) {
        self.inner().records_delivered.inc_by(count);
    }

    pub fn inc_batches_flushed(&self) {
        self.inner().batches_flushed.inc();
    }

    pub fn inc_delivery_retries(&self) {
        self.inner().delivery_retries.inc();
    }

    pub fn inc_delivery_failures(&self) {
        self.inner().delivery_failures.inc();
    }

    pub fn inc_feed_fetch_errors(&self) {
        self.inner().feed_fetch_errors.inc();
    }

    pub fn observe_fetch_latency(&self, duration_secs: f64) {
        self.inner().feed_fetch_latency_seconds.observe(duration_secs);
    }

    pub fn observe_batch_bytes(&self, bytes: usize) {
        self.inner().batch_bytes.observe(bytes as f64);
    }
}
