//! Core library for earthquake feed ingestion
//!
//! This crate provides the pieces of one ingestion run:
//! - GeoJSON feed fetch with bounded retry
//! - Normalization of feed features into flat records
//! - Batched, retrying delivery to a streaming sink
//! - Metrics and structured logging

pub mod delivery;
pub mod error;
pub mod feed;
pub mod models;
pub mod observability;
pub mod retry;
pub mod sink;

pub use delivery::{DeliveryConfig, DeliveryEngine, DeliveryReport, DeliveryStatus};
pub use error::{DeliveryError, FeedError, SinkError};
pub use feed::FeedClient;
pub use models::{Feature, FeedMetadata, Geometry, QuakeFeed, QuakeRecord};
pub use observability::IngestMetrics;
pub use retry::{retry_with_backoff, Retryable, RetryPolicy};
pub use sink::{BatchWriteResponse, HttpStreamSink, RecordSink, WriteEntry};
