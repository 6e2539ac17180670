//! Batched, retrying delivery to the record sink
//!
//! This module provides:
//! - An in-memory batch with count and byte-size flush thresholds
//! - A delivery engine that retries only the failed subset of a batch
//! - A per-run status counter and run summary

mod batch;
mod engine;


pub use batch::{RecordBatch, DEFAULT_COUNT_LIMIT, DEFAULT_SIZE_LIMIT};
pub use engine::{DeliveryConfig, DeliveryEngine, DeliveryReport, DeliveryStatus};
