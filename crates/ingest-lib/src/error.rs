//! Error taxonomy for an ingestion run
//!
//! Transient item failures are recovered inside the delivery engine's retry
//! loop and never surface here. Everything in this module is either retryable
//! at the transport layer or fatal to the whole run.

use reqwest::StatusCode;
use thiserror::Error;

use crate::retry::Retryable;
use crate::sink::BatchWriteResponse;

/// Errors from fetching or normalizing the earthquake feed
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("feed request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("feed returned status {status}")]
    Status { status: StatusCode },

    /// Retrying a malformed document cannot fix it
    #[error("malformed feed document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("malformed feed document: {0}")]
    Malformed(String),
}

impl Retryable for FeedError {
    fn is_retryable(&self) -> bool {
        matches!(self, FeedError::Transport(_) | FeedError::Status { .. })
    }
}

/// Errors from the sink write primitive
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("sink returned status {status}")]
    Status { status: StatusCode },

    #[error("failed to decode sink response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("sink response carried {actual} entries for {expected} submitted records")]
    EntryCountMismatch { expected: usize, actual: usize },

    #[error("record payload is not valid UTF-8")]
    InvalidPayload,

    #[error("invalid sink endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
}

impl Retryable for SinkError {
    fn is_retryable(&self) -> bool {
        matches!(self, SinkError::Transport(_) | SinkError::Status { .. })
    }
}

/// Fatal delivery failures
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("sink write failed: {0}")]
    Sink(#[from] SinkError),

    /// Failures persisted through the full retry budget; the last sink
    /// response identifies the records still failing.
    #[error("sink still reported {failed} failed records after {attempts} retry attempts")]
    RetriesExhausted {
        attempts: u32,
        failed: usize,
        last_response: BatchWriteResponse,
    },
}
