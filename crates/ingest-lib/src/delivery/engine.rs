//! Delivery engine: accumulation, flushing, and partial-failure retry
//!
//! The engine buffers serialized records into a [`RecordBatch`], flushes when
//! a threshold is crossed, and on partial failure retries only the failed
//! subset with exponential backoff. A run either delivers every record or
//! fails loudly; no partial success is silently swallowed.

use tracing::{debug, error, warn};

use super::batch::{RecordBatch, DEFAULT_COUNT_LIMIT, DEFAULT_SIZE_LIMIT};
use crate::error::{DeliveryError, SinkError};
use crate::observability::IngestMetrics;
use crate::retry::RetryPolicy;
use crate::sink::{BatchWriteResponse, RecordSink};

/// Configuration for the delivery engine
#[derive(Debug, Clone)]
pub struct DeliveryConfig {
    /// Maximum records per batch
    pub count_limit: usize,
    /// Maximum aggregate batch size in bytes
    pub size_limit: usize,
    /// Retry budget and backoff for the partial-failure loop
    pub retry: RetryPolicy,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            count_limit: DEFAULT_COUNT_LIMIT,
            size_limit: DEFAULT_SIZE_LIMIT,
            retry: RetryPolicy::sink_write(),
        }
    }
}

/// Count of records the sink has accepted during one run
///
/// Created fresh per run, owned by the engine, never persisted.
#[derive(Debug, Default, Clone)]
pub struct DeliveryStatus {
    successful_records: u64,
}

impl DeliveryStatus {
    /// Increase the number of successful records by exactly one
    pub fn record_success(&mut self) {
        self.successful_records += 1;
    }

    pub fn snapshot(&self) -> u64 {
        self.successful_records
    }
}

/// Summary of one completed ingestion run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    pub records_delivered: u64,
    pub batches_flushed: u64,
}

/// Batched, retrying delivery to a record sink
pub struct DeliveryEngine<S> {
    sink: S,
    config: DeliveryConfig,
    batch: RecordBatch,
    status: DeliveryStatus,
    batches_flushed: u64,
    metrics: IngestMetrics,
}

impl<S: RecordSink> DeliveryEngine<S> {
    pub fn new(sink: S) -> Self {
        Self::with_config(sink, DeliveryConfig::default())
    }

    pub fn with_config(sink: S, config: DeliveryConfig) -> Self {
        let batch = RecordBatch::new(config.count_limit, config.size_limit);
        Self {
            sink,
            config,
            batch,
            status: DeliveryStatus::default(),
            batches_flushed: 0,
            metrics: IngestMetrics::new(),
        }
    }

    /// Records the sink has accepted so far
    pub fn status(&self) -> &DeliveryStatus {
        &self.status
    }

    /// Append one serialized record, flushing first if a threshold is crossed
    pub async fn push(&mut self, blob: Vec<u8>) -> Result<(), DeliveryError> {
        if self.batch.should_flush_before(blob.len()) {
            self.flush().await?;
        }
        self.batch.push(blob);
        Ok(())
    }

    /// Flush the remainder and return the run summary
    ///
    /// Consumes the engine: batch and status never outlive a run.
    pub async fn finish(mut self) -> Result<DeliveryReport, DeliveryError> {
        self.flush().await?;
        Ok(DeliveryReport {
            records_delivered: self.status.snapshot(),
            batches_flushed: self.batches_flushed,
        })
    }

    /// Drive a whole lazy sequence of records through the engine
    pub async fn deliver<I>(mut self, records: I) -> Result<DeliveryReport, DeliveryError>
    where
        I: IntoIterator<Item = Vec<u8>>,
    {
        for blob in records {
            self.push(blob).await?;
        }
        self.finish().await
    }

    /// Send the buffered batch to the sink; a no-op on an empty batch
    async fn flush(&mut self) -> Result<(), DeliveryError> {
        if self.batch.is_empty() {
            return Ok(());
        }

        let total = self.batch.len();
        let bytes = self.batch.byte_size();
        let mut pending = self.batch.take();

        debug!(records = total, bytes, "Submitting batch to sink");
        let mut response = self.submit(&pending).await?;

        if response.failed_count > 0 {
            let mut resolved = false;
            for attempt in 0..self.config.retry.max_attempts {
                // Indices are positions within the most recently submitted
                // list, so the retry set is re-derived from the latest
                // response on every attempt.
                let failed = response.failed_indices();
                warn!(
                    failed = failed.len(),
                    submitted = pending.len(),
                    attempt = attempt + 1,
                    "Sink rejected records, retrying failed subset"
                );
                self.metrics.inc_delivery_retries();

                let mut narrowed = Vec::with_capacity(failed.len());
                for index in failed {
                    narrowed.push(std::mem::take(&mut pending[index]));
                }
                pending = narrowed;

                response = self.submit(&pending).await?;
                if response.failed_count == 0 {
                    resolved = true;
                    break;
                }

                let backoff = self.config.retry.backoff_for(attempt);
                tokio::time::sleep(backoff).await;
            }

            if !resolved {
                error!(
                    failed = response.failed_count,
                    attempts = self.config.retry.max_attempts,
                    "Batch delivery failed after exhausting retries"
                );
                self.metrics.inc_delivery_failures();
                return Err(DeliveryError::RetriesExhausted {
                    attempts: self.config.retry.max_attempts,
                    failed: response.failed_count,
                    last_response: response,
                });
            }
        }

        for _ in 0..total {
            self.status.record_success();
        }
        self.batches_flushed += 1;
        self.metrics.add_records_delivered(total as u64);
        self.metrics.inc_batches_flushed();
        self.metrics.observe_batch_bytes(bytes);

        Ok(())
    }

    async fn submit(&self, records: &[Vec<u8>]) -> Result<BatchWriteResponse, DeliveryError> {
        let response = self.sink.put_record_batch(records).await?;
        if response.entries.len() != records.len() {
            return Err(DeliveryError::Sink(SinkError::EntryCountMismatch {
                expected: records.len(),
                actual: response.entries.len(),
            }));
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_counts_by_one() {
        let mut status = DeliveryStatus::default();
        assert_eq!(status.snapshot(), 0);

        status.record_success();
        status.record_success();
        assert_eq!(status.snapshot(), 2);
    }

    #[test]
    fn test_config_defaults() {
        let config = DeliveryConfig::default();
        assert_eq!(config.count_limit, 500);
        assert_eq!(config.size_limit, 4_000_000);
        assert_eq!(config.retry.max_attempts, 5);
    }
}
