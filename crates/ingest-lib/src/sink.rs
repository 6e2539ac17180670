//! Sink write primitive with partial-failure semantics
//!
//! The delivery engine depends on exactly one boundary contract: submit an
//! ordered list of serialized records, get back a failed count and a parallel
//! list of per-item results where each result optionally carries an error
//! code. Any sink exposing that shape fits — the production implementation
//! here is a batched HTTP endpoint.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::SinkError;
use crate::retry::{retry_with_backoff, RetryPolicy};

/// Per-item result of a batch write
///
/// An entry with an error code marks a failed record; an empty entry marks an
/// accepted one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WriteEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl WriteEntry {
    pub fn is_failed(&self) -> bool {
        self.error_code.is_some()
    }
}

/// Response to one batch write: failed count plus per-item entries parallel
/// to the submitted list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchWriteResponse {
    pub failed_count: usize,
    pub entries: Vec<WriteEntry>,
}

impl BatchWriteResponse {
    /// Indices of failed records, relative to the submitted list this
    /// response answers
    pub fn failed_indices(&self) -> Vec<usize> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.is_failed())
            .map(|(index, _)| index)
            .collect()
    }
}

/// Trait for streaming sinks accepting batched writes
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// Submit an ordered list of serialized records in one call
    async fn put_record_batch(&self, records: &[Vec<u8>]) -> Result<BatchWriteResponse, SinkError>;
}

#[async_trait]
impl<'a, S: RecordSink + ?Sized> RecordSink for &'a S {
    async fn put_record_batch(&self, records: &[Vec<u8>]) -> Result<BatchWriteResponse, SinkError> {
        (**self).put_record_batch(records).await
    }
}

#[derive(Serialize)]
struct PutRecordBatchRequest<'a> {
    stream: &'a str,
    records: Vec<&'a str>,
}

/// Batched HTTP sink
///
/// POSTs `{"stream", "records"}` to the configured endpoint and decodes the
/// partial-failure response. Transport failures and non-success statuses are
/// retried by the shared transport policy before propagating; item-level
/// failures inside a 2xx response are the delivery engine's job, not ours.
pub struct HttpStreamSink {
    client: reqwest::Client,
    endpoint: Url,
    stream_name: String,
    retry: RetryPolicy,
}

impl HttpStreamSink {
    pub fn new(endpoint: &str, stream_name: &str) -> Result<Self, SinkError> {
        Self::with_policy(endpoint, stream_name, RetryPolicy::transport())
    }

    pub fn with_policy(
        endpoint: &str,
        stream_name: &str,
        retry: RetryPolicy,
    ) -> Result<Self, SinkError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;
        let endpoint = Url::parse(endpoint)?;

        Ok(Self {
            client,
            endpoint,
            stream_name: stream_name.to_string(),
            retry,
        })
    }

    pub fn stream_name(&self) -> &str {
        &self.stream_name
    }
}

#[async_trait]
impl RecordSink for HttpStreamSink {
    async fn put_record_batch(&self, records: &[Vec<u8>]) -> Result<BatchWriteResponse, SinkError> {
        let mut payloads = Vec::with_capacity(records.len());
        for blob in records {
            let text = std::str::from_utf8(blob).map_err(|_| SinkError::InvalidPayload)?;
            payloads.push(text);
        }
        let request = PutRecordBatchRequest {
            stream: &self.stream_name,
            records: payloads,
        };

        let client = &self.client;
        let endpoint = &self.endpoint;
        let request = &request;

        retry_with_backoff(&self.retry, "put_record_batch", move || async move {
            let response = client.post(endpoint.clone()).json(request).send().await?;

            if !response.status().is_success() {
                return Err(SinkError::Status {
                    status: response.status(),
                });
            }

            let body = response.text().await?;
            serde_json::from_str(&body).map_err(SinkError::Decode)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_backoff: Duration::ZERO,
            max_backoff: None,
        }
    }

    fn records(texts: &[&str]) -> Vec<Vec<u8>> {
        texts.iter().map(|t| t.as_bytes().to_vec()).collect()
    }

    #[test]
    fn test_failed_indices() {
        let response = BatchWriteResponse {
            failed_count: 2,
            entries: vec![
                WriteEntry::default(),
                WriteEntry {
                    error_code: Some("ServiceUnavailableException".to_string()),
                    error_message: None,
                },
                WriteEntry::default(),
                WriteEntry {
                    error_code: Some("ThrottlingException".to_string()),
                    error_message: Some("slow down".to_string()),
                },
            ],
        };

        assert_eq!(response.failed_indices(), vec![1, 3]);
    }

    #[tokio::test]
    async fn test_put_record_batch_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/put-record-batch")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "stream": "quakes"
            })))
            .with_status(200)
            .with_body(r#"{"failed_count": 0, "entries": [{}, {}]}"#)
            .create_async()
            .await;

        let sink = HttpStreamSink::with_policy(
            &format!("{}/put-record-batch", server.url()),
            "quakes",
            fast_policy(3),
        )
        .unwrap();

        let response = sink
            .put_record_batch(&records(&["{\"a\":1}\n", "{\"b\":2}\n"]))
            .await
            .unwrap();

        assert_eq!(response.failed_count, 0);
        assert_eq!(response.entries.len(), 2);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_server_error_is_retried_then_fatal() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/put-record-batch")
            .with_status(503)
            .expect(3)
            .create_async()
            .await;

        let sink = HttpStreamSink::with_policy(
            &format!("{}/put-record-batch", server.url()),
            "quakes",
            fast_policy(3),
        )
        .unwrap();

        let err = sink
            .put_record_batch(&records(&["{}\n"]))
            .await
            .unwrap_err();

        assert!(matches!(err, SinkError::Status { .. }));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_utf8_payload_is_rejected_without_sending() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/put-record-batch")
            .expect(0)
            .create_async()
            .await;

        let sink = HttpStreamSink::with_policy(
            &format!("{}/put-record-batch", server.url()),
            "quakes",
            fast_policy(3),
        )
        .unwrap();

        let err = sink
            .put_record_batch(&[vec![0xff, 0xfe]])
            .await
            .unwrap_err();

        assert!(matches!(err, SinkError::InvalidPayload));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_undecodable_response_is_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/put-record-batch")
            .with_status(200)
            .with_body("not json")
            .expect(1)
            .create_async()
            .await;

        let sink = HttpStreamSink::with_policy(
            &format!("{}/put-record-batch", server.url()),
            "quakes",
            fast_policy(3),
        )
        .unwrap();

        let err = sink
            .put_record_batch(&records(&["{}\n"]))
            .await
            .unwrap_err();

        assert!(matches!(err, SinkError::Decode(_)));
        mock.assert_async().await;
    }
}
