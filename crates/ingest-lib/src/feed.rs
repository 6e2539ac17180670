//! Earthquake feed fetch with bounded retry
//!
//! Fetches the GeoJSON feed for a lookback window of the past N hours and
//! parses it into a [`QuakeFeed`]. Transport failures and non-200 statuses
//! are retried under the transport policy (3 attempts, 2s backoff capped at
//! 30s); malformed bodies fail fast.

use std::time::Instant;

use reqwest::StatusCode;
use tracing::{debug, error};

use crate::error::FeedError;
use crate::models::QuakeFeed;
use crate::observability::IngestMetrics;
use crate::retry::{retry_with_backoff, RetryPolicy};

/// HTTP client for the earthquake feed
pub struct FeedClient {
    client: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
    metrics: IngestMetrics,
}

impl FeedClient {
    pub fn new(base_url: &str) -> Result<Self, FeedError> {
        Self::with_policy(base_url, RetryPolicy::transport())
    }

    pub fn with_policy(base_url: &str, retry: RetryPolicy) -> Result<Self, FeedError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry,
            metrics: IngestMetrics::new(),
        })
    }

    /// Fetch earthquake events from the past `hours` hours
    pub async fn fetch(&self, hours: u32) -> Result<QuakeFeed, FeedError> {
        let url = format!(
            "{}/query?format=geojson&starttime=NOW-{}hour&endtime=NOW",
            self.base_url, hours
        );

        let client = &self.client;
        let metrics = &self.metrics;
        let url = url.as_str();

        let start = Instant::now();
        let result = retry_with_backoff(&self.retry, "feed_fetch", move || async move {
            let outcome = fetch_once(client, url).await;
            if outcome.is_err() {
                metrics.inc_feed_fetch_errors();
            }
            outcome
        })
        .await;
        self.metrics.observe_fetch_latency(start.elapsed().as_secs_f64());

        match &result {
            Ok(feed) => debug!(
                features = feed.features.len(),
                lookback_hours = hours,
                "Fetched earthquake feed"
            ),
            Err(err) => error!(error = %err, url = url, "Feed fetch failed"),
        }
        result
    }
}

async fn fetch_once(client: &reqwest::Client, url: &str) -> Result<QuakeFeed, FeedError> {
    let response = client.get(url).send().await?;

    if response.status() != StatusCode::OK {
        return Err(FeedError::Status {
            status: response.status(),
        });
    }

    let body = response.text().await?;
    serde_json::from_str(&body).map_err(FeedError::Parse)
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

    const FEED_BODY: &str = r#"{
        "type": "FeatureCollection",
        "metadata": {"generated": 1700000000000, "count": 1},
        "features": [
            {
                "type": "Feature",
                "properties": {"mag": 3.3},
                "geometry": {"type": "Point", "coordinates": [10.0, 20.0, 5.0]},
                "id": "us7000aaaa"
            }
        ]
    }"#;

    #[tokio::test]
    async fn test_fetch_parses_feed() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/query")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("format".to_string(), "geojson".to_string()),
                mockito::Matcher::UrlEncoded("starttime".to_string(), "NOW-1hour".to_string()),
                mockito::Matcher::UrlEncoded("endtime".to_string(), "NOW".to_string()),
            ]))
            .with_status(200)
            .with_body(FEED_BODY)
            .create_async()
            .await;

        let client = FeedClient::with_policy(&server.url(), fast_policy(3)).unwrap();
        let feed = client.fetch(1).await.unwrap();

        assert_eq!(feed.features.len(), 1);
        assert_eq!(feed.metadata.generated, Some(1700000000000));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_200_is_retried_then_fatal() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/query")
            .match_query(mockito::Matcher::Any)
            .with_status(500)
            .expect(3)
            .create_async()
            .await;

        let client = FeedClient::with_policy(&server.url(), fast_policy(3)).unwrap();
        let err = client.fetch(1).await.unwrap_err();

        assert!(matches!(
            err,
            FeedError::Status {
                status: StatusCode::INTERNAL_SERVER_ERROR
            }
        ));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_malformed_body_is_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/query")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body("{\"type\": \"FeatureCollection\"")
            .expect(1)
            .create_async()
            .await;

        let client = FeedClient::with_policy(&server.url(), fast_policy(3)).unwrap();
        let err = client.fetch(1).await.unwrap_err();

        assert!(matches!(err, FeedError::Parse(_)));
        mock.assert_async().await;
    }
}
