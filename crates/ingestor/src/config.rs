//! Ingestor configuration

use anyhow::Result;
use serde::Deserialize;

/// Ingestor configuration
#[derive(Debug, Clone, Deserialize)]
pub struct IngestConfig {
    /// Base URL of the earthquake feed API
    #[serde(default = "default_feed_url")]
    pub feed_url: String,

    /// How many past hours of events to fetch per run
    #[serde(default = "default_lookback_hours")]
    pub lookback_hours: u32,

    /// Batched write endpoint of the streaming sink
    #[serde(default = "default_sink_endpoint")]
    pub sink_endpoint: String,

    /// Delivery stream to write records into
    #[serde(default = "default_stream_name")]
    pub stream_name: String,
}

fn default_feed_url() -> String {
    "https://earthquake.usgs.gov/fdsnws/event/1".to_string()
}

fn default_lookback_hours() -> u32 {
    1
}

fn default_sink_endpoint() -> String {
    "http://localhost:8181/put-record-batch".to_string()
}

fn default_stream_name() -> String {
    "earthquake-events".to_string()
}

impl IngestConfig {
    /// Load configuration from the environment
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("INGEST"))
            .build()?;

        Ok(config.try_deserialize().unwrap_or_else(|_| IngestConfig {
            feed_url: default_feed_url(),
            lookback_hours: default_lookback_hours(),
            sink_endpoint: default_sink_endpoint(),
            stream_name: default_stream_name(),
        }))
    }
}
