//! Quake ingestor - fetches recent earthquake events and delivers them to the
//! streaming sink
//!
//! One invocation is one ingestion run: fetch the feed document, normalize it
//! into flat records, and deliver them in bounded batches. An external
//! scheduler re-invokes the binary; a failed run exits nonzero and delivers
//! nothing silently.

use anyhow::{Context, Result};
use ingest_lib::{DeliveryEngine, DeliveryReport, FeedClient, HttpStreamSink};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    let config = config::IngestConfig::load()?;
    info!(
        feed_url = %config.feed_url,
        lookback_hours = config.lookback_hours,
        stream = %config.stream_name,
        "Starting ingestion run"
    );

    let report = run(&config).await?;

    info!(
        records = report.records_delivered,
        batches = report.batches_flushed,
        "Ingestion run complete"
    );
    Ok(())
}

async fn run(config: &config::IngestConfig) -> Result<DeliveryReport> {
    let feed_client =
        FeedClient::new(&config.feed_url).context("failed to build feed client")?;
    let feed = feed_client.fetch(config.lookback_hours).await?;
    info!(
        features = feed.features.len(),
        generated_at = ?feed.generated_at(),
        "Fetched earthquake feed"
    );

    let sink = HttpStreamSink::new(&config.sink_endpoint, &config.stream_name)
        .context("failed to build stream sink")?;
    let mut engine = DeliveryEngine::new(sink);

    for record in feed.normalize()? {
        let blob = record.to_blob().context("failed to serialize record")?;
        engine.push(blob).await?;
    }

    let report = engine.finish().await?;
    Ok(report)
}
