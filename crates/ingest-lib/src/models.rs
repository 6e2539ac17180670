//! Feed document types and record normalization
//!
//! The feed is a GeoJSON feature collection: a metadata object with the
//! generation timestamp, a list of geometry+properties features, and an
//! optional bounding box. Normalization flattens each feature into a
//! [`QuakeRecord`] carrying the shared feed-level fields alongside the
//! feature's own geometry and properties.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::FeedError;

/// Feed-level metadata from the GeoJSON document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedMetadata {
    /// Generation timestamp in epoch milliseconds
    #[serde(default)]
    pub generated: Option<i64>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub status: Option<i64>,
    #[serde(default)]
    pub api: Option<String>,
    #[serde(default)]
    pub count: Option<u64>,
}

/// Geometry of a single feature
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Geometry {
    #[serde(rename = "type")]
    pub geometry_type: String,
    pub coordinates: Vec<f64>,
}

/// One earthquake event feature
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type")]
    pub feature_type: String,
    #[serde(default)]
    pub properties: Option<serde_json::Value>,
    pub geometry: Geometry,
    #[serde(default)]
    pub id: Option<String>,
}

/// Parsed earthquake feed document
///
/// Unknown fields are ignored so upstream additions to the feed do not break
/// parsing; missing required fields (a feature without geometry, say) fail at
/// parse time and are never retried.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuakeFeed {
    #[serde(rename = "type")]
    pub feed_type: String,
    pub metadata: FeedMetadata,
    pub features: Vec<Feature>,
    #[serde(default)]
    pub bbox: Option<Vec<f64>>,
}

/// Flat, normalized record for one earthquake event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuakeRecord {
    pub generated: i64,
    pub properties: Option<serde_json::Value>,
    pub geometry_type: String,
    pub geometry_coordinates: Vec<f64>,
    pub bbox: Option<Vec<f64>>,
}

impl QuakeRecord {
    /// Serialized form: compact JSON plus a trailing newline, UTF-8 encoded.
    pub fn to_blob(&self) -> Result<Vec<u8>, serde_json::Error> {
        let mut blob = serde_json::to_vec(self)?;
        blob.push(b'\n');
        Ok(blob)
    }
}

impl QuakeFeed {
    /// Feed generation time, if the metadata carries one
    pub fn generated_at(&self) -> Option<DateTime<Utc>> {
        self.metadata
            .generated
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
    }

    /// Lazily normalize the feed into flat records
    ///
    /// The iterator is finite and single-pass; an empty feature list yields an
    /// empty iterator. A non-empty feed without a generation timestamp is
    /// malformed and fails fast before any record is produced.
    pub fn normalize(&self) -> Result<impl Iterator<Item = QuakeRecord> + '_, FeedError> {
        let generated = match self.metadata.generated {
            Some(generated) => generated,
            None if self.features.is_empty() => 0,
            None => {
                return Err(FeedError::Malformed(
                    "feed metadata is missing the generated timestamp".to_string(),
                ))
            }
        };

        Ok(self.features.iter().map(move |feature| QuakeRecord {
            generated,
            properties: feature.properties.clone(),
            geometry_type: feature.geometry.geometry_type.clone(),
            geometry_coordinates: feature.geometry.coordinates.clone(),
            bbox: self.bbox.clone(),
        }))
    }
}
