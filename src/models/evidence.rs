//! Evidence documents.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Metadata key holding a document's provenance label.
pub const SOURCE_KEY: &str = "source";

/// Label used when a document carries no source.
pub const UNKNOWN_SOURCE: &str = "Unknown";

/// A document submitted for ingestion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewDocument {
    /// Text content.
    pub content: String,
    /// Arbitrary metadata. `source` is the provenance label.
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl NewDocument {
    /// Creates a document with empty metadata.
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: Map::new(),
        }
    }

    /// Adds a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// A stored, embedded document. Never updated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceDocument {
    /// Unique identifier.
    pub id: String,
    /// Text content.
    pub content: String,
    /// Fixed-length embedding of `content`.
    pub embedding: Vec<f32>,
    /// Arbitrary metadata.
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl EvidenceDocument {
    /// Returns the document's source label.
    #[must_use]
    pub fn source(&self) -> &str {
        source_of(&self.metadata)
    }
}

/// Reads the source label out of a metadata map.
#[must_use]
pub fn source_of(metadata: &Map<String, Value>) -> &str {
    metadata
        .get(SOURCE_KEY)
        .and_then(Value::as_str)
        .unwrap_or(UNKNOWN_SOURCE)
}

/// A retrieved document with its similarity to the query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceHit {
    /// Where the snippet comes from.
    pub source: String,
    /// Text content.
    pub content: String,
    /// Similarity to the query (higher is more relevant).
    pub relevance_score: f32,
}

impl EvidenceHit {
    /// Creates a hit.
    #[must_use]
    pub fn new(source: impl Into<String>, content: impl Into<String>, relevance_score: f32) -> Self {
        Self {
            source: source.into(),
            content: content.into(),
            relevance_score,
        }
    }
}
