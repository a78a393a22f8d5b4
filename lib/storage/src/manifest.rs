//! Manifests: the single record that makes a set of artifact blobs live
//!
//! A manifest is always written after the blobs it references, so readers see
//! either the complete previous version or the complete new one.

use crate::persistence::BlobRef;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Test accuracy of one candidate, in declaration order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoreEntry {
    pub name: String,
    pub accuracy: f64,
}

/// Training outcome recorded with a published model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelSummary {
    pub schema_version: u32,
    /// Label codec class table; code `i` decodes to `classes[i]`
    pub classes: Vec<String>,
    pub winner: String,
    pub model_kind: String,
    pub accuracy: f64,
    pub quality_floor: f64,
    pub scores: Vec<ScoreEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelManifest {
    pub version: String,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub summary: ModelSummary,
    pub encoder: BlobRef,
    pub model: BlobRef,
}

/// Build parameters recorded with a published index
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexSummary {
    pub chunks: usize,
    pub documents: Vec<String>,
    pub dim: usize,
    /// Serialized embedder configuration the index was built with
    pub embedder: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexManifest {
    pub version: String,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub summary: IndexSummary,
    pub index: BlobRef,
}
