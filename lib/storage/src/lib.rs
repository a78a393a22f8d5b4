//! Artifact storage for fertirag
//!
//! Every artifact write goes through an atomic temp-file rename. Model and
//! index blobs are versioned; a JSON manifest written last makes a version
//! live, and superseded versions are pruned afterwards.

pub mod layout;
pub mod manager;
pub mod manifest;
pub mod persistence;
pub mod snapshot;

pub use layout::ArtifactLayout;
pub use manager::{ArtifactStore, RETAINED_VERSIONS};
pub use manifest::{IndexManifest, IndexSummary, ModelManifest, ModelSummary, ScoreEntry};
pub use persistence::{
    load_blob, load_json, read_bytes, save_blob, save_json, sha256_hex, write_bytes, BlobFormat,
    BlobRef, StorageError,
};
pub use snapshot::{SnapshotDescription, SnapshotManager};
