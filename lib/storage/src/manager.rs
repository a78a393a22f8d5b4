use crate::layout::ArtifactLayout;
use crate::manifest::{IndexManifest, IndexSummary, ModelManifest, ModelSummary};
use crate::persistence::{load_blob, load_json, save_blob, save_json, BlobFormat, StorageError};
use crate::snapshot::{new_version, versioned_name, SnapshotManager};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;

type Result<T> = std::result::Result<T, StorageError>;

const ENCODER_STEM: &str = "encoder";
const MODEL_STEM: &str = "model";
const INDEX_STEM: &str = "index";

/// Versions kept on disk per artifact: the live one and its predecessor
pub const RETAINED_VERSIONS: usize = 2;

/// Publishes and loads versioned model and index artifacts
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    layout: ArtifactLayout,
}

impl ArtifactStore {
    pub fn new(layout: ArtifactLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &ArtifactLayout {
        &self.layout
    }

    /// Write encoder and model blobs under a fresh version, then the manifest.
    ///
    /// Superseded versions are pruned only after the manifest is in place,
    /// and the previous version is kept for readers still loading it.
    pub fn publish_model<E, M>(&self, summary: ModelSummary, encoder: &E, model: &M) -> Result<ModelManifest>
    where
        E: Serialize,
        M: Serialize,
    {
        let dir = self.layout.model_dir();
        let version = new_version();
        let ext = BlobFormat::Bincode.extension();

        let encoder = save_blob(
            &dir,
            &versioned_name(ENCODER_STEM, &version, ext),
            BlobFormat::Bincode,
            encoder,
        )?;
        let model = save_blob(
            &dir,
            &versioned_name(MODEL_STEM, &version, ext),
            BlobFormat::Bincode,
            model,
        )?;

        let manifest = ModelManifest {
            version: version.clone(),
            created_at: Utc::now(),
            summary,
            encoder,
            model,
        };
        save_json(&self.layout.model_manifest(), &manifest)?;

        let pruned = SnapshotManager::new(&dir).prune(&[ENCODER_STEM, MODEL_STEM], &version, RETAINED_VERSIONS);
        info!(
            version = %manifest.version,
            winner = %manifest.summary.winner,
            pruned,
            "Published model artifacts"
        );
        Ok(manifest)
    }

    pub fn model_manifest(&self) -> Result<ModelManifest> {
        load_json(&self.layout.model_manifest())
    }

    /// Load the live encoder and model, verifying both checksums
    pub fn load_model<E, M>(&self) -> Result<(ModelManifest, E, M)>
    where
        E: DeserializeOwned,
        M: DeserializeOwned,
    {
        let manifest = self.model_manifest()?;
        let dir = self.layout.model_dir();
        let encoder = load_blob(&dir, &manifest.encoder)?;
        let model = load_blob(&dir, &manifest.model)?;
        Ok((manifest, encoder, model))
    }

    /// Write an index snapshot under a fresh version, then the manifest
    pub fn publish_index<T: Serialize>(&self, summary: IndexSummary, snapshot: &T) -> Result<IndexManifest> {
        let dir = self.layout.index_dir();
        let version = new_version();
        let format = BlobFormat::GzipJson;

        let index = save_blob(
            &dir,
            &versioned_name(INDEX_STEM, &version, format.extension()),
            format,
            snapshot,
        )?;
        let manifest = IndexManifest {
            version: version.clone(),
            created_at: Utc::now(),
            summary,
            index,
        };
        save_json(&self.layout.index_manifest(), &manifest)?;

        let pruned = SnapshotManager::new(&dir).prune(&[INDEX_STEM], &version, RETAINED_VERSIONS);
        info!(
            version = %manifest.version,
            chunks = manifest.summary.chunks,
            pruned,
            "Published vector index"
        );
        Ok(manifest)
    }

    pub fn index_manifest(&self) -> Result<IndexManifest> {
        load_json(&self.layout.index_manifest())
    }

    pub fn load_index<T: DeserializeOwned>(&self) -> Result<(IndexManifest, T)> {
        let manifest = self.index_manifest()?;
        let snapshot = load_blob(&self.layout.index_dir(), &manifest.index)?;
        Ok((manifest, snapshot))
    }
}
