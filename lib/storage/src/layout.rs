use std::path::{Path, PathBuf};

pub const RAW_DATASET_FILE: &str = "fertilizer.csv";
pub const TRAIN_FILE: &str = "train.csv";
pub const TEST_FILE: &str = "test.csv";
pub const DOCS_DIR: &str = "rag_docs";
pub const MODEL_DIR: &str = "model";
pub const INDEX_DIR: &str = "vectorstore";
pub const MANIFEST_FILE: &str = "manifest.json";

/// Paths of every artifact under one artifact directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLayout {
    root: PathBuf,
}

impl ArtifactLayout {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Normalized raw snapshot with the derived score column
    pub fn raw_dataset(&self) -> PathBuf {
        self.root.join(RAW_DATASET_FILE)
    }

    pub fn train_csv(&self) -> PathBuf {
        self.root.join(TRAIN_FILE)
    }

    pub fn test_csv(&self) -> PathBuf {
        self.root.join(TEST_FILE)
    }

    /// Staging directory for reference documents
    pub fn docs_dir(&self) -> PathBuf {
        self.root.join(DOCS_DIR)
    }

    pub fn model_dir(&self) -> PathBuf {
        self.root.join(MODEL_DIR)
    }

    pub fn index_dir(&self) -> PathBuf {
        self.root.join(INDEX_DIR)
    }

    pub fn model_manifest(&self) -> PathBuf {
        self.model_dir().join(MANIFEST_FILE)
    }

    pub fn index_manifest(&self) -> PathBuf {
        self.index_dir().join(MANIFEST_FILE)
    }
}

impl Default for ArtifactLayout {
    fn default() -> Self {
        Self::new("artifact")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        let layout = ArtifactLayout::new("/tmp/art");
        assert_eq!(layout.raw_dataset(), PathBuf::from("/tmp/art/fertilizer.csv"));
        assert_eq!(layout.docs_dir(), PathBuf::from("/tmp/art/rag_docs"));
        assert_eq!(
            layout.model_manifest(),
            PathBuf::from("/tmp/art/model/manifest.json")
        );
        assert_eq!(
            layout.index_manifest(),
            PathBuf::from("/tmp/art/vectorstore/manifest.json")
        );
        assert_eq!(ArtifactLayout::default().root(), Path::new("artifact"));
    }
}
