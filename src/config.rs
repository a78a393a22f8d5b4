use fertirag_core::{Error, Result, ResultExt, Stage, DEFAULT_SEED, DEFAULT_TEST_FRACTION};
use fertirag_index::{
    DocumentLoader, EmbedderConfig, TextSplitter, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE,
    DEFAULT_EXTENSIONS,
};
use fertirag_model::DEFAULT_QUALITY_FLOOR;
use fertirag_storage::{ArtifactLayout, ArtifactStore};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Number of passages fetched per retrieval query
pub const DEFAULT_TOP_K: usize = 4;

/// Pipeline configuration. Missing keys in a config file fall back to the
/// defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    pub artifact_dir: PathBuf,
    pub test_fraction: f64,
    pub seed: u64,
    /// Minimum test accuracy a model needs to be published
    pub quality_floor: f64,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
    /// Document extensions staged and indexed, case-insensitive
    pub accepted_extensions: Vec<String>,
    pub embedder: EmbedderConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            artifact_dir: PathBuf::from("artifact"),
            test_fraction: DEFAULT_TEST_FRACTION,
            seed: DEFAULT_SEED,
            quality_floor: DEFAULT_QUALITY_FLOOR,
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            top_k: DEFAULT_TOP_K,
            accepted_extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            embedder: EmbedderConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load a JSON config file and validate it
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .io_context(Stage::Config, "cannot read config file")
            .map_err(|e| e.with("path", path.display()))?;
        let config: Self = serde_json::from_str(&raw).map_err(|e| {
            Error::validation(Stage::Config, "invalid config file")
                .with("path", path.display())
                .caused_by(e)
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_artifact_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.artifact_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(Error::validation(Stage::Config, "test_fraction must be within (0, 1)")
                .with("test_fraction", self.test_fraction));
        }
        if !(0.0..=1.0).contains(&self.quality_floor) {
            return Err(Error::validation(Stage::Config, "quality_floor must be within [0, 1]")
                .with("quality_floor", self.quality_floor));
        }
        if self.top_k == 0 {
            return Err(Error::validation(Stage::Config, "top_k must be at least 1"));
        }
        if self.accepted_extensions.is_empty() {
            return Err(Error::validation(Stage::Config, "accepted_extensions is empty"));
        }
        self.splitter()?;
        self.embedder.validate()
    }

    pub fn layout(&self) -> ArtifactLayout {
        ArtifactLayout::new(&self.artifact_dir)
    }

    pub fn store(&self) -> ArtifactStore {
        ArtifactStore::new(self.layout())
    }

    pub fn loader(&self) -> DocumentLoader {
        DocumentLoader::new(self.accepted_extensions.clone())
    }

    pub fn splitter(&self) -> Result<TextSplitter> {
        TextSplitter::new(self.chunk_size, self.chunk_overlap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fertirag_core::ErrorKind;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.test_fraction, 0.2);
        assert_eq!(config.seed, 42);
        assert_eq!(config.quality_floor, 0.6);
        assert_eq!((config.chunk_size, config.chunk_overlap), (1000, 200));
        assert_eq!(config.top_k, 4);
        assert_eq!(config.embedder.dim(), 384);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"quality_floor": 0.75, "top_k": 2}"#).unwrap();

        let config = PipelineConfig::from_file(&path).unwrap();
        assert_eq!(config.quality_floor, 0.75);
        assert_eq!(config.top_k, 2);
        assert_eq!(config.seed, 42);
    }

    #[test]
    fn test_out_of_range_rejected() {
        let config = PipelineConfig {
            quality_floor: 1.2,
            ..PipelineConfig::default()
        };
        assert_eq!(config.validate().unwrap_err().kind(), ErrorKind::Validation);

        let config = PipelineConfig {
            chunk_overlap: 1000,
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_err());

        let config = PipelineConfig {
            test_fraction: 0.0,
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = PipelineConfig::from_file("/no/such/config.json").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
