//! Dataset ingestion and reference-document staging

use crate::config::PipelineConfig;
use fertirag_core::{Dataset, Error, ErrorKind, Result, ResultExt, Stage};
use fertirag_index::DocumentLoader;
use fertirag_storage::{read_bytes, write_bytes, ArtifactLayout};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct IngestReport {
    pub raw_path: PathBuf,
    pub train_path: PathBuf,
    pub test_path: PathBuf,
    pub rows: usize,
    pub train_rows: usize,
    pub test_rows: usize,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct StagingReport {
    /// File names copied into the staging directory
    pub copied: Vec<String>,
    /// File names already staged
    pub skipped: Vec<String>,
}

/// Writes the normalized dataset and its split, and stages documents
pub struct Ingestion {
    layout: ArtifactLayout,
    loader: DocumentLoader,
    test_fraction: f64,
    seed: u64,
}

fn write_csv(path: &Path, dataset: &Dataset) -> Result<()> {
    let bytes = dataset.to_csv_bytes()?;
    write_bytes(path, &bytes).map_err(|e| e.into_error(Stage::Ingestion, ErrorKind::Io))
}

impl Ingestion {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            layout: config.layout(),
            loader: config.loader(),
            test_fraction: config.test_fraction,
            seed: config.seed,
        }
    }

    pub fn layout(&self) -> &ArtifactLayout {
        &self.layout
    }

    /// Read `source`, then persist the normalized snapshot with the derived
    /// score column plus the train and test partitions.
    pub fn ingest_dataset(&self, source: &Path) -> Result<IngestReport> {
        let dataset = Dataset::from_csv_path(source)?;
        let (train, test) = dataset.split(self.test_fraction, self.seed)?;

        let report = IngestReport {
            raw_path: self.layout.raw_dataset(),
            train_path: self.layout.train_csv(),
            test_path: self.layout.test_csv(),
            rows: dataset.len(),
            train_rows: train.len(),
            test_rows: test.len(),
        };
        write_csv(&report.raw_path, &dataset)?;
        write_csv(&report.train_path, &train)?;
        write_csv(&report.test_path, &test)?;

        info!(
            source = %source.display(),
            rows = report.rows,
            train = report.train_rows,
            test = report.test_rows,
            "Ingested dataset"
        );
        Ok(report)
    }

    /// Copy accepted documents from `source_dir` into the staging directory.
    ///
    /// Files already staged are left untouched, so repeated runs copy
    /// nothing new.
    pub fn stage_documents(&self, source_dir: &Path) -> Result<StagingReport> {
        if !source_dir.is_dir() {
            return Err(Error::io(Stage::Ingestion, "document source directory not found")
                .with("path", source_dir.display()));
        }
        let staging = self.layout.docs_dir();
        std::fs::create_dir_all(&staging)
            .io_context(Stage::Ingestion, "cannot create staging directory")
            .map_err(|e| e.with("path", staging.display()))?;

        let mut report = StagingReport::default();
        for path in self.loader.list_dir(source_dir)? {
            let Some(name) = path.file_name() else {
                continue;
            };
            let name_str = name.to_string_lossy().into_owned();
            let target = staging.join(name);

            if target.exists() {
                debug!(file = %name_str, "Document already staged");
                report.skipped.push(name_str);
                continue;
            }
            let bytes = read_bytes(&path).map_err(|e| e.into_error(Stage::Ingestion, ErrorKind::Io))?;
            write_bytes(&target, &bytes).map_err(|e| e.into_error(Stage::Ingestion, ErrorKind::Io))?;
            report.copied.push(name_str);
        }

        info!(
            source = %source_dir.display(),
            copied = report.copied.len(),
            skipped = report.skipped.len(),
            "Staged reference documents"
        );
        Ok(report)
    }
}
