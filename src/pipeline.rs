//! Offline training pipeline
//!
//! ```text
//! Raw -> Ingested -> Transformed -> Trained -> Deployable
//! ```
//!
//! Nothing is published until a model clears the quality floor. A rejected
//! run leaves the previously published model and index untouched.

use crate::config::PipelineConfig;
use crate::ingest::{IngestReport, Ingestion, StagingReport};
use fertirag_core::{Dataset, Error, Result, Stage};
use fertirag_index::VectorIndex;
use fertirag_model::{ModelSelector, SelectionReport};
use fertirag_schema::DataTransformer;
use fertirag_storage::{ModelSummary, ScoreEntry};
use serde::Serialize;
use std::fmt;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum OfflineStage {
    Raw,
    Ingested,
    Transformed,
    Trained,
    Deployable,
}

impl OfflineStage {
    pub fn next(self) -> Option<Self> {
        match self {
            OfflineStage::Raw => Some(OfflineStage::Ingested),
            OfflineStage::Ingested => Some(OfflineStage::Transformed),
            OfflineStage::Transformed => Some(OfflineStage::Trained),
            OfflineStage::Trained => Some(OfflineStage::Deployable),
            OfflineStage::Deployable => None,
        }
    }
}

impl fmt::Display for OfflineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Result of a successful training run
#[derive(Debug, Clone, Serialize)]
pub struct TrainOutcome {
    pub model_version: String,
    pub accuracy: f64,
    pub report: SelectionReport,
    pub index_version: String,
    pub index_chunks: usize,
    pub ingest: IngestReport,
    pub staging: StagingReport,
    /// Whether the serving cache picked up the new artifacts
    pub cache_reloaded: bool,
}

pub struct TrainingPipeline {
    config: PipelineConfig,
    stage: OfflineStage,
}

impl TrainingPipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            stage: OfflineStage::Raw,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn stage(&self) -> OfflineStage {
        self.stage
    }

    fn advance(&mut self, to: OfflineStage) -> Result<()> {
        if self.stage.next() != Some(to) {
            return Err(Error::validation(Stage::Training, "invalid pipeline transition")
                .with("from", self.stage)
                .with("to", to));
        }
        info!(from = %self.stage, to = %to, "Pipeline stage");
        self.stage = to;
        Ok(())
    }

    /// Ingest, transform, index, train, select and publish
    pub fn run(&mut self, dataset_path: &Path, documents_path: &Path) -> Result<TrainOutcome> {
        self.stage = OfflineStage::Raw;
        let config = self.config.clone();
        let store = config.store();

        let ingestion = Ingestion::new(&config);
        let ingest = ingestion.ingest_dataset(dataset_path)?;
        let staging = ingestion.stage_documents(documents_path)?;
        self.advance(OfflineStage::Ingested)?;

        let train = Dataset::from_csv_path(&ingest.train_path)?;
        let test = Dataset::from_csv_path(&ingest.test_path)?;
        let encoded = DataTransformer::default().fit_transform(&train, &test)?;

        let pages = config.loader().load_dir(&store.layout().docs_dir())?;
        let chunks = config.splitter()?.split_pages(&pages);
        let index = VectorIndex::build(chunks, config.embedder.build()?)?;
        self.advance(OfflineStage::Transformed)?;

        let selector = ModelSelector::with_defaults(config.quality_floor, config.seed)?;
        let selection = selector.select(&encoded.train, &encoded.test, encoded.codec.n_classes())?;
        self.advance(OfflineStage::Trained)?;

        let report = selection.report;
        let summary = ModelSummary {
            schema_version: encoded.encoder.schema().version,
            classes: encoded.codec.classes().to_vec(),
            winner: report.winner.clone(),
            model_kind: selection.model.kind_name().to_string(),
            accuracy: report.accuracy,
            quality_floor: report.quality_floor,
            scores: report
                .scores
                .iter()
                .map(|s| ScoreEntry {
                    name: s.name.clone(),
                    accuracy: s.accuracy,
                })
                .collect(),
        };
        let model_manifest = store.publish_model(summary, &encoded.encoder, &selection.model)?;
        let index_manifest = index.save(&store)?;
        self.advance(OfflineStage::Deployable)?;

        info!(
            model_version = %model_manifest.version,
            index_version = %index_manifest.version,
            winner = %report.winner,
            accuracy = report.accuracy,
            chunks = index_manifest.summary.chunks,
            "Training run complete"
        );

        Ok(TrainOutcome {
            model_version: model_manifest.version,
            accuracy: report.accuracy,
            report,
            index_version: index_manifest.version,
            index_chunks: index_manifest.summary.chunks,
            ingest,
            staging,
            cache_reloaded: false,
        })
    }
}
