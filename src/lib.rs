//! # fertirag
//!
//! Fertilizer recommendation from soil and crop telemetry, paired with a
//! guidance passage retrieved from reference documents.
//!
//! The offline pipeline ingests a labeled CSV dataset, fits the tabular
//! encoder, trains and selects a classifier, indexes the reference corpus and
//! publishes everything as versioned artifacts. The online path loads those
//! artifacts once and answers `predict`, `retrieve` and `recommend` calls.
//!
//! ## Quick Start
//!
//! ### From the command line
//!
//! ```bash
//! fertirag train --dataset data/fertilizer.csv --documents data/docs
//! fertirag recommend --temperature 26 --humidity 52 --moisture 38 \
//!     --soil-type Sandy --crop-type Maize --nitrogen 37 --potassium 0 --phosphorous 0
//! ```
//!
//! ### As a library
//!
//! ```rust,no_run
//! use fertirag::prelude::*;
//! use std::path::Path;
//!
//! let service = FertilizerService::new(PipelineConfig::default())?;
//! service.train(Path::new("data/fertilizer.csv"), Path::new("data/docs"))?;
//!
//! let fields = RecordFields {
//!     temperature: 26.0,
//!     humidity: 52.0,
//!     moisture: 38.0,
//!     soil_type: "Sandy".to_string(),
//!     crop_type: "Maize".to_string(),
//!     nitrogen: 37.0,
//!     potassium: 0.0,
//!     phosphorous: 0.0,
//! };
//! let recommendation = service.recommend(&fields)?;
//! println!("{}: {}", recommendation.label, recommendation.passage.passage);
//! # Ok::<(), fertirag::Error>(())
//! ```
//!
//! ## Crate Structure
//!
//! - `fertirag-core` - records, datasets, the soil health score, errors
//! - `fertirag-schema` - feature schema, tabular encoder, label codec
//! - `fertirag-model` - decision tree, random forest, model selection
//! - `fertirag-storage` - atomic, versioned, checksummed artifacts
//! - `fertirag-index` - document loading, chunking, embeddings, vector search

pub mod bundle;
pub mod config;
pub mod ingest;
pub mod pipeline;
pub mod predict;
pub mod retrieve;
pub mod service;

pub use bundle::{ArtifactBundle, ArtifactCache};
pub use config::{PipelineConfig, DEFAULT_TOP_K};
pub use ingest::{IngestReport, Ingestion, StagingReport};
pub use pipeline::{OfflineStage, TrainOutcome, TrainingPipeline};
pub use predict::{Prediction, Predictor};
pub use retrieve::{query_for, Passage, Retriever};
pub use service::{FertilizerService, Recommendation};

// Re-export core types
pub use fertirag_core::{
    soil_health_score, Dataset, Error, ErrorKind, Record, RecordFields, Result, Stage,
    FERTILIZER_LABELS,
};
pub use fertirag_index::EmbedderConfig;
pub use fertirag_model::SelectionReport;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        EmbedderConfig, Error, ErrorKind, FertilizerService, PipelineConfig, Prediction, Passage,
        Recommendation, RecordFields, Result, TrainOutcome,
    };
}
