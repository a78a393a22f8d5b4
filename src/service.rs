use crate::bundle::{ArtifactBundle, ArtifactCache};
use crate::config::PipelineConfig;
use crate::pipeline::{TrainOutcome, TrainingPipeline};
use crate::predict::Prediction;
use crate::retrieve::Passage;
use fertirag_core::{RecordFields, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// A predicted fertilizer with its best guidance passage
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    pub label: String,
    pub passage: Passage,
}

/// Entry point for training and serving
pub struct FertilizerService {
    config: PipelineConfig,
    cache: ArtifactCache,
}

impl FertilizerService {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            cache: ArtifactCache::new(config.clone()),
            config,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn cache(&self) -> &ArtifactCache {
        &self.cache
    }

    /// Run the offline pipeline, then swap the new artifacts in.
    ///
    /// Once artifacts are published the run has succeeded: a failed cache
    /// reload is logged and reported through `cache_reloaded`, and the next
    /// request loads the artifacts again.
    pub fn train(&self, dataset_path: &Path, documents_path: &Path) -> Result<TrainOutcome> {
        let outcome = TrainingPipeline::new(self.config.clone())?.run(dataset_path, documents_path)?;
        Ok(self.swap_in(outcome))
    }

    fn swap_in(&self, mut outcome: TrainOutcome) -> TrainOutcome {
        match self.cache.reload() {
            Ok(_) => outcome.cache_reloaded = true,
            Err(e) => {
                warn!(
                    model_version = %outcome.model_version,
                    index_version = %outcome.index_version,
                    error = %e,
                    "Published artifacts but failed to reload the serving cache"
                );
                self.cache.invalidate();
                outcome.cache_reloaded = false;
            }
        }
        outcome
    }

    fn bundle(&self) -> Result<Arc<ArtifactBundle>> {
        self.cache.get()
    }

    pub fn predict(&self, fields: &RecordFields) -> Result<Prediction> {
        let prediction = self.bundle()?.predictor.predict(fields)?;
        debug!(stage = "served", label = %prediction.label, "Served prediction");
        Ok(prediction)
    }

    pub fn retrieve(&self, label: &str) -> Result<Passage> {
        let passage = self.bundle()?.retriever.retrieve(label)?;
        debug!(stage = "served", source = %passage.source_document, "Served passage");
        Ok(passage)
    }

    /// Predict, then retrieve guidance for the predicted label, both against
    /// the same artifact bundle
    pub fn recommend(&self, fields: &RecordFields) -> Result<Recommendation> {
        let bundle = self.bundle()?;
        let Prediction { label } = bundle.predictor.predict(fields)?;
        let passage = bundle.retriever.retrieve(&label)?;
        debug!(stage = "served", label = %label, source = %passage.source_document, "Served recommendation");
        Ok(Recommendation { label, passage })
    }
}
