//! Shared, lazily loaded serving artifacts

use crate::config::PipelineConfig;
use crate::predict::Predictor;
use crate::retrieve::Retriever;
use fertirag_core::Result;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info};

/// Everything a request needs: the predictor and the retriever
#[derive(Debug)]
pub struct ArtifactBundle {
    pub predictor: Predictor,
    pub retriever: Retriever,
}

impl ArtifactBundle {
    pub fn load(config: &PipelineConfig) -> Result<Self> {
        let store = config.store();
        let predictor = Predictor::load(&store)?;
        let retriever = Retriever::load(&store, config.top_k)?;
        debug!(stage = "artifacts_loaded", model = predictor.version(), "Loaded artifact bundle");
        Ok(Self {
            predictor,
            retriever,
        })
    }
}

/// Loads the bundle on first use and shares it by `Arc`.
///
/// `reload` swaps in a freshly loaded bundle; requests that already hold the
/// previous `Arc` finish against the artifacts they started with.
pub struct ArtifactCache {
    config: PipelineConfig,
    bundle: RwLock<Option<Arc<ArtifactBundle>>>,
}

impl ArtifactCache {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            bundle: RwLock::new(None),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.bundle.read().is_some()
    }

    pub fn get(&self) -> Result<Arc<ArtifactBundle>> {
        if let Some(bundle) = self.bundle.read().as_ref() {
            return Ok(Arc::clone(bundle));
        }

        let mut slot = self.bundle.write();
        // another caller may have loaded it while we waited
        if let Some(bundle) = slot.as_ref() {
            return Ok(Arc::clone(bundle));
        }
        let bundle = Arc::new(ArtifactBundle::load(&self.config)?);
        *slot = Some(Arc::clone(&bundle));
        Ok(bundle)
    }

    /// Load the current artifacts and replace the cached bundle. On failure
    /// the previous bundle stays in place.
    pub fn reload(&self) -> Result<Arc<ArtifactBundle>> {
        let bundle = Arc::new(ArtifactBundle::load(&self.config)?);
        *self.bundle.write() = Some(Arc::clone(&bundle));
        info!(model = bundle.predictor.version(), "Reloaded artifact bundle");
        Ok(bundle)
    }

    pub fn invalidate(&self) {
        *self.bundle.write() = None;
    }
}
