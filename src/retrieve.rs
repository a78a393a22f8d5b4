//! Guidance passage retrieval for a predicted fertilizer

use fertirag_core::{Error, Result, Stage};
use fertirag_index::{SearchHit, VectorIndex};
use fertirag_storage::ArtifactStore;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Query sent to the index for a label
pub fn query_for(label: &str) -> String {
    format!("How to use this {} fertilizer?", label)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Passage {
    pub passage: String,
    pub source_document: String,
    pub page: usize,
    pub score: f32,
}

impl From<SearchHit> for Passage {
    fn from(hit: SearchHit) -> Self {
        Self {
            passage: hit.chunk.text,
            source_document: hit.chunk.source,
            page: hit.chunk.page,
            score: hit.score,
        }
    }
}

#[derive(Debug)]
pub struct Retriever {
    index: VectorIndex,
    top_k: usize,
}

impl Retriever {
    pub fn new(index: VectorIndex, top_k: usize) -> Result<Self> {
        if top_k == 0 {
            return Err(Error::validation(Stage::Retrieval, "top_k must be at least 1"));
        }
        Ok(Self { index, top_k })
    }

    /// Load the live index. A missing or corrupt index is an index error.
    pub fn load(store: &ArtifactStore, top_k: usize) -> Result<Self> {
        Self::new(VectorIndex::load(store)?, top_k)
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// The `top_k` passages for `label`, best first
    pub fn retrieve_all(&self, label: &str) -> Result<Vec<Passage>> {
        let label = label.trim();
        if label.is_empty() {
            return Err(Error::validation(Stage::Retrieval, "label must not be empty"));
        }
        let hits = self.index.search(&query_for(label), self.top_k)?;
        debug!(stage = "retrieved", label, hits = hits.len(), "Retrieved passages");
        Ok(hits.into_iter().map(Passage::from).collect())
    }

    /// The single best passage for `label`
    pub fn retrieve(&self, label: &str) -> Result<Passage> {
        self.retrieve_all(label)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::index(Stage::Retrieval, "index returned no passages").with("label", label))
    }
}
