use crate::chunker::Chunk;
use crate::embedder::{Embedder, EmbedderConfig};
use fertirag_core::{Error, ErrorKind, Result, Stage, Vector};
use fertirag_storage::{ArtifactStore, IndexManifest, IndexSummary};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Persisted form of a vector index
#[derive(Serialize, Deserialize)]
struct IndexSnapshot {
    embedder: EmbedderConfig,
    dim: usize,
    chunks: Vec<Chunk>,
    vectors: Vec<Vec<f32>>,
}

/// A scored search result
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub chunk: Chunk,
    /// Cosine similarity between query and chunk
    pub score: f32,
}

/// Exact cosine-similarity index over document chunks.
///
/// Vectors are stored unit-normalized, so similarity is a plain inner
/// product. Results are ordered by score descending, then insertion order.
pub struct VectorIndex {
    embedder: Box<dyn Embedder>,
    chunks: Vec<Chunk>,
    vectors: Vec<Vector>,
}

impl std::fmt::Debug for VectorIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorIndex")
            .field("embedder", &self.embedder.descriptor())
            .field("chunks", &self.chunks.len())
            .finish()
    }
}

impl VectorIndex {
    /// Embed every chunk. An empty corpus is an index error.
    pub fn build(chunks: Vec<Chunk>, embedder: Box<dyn Embedder>) -> Result<Self> {
        if chunks.is_empty() {
            return Err(Error::index(Stage::Indexing, "no document chunks to index"));
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors: Vec<Vector> = embedder
            .embed_batch(&texts)?
            .into_iter()
            .map(Vector::into_unit)
            .collect();

        let index = Self::from_parts(embedder, chunks, vectors)?;
        info!(
            chunks = index.len(),
            dim = index.dim(),
            documents = index.documents().len(),
            "Built vector index"
        );
        Ok(index)
    }

    fn from_parts(embedder: Box<dyn Embedder>, chunks: Vec<Chunk>, vectors: Vec<Vector>) -> Result<Self> {
        if vectors.len() != chunks.len() {
            return Err(Error::index(Stage::Indexing, "vector count does not match chunk count")
                .with("chunks", chunks.len())
                .with("vectors", vectors.len()));
        }
        let dim = embedder.dim();
        if let Some((i, v)) = vectors.iter().enumerate().find(|(_, v)| v.dim() != dim) {
            return Err(Error::index(Stage::Indexing, "embedding dimension mismatch")
                .with("chunk", i)
                .with("expected", dim)
                .with("actual", v.dim()));
        }
        Ok(Self {
            embedder,
            chunks,
            vectors,
        })
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn dim(&self) -> usize {
        self.embedder.dim()
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn embedder_config(&self) -> EmbedderConfig {
        self.embedder.descriptor()
    }

    /// Distinct source documents, sorted
    pub fn documents(&self) -> Vec<String> {
        self.chunks
            .iter()
            .map(|c| c.source.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Embed `query` with the index's own embedder and return the `k` best hits
    pub fn search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>> {
        let query = self.embedder.embed(query)?.into_unit();
        self.search_vector(&query, k)
    }

    pub fn search_vector(&self, query: &Vector, k: usize) -> Result<Vec<SearchHit>> {
        if k == 0 {
            return Err(Error::validation(Stage::Retrieval, "top_k must be at least 1"));
        }
        if query.dim() != self.dim() {
            return Err(Error::index(Stage::Retrieval, "query dimension mismatch")
                .with("expected", self.dim())
                .with("actual", query.dim()));
        }

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(i, v)| (i, query.dot(v)))
            .collect();
        scored.sort_by(|a, b| OrderedFloat(b.1).cmp(&OrderedFloat(a.1)).then(a.0.cmp(&b.0)));
        scored.truncate(k);

        debug!(k, hits = scored.len(), "Searched vector index");
        Ok(scored
            .into_iter()
            .map(|(i, score)| SearchHit {
                chunk: self.chunks[i].clone(),
                score,
            })
            .collect())
    }

    /// Publish this index as a new version in `store`
    pub fn save(&self, store: &ArtifactStore) -> Result<IndexManifest> {
        let embedder = self.embedder.descriptor();
        let snapshot = IndexSnapshot {
            embedder: embedder.clone(),
            dim: self.dim(),
            chunks: self.chunks.clone(),
            vectors: self.vectors.iter().map(|v| v.as_slice().to_vec()).collect(),
        };
        let embedder_json = serde_json::to_value(&embedder).map_err(|e| {
            Error::index(Stage::Indexing, "cannot serialize embedder configuration").caused_by(e)
        })?;
        let summary = IndexSummary {
            chunks: self.len(),
            documents: self.documents(),
            dim: self.dim(),
            embedder: embedder_json,
        };

        store
            .publish_index(summary, &snapshot)
            .map_err(|e| e.into_error(Stage::Indexing, ErrorKind::Index))
    }

    /// Load the live index from `store`. A missing or corrupt index is an
    /// index error.
    pub fn load(store: &ArtifactStore) -> Result<Self> {
        let (manifest, snapshot): (IndexManifest, IndexSnapshot) = store
            .load_index()
            .map_err(|e| e.into_error(Stage::Retrieval, ErrorKind::Index).into_kind(ErrorKind::Index))?;

        if snapshot.dim != manifest.summary.dim || snapshot.chunks.len() != manifest.summary.chunks {
            return Err(Error::index(Stage::Retrieval, "index snapshot disagrees with its manifest")
                .with("version", &manifest.version));
        }

        let embedder = snapshot.embedder.build()?;
        if embedder.dim() != snapshot.dim {
            return Err(Error::index(Stage::Retrieval, "embedder dimension disagrees with index")
                .with("version", &manifest.version));
        }
        let vectors = snapshot.vectors.into_iter().map(Vector::new).collect();
        let index = Self::from_parts(embedder, snapshot.chunks, vectors)
            .map_err(|e| e.with("version", &manifest.version))?;

        info!(version = %manifest.version, chunks = index.len(), "Loaded vector index");
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedder::HashingEmbedder;
    use fertirag_storage::ArtifactLayout;
    use std::fs;

    fn chunk(ordinal: usize, source: &str, text: &str) -> Chunk {
        Chunk {
            text: text.to_string(),
            source: source.to_string(),
            page: 1,
            ordinal,
        }
    }

    fn corpus() -> Vec<Chunk> {
        vec![
            chunk(0, "urea.txt", "Urea supplies nitrogen. Apply urea in split doses."),
            chunk(1, "dap.txt", "DAP supplies phosphorus at sowing."),
            chunk(2, "potash.txt", "Potash improves fruit quality."),
        ]
    }

    fn hashing() -> Box<dyn Embedder> {
        Box::new(HashingEmbedder::new(128))
    }

    #[test]
    fn test_empty_corpus_is_index_error() {
        let err = VectorIndex::build(Vec::new(), hashing()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Index);
    }

    #[test]
    fn test_search_ranks_relevant_chunk_first() {
        let index = VectorIndex::build(corpus(), hashing()).unwrap();
        let hits = index.search("How to use this Urea fertilizer?", 2).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chunk.source, "urea.txt");
        assert!(hits[0].score >= hits[1].score);
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let chunks = vec![chunk(0, "a", "same text"), chunk(1, "b", "same text")];
        let index = VectorIndex::build(chunks, hashing()).unwrap();
        let hits = index.search("same text", 2).unwrap();
        assert_eq!(hits[0].chunk.source, "a");
        assert_eq!(hits[1].chunk.source, "b");
    }

    #[test]
    fn test_zero_k_rejected() {
        let index = VectorIndex::build(corpus(), hashing()).unwrap();
        assert!(index.search("urea", 0).is_err());
        assert_eq!(index.search("urea", 10).unwrap().len(), 3);
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(ArtifactLayout::new(dir.path()));

        let index = VectorIndex::build(corpus(), hashing()).unwrap();
        let manifest = index.save(&store).unwrap();
        assert_eq!(manifest.summary.chunks, 3);
        assert_eq!(manifest.summary.documents, vec!["dap.txt", "potash.txt", "urea.txt"]);

        let loaded = VectorIndex::load(&store).unwrap();
        assert_eq!(loaded.chunks(), index.chunks());
        assert_eq!(loaded.embedder_config(), index.embedder_config());

        let before = index.search("phosphorus", 3).unwrap();
        let after = loaded.search("phosphorus", 3).unwrap();
        for (a, b) in before.iter().zip(&after) {
            assert_eq!(a.chunk.ordinal, b.chunk.ordinal);
            assert!((a.score - b.score).abs() < 1e-6);
        }
    }

    #[test]
    fn test_missing_or_corrupt_index_is_index_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(ArtifactLayout::new(dir.path()));
        assert_eq!(VectorIndex::load(&store).unwrap_err().kind(), ErrorKind::Index);

        let manifest = VectorIndex::build(corpus(), hashing()).unwrap().save(&store).unwrap();
        fs::write(store.layout().index_dir().join(&manifest.index.file), b"junk").unwrap();
        assert_eq!(VectorIndex::load(&store).unwrap_err().kind(), ErrorKind::Index);
    }
}
