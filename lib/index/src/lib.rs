//! Reference-document indexing for fertirag
//!
//! ```text
//! rag_docs/*.{pdf,txt,md} --DocumentLoader--> pages
//!     --TextSplitter--> chunks --Embedder--> VectorIndex --save--> vectorstore/
//! ```
//!
//! # Example
//!
//! ```no_run
//! use fertirag_index::{DocumentLoader, EmbedderConfig, TextSplitter, VectorIndex};
//! use std::path::Path;
//!
//! let pages = DocumentLoader::default().load_dir(Path::new("artifact/rag_docs"))?;
//! let chunks = TextSplitter::default().split_pages(&pages);
//! let index = VectorIndex::build(chunks, EmbedderConfig::default().build()?)?;
//! let hits = index.search("How to use this Urea fertilizer?", 4)?;
//! # Ok::<(), fertirag_core::Error>(())
//! ```

pub mod chunker;
pub mod embedder;
pub mod index;
pub mod loader;

pub use chunker::{Chunk, TextSplitter, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
pub use embedder::{
    Embedder, EmbedderConfig, HashingEmbedder, HttpEmbedder, DEFAULT_EMBEDDING_DIM, MAX_RETRIES_LIMIT,
};
pub use index::{SearchHit, VectorIndex};
pub use loader::{DocumentLoader, Page, DEFAULT_EXTENSIONS};
