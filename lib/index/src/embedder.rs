//! Text embedding backends
//!
//! The embedder used to build an index is recorded as an [`EmbedderConfig`]
//! next to the index, so queries are embedded by the identical function.

use fertirag_core::{Error, Result, Stage, Vector};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_EMBEDDING_DIM: usize = 384;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_BATCH_SIZE: usize = 64;

/// Base delay between retries (doubles each attempt: 200ms, 400ms, 800ms)
const BASE_DELAY_MS: u64 = 200;

/// Upper bound on configured retries per batch
pub const MAX_RETRIES_LIMIT: u32 = 10;

fn backoff_delay(attempt: u32) -> Duration {
    let factor = 2u64.checked_pow(attempt).unwrap_or(u64::MAX);
    Duration::from_millis(BASE_DELAY_MS.saturating_mul(factor))
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

/// Serializable description of an embedding function
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EmbedderConfig {
    /// Local feature hashing of character trigrams and words
    Hashing { dim: usize },
    /// OpenAI-compatible `/embeddings` endpoint
    Http {
        endpoint: String,
        model: String,
        dim: usize,
        /// Environment variable holding a bearer token
        #[serde(default)]
        api_key_env: Option<String>,
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
        #[serde(default = "default_max_retries")]
        max_retries: u32,
        #[serde(default = "default_batch_size")]
        batch_size: usize,
    },
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        EmbedderConfig::Hashing {
            dim: DEFAULT_EMBEDDING_DIM,
        }
    }
}

impl EmbedderConfig {
    pub fn dim(&self) -> usize {
        match self {
            EmbedderConfig::Hashing { dim } | EmbedderConfig::Http { dim, .. } => *dim,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.dim() == 0 {
            return Err(Error::validation(Stage::Config, "embedding dimension must be positive"));
        }
        if let EmbedderConfig::Http {
            endpoint,
            batch_size,
            timeout_secs,
            max_retries,
            ..
        } = self
        {
            if endpoint.trim().is_empty() {
                return Err(Error::validation(Stage::Config, "embedding endpoint is empty"));
            }
            if *batch_size == 0 {
                return Err(Error::validation(Stage::Config, "embedding batch size must be positive"));
            }
            if *timeout_secs == 0 {
                return Err(Error::validation(Stage::Config, "embedding timeout must be positive"));
            }
            if *max_retries > MAX_RETRIES_LIMIT {
                return Err(Error::validation(Stage::Config, "too many embedding retries")
                    .with("max_retries", max_retries)
                    .with("limit", MAX_RETRIES_LIMIT));
            }
        }
        Ok(())
    }

    /// Instantiate the embedder this configuration describes
    pub fn build(&self) -> Result<Box<dyn Embedder>> {
        self.validate()?;
        match self {
            EmbedderConfig::Hashing { dim } => Ok(Box::new(HashingEmbedder::new(*dim))),
            EmbedderConfig::Http { .. } => Ok(Box::new(HttpEmbedder::new(self.clone())?)),
        }
    }
}

/// Maps text to dense vectors
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;

    /// Configuration that recreates this embedder
    fn descriptor(&self) -> EmbedderConfig;

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vector>>;

    fn embed(&self, text: &str) -> Result<Vector> {
        self.embed_batch(&[text.to_string()])?
            .pop()
            .ok_or_else(|| Error::index(Stage::Embedding, "embedder returned no vector"))
    }
}

/// Deterministic local embedder.
///
/// Hashes lowercase character trigrams and whole words into a fixed number
/// of buckets (words weigh twice as much) and L2-normalizes the result.
/// SHA-256 keeps bucket positions stable across builds and platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashingEmbedder {
    dim: usize,
}

impl HashingEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(1) }
    }

    fn bucket(&self, token: &str) -> usize {
        let digest = Sha256::digest(token.as_bytes());
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&digest[..8]);
        (u64::from_le_bytes(buf) % self.dim as u64) as usize
    }

    pub fn embed_text(&self, text: &str) -> Vector {
        let mut vector = Vector::zeros(self.dim);
        let normalized = text.to_lowercase();
        let values = vector.as_mut_slice();

        for trigram in trigrams(&normalized) {
            values[self.bucket(&trigram)] += 1.0;
        }
        for word in normalized.split_whitespace() {
            values[self.bucket(word)] += 2.0;
        }

        vector.into_unit()
    }
}

fn trigrams(text: &str) -> Vec<String> {
    let padded: Vec<char> = format!("  {}  ", text).chars().collect();
    padded
        .windows(3)
        .map(|w| w.iter().collect::<String>())
        .filter(|t| !t.trim().is_empty())
        .collect()
}

impl Embedder for HashingEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn descriptor(&self) -> EmbedderConfig {
        EmbedderConfig::Hashing { dim: self.dim }
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vector>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Deserialize)]
struct EmbeddingItem {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

enum AttemptError {
    /// Connection failures, timeouts, 429 and 5xx responses
    Transient(String),
    Fatal(String),
}

/// Remote embedder speaking the OpenAI-compatible embeddings protocol.
///
/// Each batch is retried with exponential backoff on transient failures; once
/// retries are exhausted the batch fails with an IO error.
pub struct HttpEmbedder {
    config: EmbedderConfig,
    client: reqwest::blocking::Client,
    endpoint: String,
    model: String,
    dim: usize,
    api_key: Option<String>,
    max_retries: u32,
    batch_size: usize,
}

impl HttpEmbedder {
    pub fn new(config: EmbedderConfig) -> Result<Self> {
        let EmbedderConfig::Http {
            endpoint,
            model,
            dim,
            api_key_env,
            timeout_secs,
            max_retries,
            batch_size,
        } = &config
        else {
            return Err(Error::validation(Stage::Config, "not an HTTP embedder configuration"));
        };
        config.validate()?;

        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("fertirag/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(*timeout_secs))
            .build()
            .map_err(|e| Error::io(Stage::Embedding, "failed to create HTTP client").caused_by(e))?;

        let api_key = api_key_env.as_deref().and_then(|name| std::env::var(name).ok());

        Ok(Self {
            endpoint: endpoint.clone(),
            model: model.clone(),
            dim: *dim,
            api_key,
            max_retries: *max_retries,
            batch_size: (*batch_size).max(1),
            client,
            config,
        })
    }

    fn attempt(&self, texts: &[String]) -> std::result::Result<Vec<Vec<f32>>, AttemptError> {
        let mut request = self.client.post(&self.endpoint).json(&EmbeddingRequest {
            model: &self.model,
            input: texts,
        });
        if let Some(token) = &self.api_key {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .map_err(|e| AttemptError::Transient(format!("request failed: {e}")))?;

        let status = response.status();
        if status.is_server_error() || status.as_u16() == 429 {
            return Err(AttemptError::Transient(format!("endpoint returned {status}")));
        }
        if !status.is_success() {
            return Err(AttemptError::Fatal(format!("endpoint returned {status}")));
        }

        let mut body: EmbeddingResponse = response
            .json()
            .map_err(|e| AttemptError::Fatal(format!("failed to parse embeddings JSON: {e}")))?;
        body.data.sort_by_key(|item| item.index);
        Ok(body.data.into_iter().map(|item| item.embedding).collect())
    }

    fn embed_chunk(&self, texts: &[String]) -> Result<Vec<Vector>> {
        let mut attempt = 0u32;
        let embeddings = loop {
            match self.attempt(texts) {
                Ok(embeddings) => break embeddings,
                Err(AttemptError::Transient(reason)) if attempt < self.max_retries => {
                    let delay = backoff_delay(attempt);
                    attempt += 1;
                    warn!(
                        attempt,
                        max_retries = self.max_retries,
                        endpoint = %self.endpoint,
                        "Embedding request failed, retrying in {delay:?}: {reason}"
                    );
                    std::thread::sleep(delay);
                }
                Err(AttemptError::Transient(reason)) | Err(AttemptError::Fatal(reason)) => {
                    return Err(Error::io(Stage::Embedding, "embedding request failed")
                        .with("endpoint", &self.endpoint)
                        .with("attempts", attempt + 1)
                        .with("reason", reason));
                }
            }
        };

        if embeddings.len() != texts.len() {
            return Err(Error::index(Stage::Embedding, "embedding count does not match input")
                .with("expected", texts.len())
                .with("actual", embeddings.len()));
        }
        embeddings
            .into_iter()
            .map(|values| {
                if values.len() != self.dim {
                    return Err(Error::index(Stage::Embedding, "embedding dimension mismatch")
                        .with("expected", self.dim)
                        .with("actual", values.len()));
                }
                Ok(Vector::new(values))
            })
            .collect()
    }
}

impl Embedder for HttpEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn descriptor(&self) -> EmbedderConfig {
        self.config.clone()
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vector>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            vectors.extend(self.embed_chunk(batch)?);
            debug!(embedded = vectors.len(), total = texts.len(), "Embedded batch");
        }
        Ok(vectors)
    }
}
