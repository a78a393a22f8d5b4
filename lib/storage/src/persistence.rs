//! Atomic blob persistence
//!
//! Every artifact is written to a temporary file in the target directory and
//! renamed into place, so a reader never observes a half-written file.

use anyhow::Result;
use atomicwrites::{AllowOverwrite, AtomicFile};
use fertirag_core::{Error, ErrorKind, Stage};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Errors raised by the artifact store
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("artifact not found: {0}")]
    NotFound(PathBuf),

    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write {path}: {message}")]
    Write { path: PathBuf, message: String },

    #[error("corrupt artifact {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },
}

impl StorageError {
    pub fn path(&self) -> &Path {
        match self {
            StorageError::NotFound(path)
            | StorageError::Read { path, .. }
            | StorageError::Write { path, .. }
            | StorageError::Corrupt { path, .. } => path,
        }
    }

    pub fn is_corrupt(&self) -> bool {
        matches!(self, StorageError::Corrupt { .. })
    }

    /// Convert into a pipeline error, tagging corrupt artifacts with `corrupt_kind`
    pub fn into_error(self, stage: Stage, corrupt_kind: ErrorKind) -> Error {
        let kind = if self.is_corrupt() { corrupt_kind } else { ErrorKind::Io };
        let message = match &self {
            StorageError::NotFound(_) => "artifact not found",
            StorageError::Read { .. } => "cannot read artifact",
            StorageError::Write { .. } => "cannot write artifact",
            StorageError::Corrupt { .. } => "corrupt artifact",
        };
        let path = self.path().display().to_string();
        Error::io(stage, message)
            .with("path", path)
            .caused_by(self)
            .into_kind(kind)
    }
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        err.into_error(Stage::Storage, ErrorKind::Io)
    }
}

/// Encoding used for a blob on disk
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BlobFormat {
    Bincode,
    Json,
    GzipJson,
}

impl BlobFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            BlobFormat::Bincode => "bin",
            BlobFormat::Json => "json",
            BlobFormat::GzipJson => "json.gz",
        }
    }
}

/// Reference from a manifest to one persisted blob
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlobRef {
    pub file: String,
    pub format: BlobFormat,
    pub sha256: String,
    pub size: u64,
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Write bytes to `path` through a temporary file and an atomic rename
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    AtomicFile::new(path, AllowOverwrite)
        .write(|f| f.write_all(bytes))
        .map_err(|e| anyhow::anyhow!("atomic write failed: {}", e))?;
    Ok(())
}

/// Public entry point for atomic writes of raw bytes
pub fn write_bytes(path: &Path, bytes: &[u8]) -> std::result::Result<(), StorageError> {
    write_atomic(path, bytes).map_err(|e| StorageError::Write {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

pub fn read_bytes(path: &Path) -> std::result::Result<Vec<u8>, StorageError> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(StorageError::NotFound(path.to_path_buf()))
        }
        Err(source) => Err(StorageError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

pub(crate) fn encode<T: Serialize>(
    value: &T,
    format: BlobFormat,
    path: &Path,
) -> std::result::Result<Vec<u8>, StorageError> {
    let corrupt = |reason: String| StorageError::Write {
        path: path.to_path_buf(),
        message: reason,
    };
    match format {
        BlobFormat::Bincode => {
            bincode::serialize(value).map_err(|e| corrupt(format!("Serialization error: {}", e)))
        }
        BlobFormat::Json => {
            serde_json::to_vec_pretty(value).map_err(|e| corrupt(format!("Serialization error: {}", e)))
        }
        BlobFormat::GzipJson => crate::snapshot::compress_json(value)
            .map_err(|e| corrupt(format!("Compression error: {}", e))),
    }
}

pub(crate) fn decode<T: DeserializeOwned>(
    bytes: &[u8],
    format: BlobFormat,
    path: &Path,
) -> std::result::Result<T, StorageError> {
    let corrupt = |reason: String| StorageError::Corrupt {
        path: path.to_path_buf(),
        reason,
    };
    match format {
        BlobFormat::Bincode => {
            bincode::deserialize(bytes).map_err(|e| corrupt(format!("Deserialization error: {}", e)))
        }
        BlobFormat::Json => {
            serde_json::from_slice(bytes).map_err(|e| corrupt(format!("Deserialization error: {}", e)))
        }
        BlobFormat::GzipJson => crate::snapshot::decompress_json(bytes)
            .map_err(|e| corrupt(format!("Decompression error: {}", e))),
    }
}

/// Serialize `value` into `dir/file` atomically and describe the result
pub fn save_blob<T: Serialize>(
    dir: &Path,
    file: &str,
    format: BlobFormat,
    value: &T,
) -> std::result::Result<BlobRef, StorageError> {
    let path = dir.join(file);
    let bytes = encode(value, format, &path)?;
    write_bytes(&path, &bytes)?;
    Ok(BlobRef {
        file: file.to_string(),
        format,
        sha256: sha256_hex(&bytes),
        size: bytes.len() as u64,
    })
}

/// Load a blob referenced by a manifest, verifying its checksum
pub fn load_blob<T: DeserializeOwned>(dir: &Path, blob: &BlobRef) -> std::result::Result<T, StorageError> {
    let path = dir.join(&blob.file);
    let bytes = read_bytes(&path)?;
    let actual = sha256_hex(&bytes);
    if actual != blob.sha256 {
        return Err(StorageError::Corrupt {
            path,
            reason: format!("Checksum mismatch: expected {}, got {}", blob.sha256, actual),
        });
    }
    decode(&bytes, blob.format, &path)
}

pub fn save_json<T: Serialize>(path: &Path, value: &T) -> std::result::Result<(), StorageError> {
    let bytes = encode(value, BlobFormat::Json, path)?;
    write_bytes(path, &bytes)
}

pub fn load_json<T: DeserializeOwned>(path: &Path) -> std::result::Result<T, StorageError> {
    let bytes = read_bytes(path)?;
    decode(&bytes, BlobFormat::Json, path)
}
