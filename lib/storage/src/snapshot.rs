// Versioned, gzip-compressed artifact snapshots
use anyhow::Result;
use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Snapshot description, as listed from an artifact directory
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SnapshotDescription {
    pub name: String,
    pub version: String,
    pub size: u64,
    pub checksum: String,
}

pub(crate) fn compress_json<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let json_data = serde_json::to_vec(value)?;
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&json_data)?;
    Ok(encoder.finish()?)
}

pub(crate) fn decompress_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let mut decoder = GzDecoder::new(bytes);
    let mut json_data = Vec::new();
    decoder.read_to_end(&mut json_data)?;
    Ok(serde_json::from_slice(&json_data)?)
}

/// Generate a sortable version id: UTC timestamp plus a random suffix
pub fn new_version() -> String {
    let now: DateTime<Utc> = Utc::now();
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{}-{}", now.format("%Y%m%dT%H%M%S%3f"), &suffix[..8])
}

/// File name of a versioned artifact, e.g. `model-<version>.bin`
pub fn versioned_name(stem: &str, version: &str, extension: &str) -> String {
    format!("{}-{}.{}", stem, version, extension)
}

/// Split a versioned file name back into `(stem, version)`
fn parse_versioned_name<'a>(name: &'a str, stem: &str) -> Option<&'a str> {
    let rest = name.strip_prefix(stem)?.strip_prefix('-')?;
    let dot = rest.find('.')?;
    Some(&rest[..dot])
}

/// Manages the versioned snapshots of one artifact directory
#[derive(Debug, Clone)]
pub struct SnapshotManager {
    dir: PathBuf,
}

impl SnapshotManager {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// List every versioned file with the given stem, newest version first
    pub fn list(&self, stem: &str) -> Result<Vec<SnapshotDescription>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut snapshots = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some(version) = parse_versioned_name(name, stem) else {
                continue;
            };

            let file_data = fs::read(&path)?;
            snapshots.push(SnapshotDescription {
                name: name.to_string(),
                version: version.to_string(),
                size: file_data.len() as u64,
                checksum: format!("{:x}", Sha256::digest(&file_data)),
            });
        }

        snapshots.sort_by(|a, b| b.version.cmp(&a.version));
        Ok(snapshots)
    }

    /// Delete versioned files with the given stems, keeping `current` and the
    /// newest `retain - 1` other versions.
    ///
    /// A reader that picked up the previous manifest just before a publish
    /// can still open its blobs. Failures are logged and skipped; a stale
    /// file never invalidates the published version.
    pub fn prune(&self, stems: &[&str], current: &str, retain: usize) -> usize {
        let mut removed = 0;
        for stem in stems {
            let snapshots = match self.list(stem) {
                Ok(s) => s,
                Err(e) => {
                    warn!(dir = %self.dir.display(), error = %e, "Failed to list snapshots");
                    continue;
                }
            };
            let mut kept: Vec<&str> = vec![current];
            for snapshot in &snapshots {
                if kept.len() >= retain.max(1) {
                    break;
                }
                if !kept.contains(&snapshot.version.as_str()) {
                    kept.push(&snapshot.version);
                }
            }
            let stale: Vec<&SnapshotDescription> = snapshots
                .iter()
                .filter(|s| !kept.contains(&s.version.as_str()))
                .collect();
            for snapshot in stale {
                let path = self.dir.join(&snapshot.name);
                match fs::remove_file(&path) {
                    Ok(()) => {
                        debug!(file = %snapshot.name, "Pruned superseded artifact");
                        removed += 1;
                    }
                    Err(e) => warn!(file = %path.display(), error = %e, "Failed to prune artifact"),
                }
            }
        }
        removed
    }
}
