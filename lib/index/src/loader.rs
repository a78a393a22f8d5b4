//! Per-page text extraction from reference documents

use fertirag_core::{Error, Result, ResultExt, Stage};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Page separator for plain-text documents
const FORM_FEED: char = '\u{000C}';

pub const DEFAULT_EXTENSIONS: [&str; 3] = ["pdf", "txt", "md"];

/// Text of one page of one document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Page {
    /// File name of the source document
    pub source: String,
    /// 1-based page number
    pub page: usize,
    pub text: String,
}

/// Loads every accepted document of a directory as pages
#[derive(Debug, Clone)]
pub struct DocumentLoader {
    extensions: Vec<String>,
}

impl Default for DocumentLoader {
    fn default() -> Self {
        Self::new(DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect())
    }
}

impl DocumentLoader {
    pub fn new(extensions: Vec<String>) -> Self {
        Self {
            extensions: extensions
                .into_iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Whether the file extension is accepted, case-insensitively
    pub fn accepts(&self, path: &Path) -> bool {
        extension_of(path).is_some_and(|ext| self.extensions.iter().any(|e| *e == ext))
    }

    /// Accepted files of `dir`, sorted by file name
    pub fn list_dir(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let entries = fs::read_dir(dir)
            .io_context(Stage::Indexing, "cannot read document directory")
            .map_err(|e| e.with("path", dir.display()))?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry
                .io_context(Stage::Indexing, "cannot read directory entry")
                .map_err(|e| e.with("path", dir.display()))?
                .path();
            if path.is_file() && self.accepts(&path) {
                files.push(path);
            }
        }
        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(files)
    }

    /// Pages of every accepted document in `dir`, in file-name order
    pub fn load_dir(&self, dir: &Path) -> Result<Vec<Page>> {
        let files = self.list_dir(dir)?;
        let mut pages = Vec::new();
        for path in &files {
            pages.extend(self.load_file(path)?);
        }
        info!(
            dir = %dir.display(),
            documents = files.len(),
            pages = pages.len(),
            "Loaded reference documents"
        );
        Ok(pages)
    }

    /// Pages of one document; blank pages are dropped
    pub fn load_file(&self, path: &Path) -> Result<Vec<Page>> {
        let source = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let texts = match extension_of(path).as_deref() {
            Some("pdf") => pdf_extract::extract_text_by_pages(path).map_err(|e| {
                Error::io(Stage::Indexing, "cannot extract PDF text")
                    .with("path", path.display())
                    .with("reason", e)
            })?,
            Some(_) => {
                let raw = fs::read(path)
                    .io_context(Stage::Indexing, "cannot read document")
                    .map_err(|e| e.with("path", path.display()))?;
                String::from_utf8_lossy(&raw)
                    .split(FORM_FEED)
                    .map(str::to_string)
                    .collect()
            }
            None => {
                return Err(Error::validation(Stage::Indexing, "document has no extension")
                    .with("path", path.display()))
            }
        };

        let pages: Vec<Page> = texts
            .into_iter()
            .enumerate()
            .filter(|(_, text)| !text.trim().is_empty())
            .map(|(i, text)| Page {
                source: source.clone(),
                page: i + 1,
                text,
            })
            .collect();

        if pages.is_empty() {
            warn!(path = %path.display(), "Document has no extractable text");
        } else {
            debug!(path = %path.display(), pages = pages.len(), "Extracted document pages");
        }
        Ok(pages)
    }
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fertirag_core::ErrorKind;

    #[test]
    fn test_accepts_case_insensitive() {
        let loader = DocumentLoader::default();
        assert!(loader.accepts(Path::new("guide.PDF")));
        assert!(loader.accepts(Path::new("notes.md")));
        assert!(!loader.accepts(Path::new("image.png")));
        assert!(!loader.accepts(Path::new("README")));
    }

    #[test]
    fn test_text_pages_split_on_form_feed() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.txt"), "page one\u{000C}\u{000C}page three").unwrap();
        fs::write(dir.path().join("a.md"), "# Urea\nApply in split doses.").unwrap();
        fs::write(dir.path().join("skip.csv"), "x,y").unwrap();

        let pages = DocumentLoader::default().load_dir(dir.path()).unwrap();
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0].source, "a.md");
        assert_eq!(pages[1].source, "b.txt");
        assert_eq!(pages[1].page, 1);
        assert_eq!(pages[2].page, 3);
        assert_eq!(pages[2].text, "page three");
    }

    #[test]
    fn test_missing_dir_is_io_error() {
        let err = DocumentLoader::default()
            .load_dir(Path::new("/definitely/not/here"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(err.detail().get("path").is_some());
    }
}
