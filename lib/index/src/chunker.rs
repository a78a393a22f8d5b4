//! Recursive character text splitting
//!
//! Text is split on the coarsest separator present (paragraphs, then lines,
//! then words, then single characters). Pieces are merged back greedily into
//! chunks of at most `chunk_size` characters, and each new chunk starts with
//! up to `chunk_overlap` characters carried over from the previous one.

use crate::loader::Page;
use fertirag_core::{Error, Result, Stage};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

const SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// A retrievable passage with its provenance
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    pub text: String,
    pub source: String,
    pub page: usize,
    /// Position of the chunk in the whole corpus
    pub ordinal: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Default for TextSplitter {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

impl TextSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::validation(Stage::Indexing, "chunk size must be positive"));
        }
        if chunk_overlap >= chunk_size {
            return Err(Error::validation(Stage::Indexing, "chunk overlap must be smaller than chunk size")
                .with("chunk_size", chunk_size)
                .with("chunk_overlap", chunk_overlap));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split pages into chunks, numbering them in corpus order
    pub fn split_pages(&self, pages: &[Page]) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        for page in pages {
            for text in self.split_text(&page.text) {
                chunks.push(Chunk {
                    text,
                    source: page.source.clone(),
                    page: page.page,
                    ordinal: chunks.len(),
                });
            }
        }
        chunks
    }

    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &SEPARATORS)
    }

    fn split_recursive(&self, text: &str, separators: &[&str]) -> Vec<String> {
        // first separator present in the text; "" always matches
        let position = separators
            .iter()
            .position(|sep| sep.is_empty() || text.contains(sep))
            .unwrap_or(separators.len().saturating_sub(1));
        let separator = separators.get(position).copied().unwrap_or("");
        let finer = separators.get(position + 1..).unwrap_or(&[]);

        let pieces: Vec<String> = if separator.is_empty() {
            text.chars().map(String::from).collect()
        } else {
            text.split(separator)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect()
        };

        let mut chunks = Vec::new();
        let mut pending: Vec<String> = Vec::new();
        for piece in pieces {
            if char_len(&piece) < self.chunk_size {
                pending.push(piece);
                continue;
            }
            if !pending.is_empty() {
                chunks.extend(self.merge(&pending, separator));
                pending.clear();
            }
            if finer.is_empty() {
                chunks.push(piece);
            } else {
                chunks.extend(self.split_recursive(&piece, finer));
            }
        }
        if !pending.is_empty() {
            chunks.extend(self.merge(&pending, separator));
        }
        chunks
    }

    /// Greedily join pieces into chunks, keeping a tail of the previous
    /// chunk as overlap.
    fn merge(&self, pieces: &[String], separator: &str) -> Vec<String> {
        let sep_len = char_len(separator);
        let mut chunks = Vec::new();
        let mut window: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for piece in pieces {
            let len = char_len(piece);
            let joiner = if window.is_empty() { 0 } else { sep_len };

            if total + len + joiner > self.chunk_size && !window.is_empty() {
                push_joined(&mut chunks, &window, separator);

                while total > self.chunk_overlap
                    || (total > 0 && total + len + (if window.is_empty() { 0 } else { sep_len }) > self.chunk_size)
                {
                    let Some(front) = window.pop_front() else {
                        break;
                    };
                    total -= char_len(front) + if window.is_empty() { 0 } else { sep_len };
                }
            }

            let joiner = if window.is_empty() { 0 } else { sep_len };
            window.push_back(piece);
            total += len + joiner;
        }

        push_joined(&mut chunks, &window, separator);
        chunks
    }
}

fn push_joined(chunks: &mut Vec<String>, window: &VecDeque<&str>, separator: &str) {
    let joined = window.iter().copied().collect::<Vec<_>>().join(separator);
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fertirag_core::ErrorKind;

    #[test]
    fn test_invalid_overlap() {
        let err = TextSplitter::new(100, 100).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(TextSplitter::new(0, 0).is_err());
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let splitter = TextSplitter::default();
        let chunks = splitter.split_text("Urea is applied as a top dressing.");
        assert_eq!(chunks, vec!["Urea is applied as a top dressing."]);
    }

    #[test]
    fn test_chunks_respect_size() {
        let splitter = TextSplitter::new(50, 10).unwrap();
        let text = "DAP supplies phosphorus early in the season. ".repeat(20);
        let chunks = splitter.split_text(&text);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(char_len(chunk) <= 50, "chunk too long: {:?}", chunk);
        }
    }

    #[test]
    fn test_consecutive_chunks_overlap() {
        let splitter = TextSplitter::new(30, 10).unwrap();
        let text = "alpha beta gamma delta epsilon zeta eta theta iota kappa lambda";
        let chunks = splitter.split_text(text);
        assert!(chunks.len() > 1);
        for pair in chunks.windows(2) {
            let first_word = pair[1].split(' ').next().unwrap();
            assert!(pair[0].split(' ').any(|w| w == first_word), "{:?}", pair);
        }
    }

    #[test]
    fn test_paragraphs_preferred() {
        let splitter = TextSplitter::new(40, 0).unwrap();
        let text = "First paragraph about urea.\n\nSecond paragraph about DAP.";
        let chunks = splitter.split_text(text);
        assert_eq!(
            chunks,
            vec!["First paragraph about urea.", "Second paragraph about DAP."]
        );
    }

    #[test]
    fn test_unbroken_text_falls_back_to_characters() {
        let splitter = TextSplitter::new(10, 2).unwrap();
        let chunks = splitter.split_text(&"x".repeat(25));
        assert!(chunks.len() >= 3);
        assert!(chunks.iter().all(|c| char_len(c) <= 10));
    }

    #[test]
    fn test_split_pages_numbers_chunks() {
        let splitter = TextSplitter::new(20, 0).unwrap();
        let pages = vec![
            Page {
                source: "a.txt".to_string(),
                page: 1,
                text: "one two three four five six".to_string(),
            },
            Page {
                source: "b.txt".to_string(),
                page: 2,
                text: "seven".to_string(),
            },
        ];
        let chunks = splitter.split_pages(&pages);
        let ordinals: Vec<usize> = chunks.iter().map(|c| c.ordinal).collect();
        assert_eq!(ordinals, (0..chunks.len()).collect::<Vec<_>>());
        let last = chunks.last().unwrap();
        assert_eq!((last.source.as_str(), last.page), ("b.txt", 2));
    }
}
