use crate::schema::SchemaError;
use serde::{Deserialize, Serialize};

/// Bijective mapping between class labels and contiguous integer codes.
///
/// Codes follow the sorted order of the distinct training labels.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LabelCodec {
    classes: Vec<String>,
}

impl LabelCodec {
    /// Fit on training labels, rejecting any label outside `vocabulary`
    pub fn fit<'a, I>(labels: I, vocabulary: &[&str]) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut classes = Vec::new();
        for label in labels {
            if !vocabulary.contains(&label) {
                return Err(SchemaError::ForeignLabel(label.to_string()));
            }
            classes.push(label.to_string());
        }
        if classes.is_empty() {
            return Err(SchemaError::EmptyTrainingSet);
        }
        classes.sort();
        classes.dedup();
        Ok(Self { classes })
    }

    /// Rebuild from a persisted class table
    pub fn from_classes(classes: Vec<String>) -> Self {
        Self { classes }
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    pub fn encode(&self, label: &str) -> Result<usize, SchemaError> {
        self.classes
            .binary_search_by(|c| c.as_str().cmp(label))
            .map_err(|_| SchemaError::UnknownLabel(label.to_string()))
    }

    pub fn encode_all<'a, I>(&self, labels: I) -> Result<Vec<usize>, SchemaError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        labels.into_iter().map(|l| self.encode(l)).collect()
    }

    pub fn decode(&self, code: usize) -> Result<&str, SchemaError> {
        self.classes
            .get(code)
            .map(String::as_str)
            .ok_or(SchemaError::UnknownCode(code))
    }
}
