use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Boxed underlying cause carried by an [`ErrorDetail`]
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Pipeline stage an error originated from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Config,
    Ingestion,
    Transform,
    Indexing,
    Embedding,
    Training,
    Storage,
    Prediction,
    Retrieval,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Config => "config",
            Stage::Ingestion => "ingestion",
            Stage::Transform => "transform",
            Stage::Indexing => "indexing",
            Stage::Embedding => "embedding",
            Stage::Training => "training",
            Stage::Storage => "storage",
            Stage::Prediction => "prediction",
            Stage::Retrieval => "retrieval",
        };
        f.write_str(name)
    }
}

/// Closed set of error kinds surfaced to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Io,
    Validation,
    ModelQuality,
    Index,
    Inference,
}

/// Structured payload shared by every error variant.
///
/// Carries the originating stage, a short message, a context map
/// (file paths, row numbers, field names, scores) and the original cause.
#[derive(Debug)]
pub struct ErrorDetail {
    pub stage: Stage,
    pub message: String,
    pub context: BTreeMap<String, String>,
    cause: Option<BoxError>,
}

impl ErrorDetail {
    pub fn new(stage: Stage, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
            context: BTreeMap::new(),
            cause: None,
        }
    }

    /// Look up a context value by key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.context.get(key).map(String::as_str)
    }
}

impl fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.stage, self.message)?;
        if !self.context.is_empty() {
            let pairs: Vec<String> = self
                .context
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            write!(f, " ({})", pairs.join(", "))?;
        }
        if let Some(cause) = &self.cause {
            write!(f, ": {}", cause)?;
        }
        Ok(())
    }
}

impl std::error::Error for ErrorDetail {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error {0}")]
    Io(#[source] ErrorDetail),

    #[error("Validation error {0}")]
    Validation(#[source] ErrorDetail),

    #[error("Model quality error {0}")]
    ModelQuality(#[source] ErrorDetail),

    #[error("Index error {0}")]
    Index(#[source] ErrorDetail),

    #[error("Inference error {0}")]
    Inference(#[source] ErrorDetail),
}

impl Error {
    pub fn io(stage: Stage, message: impl Into<String>) -> Self {
        Error::Io(ErrorDetail::new(stage, message))
    }

    pub fn validation(stage: Stage, message: impl Into<String>) -> Self {
        Error::Validation(ErrorDetail::new(stage, message))
    }

    pub fn model_quality(message: impl Into<String>) -> Self {
        Error::ModelQuality(ErrorDetail::new(Stage::Training, message))
    }

    pub fn index(stage: Stage, message: impl Into<String>) -> Self {
        Error::Index(ErrorDetail::new(stage, message))
    }

    pub fn inference(message: impl Into<String>) -> Self {
        Error::Inference(ErrorDetail::new(Stage::Prediction, message))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Io(_) => ErrorKind::Io,
            Error::Validation(_) => ErrorKind::Validation,
            Error::ModelQuality(_) => ErrorKind::ModelQuality,
            Error::Index(_) => ErrorKind::Index,
            Error::Inference(_) => ErrorKind::Inference,
        }
    }

    pub fn detail(&self) -> &ErrorDetail {
        match self {
            Error::Io(d)
            | Error::Validation(d)
            | Error::ModelQuality(d)
            | Error::Index(d)
            | Error::Inference(d) => d,
        }
    }

    fn detail_mut(&mut self) -> &mut ErrorDetail {
        match self {
            Error::Io(d)
            | Error::Validation(d)
            | Error::ModelQuality(d)
            | Error::Index(d)
            | Error::Inference(d) => d,
        }
    }

    /// Attach a context entry
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.detail_mut().context.insert(key.into(), value.to_string());
        self
    }

    /// Attach the underlying cause
    #[must_use]
    pub fn caused_by<E>(mut self, cause: E) -> Self
    where
        E: Into<BoxError>,
    {
        self.detail_mut().cause = Some(cause.into());
        self
    }

    /// Re-tag an error with another kind, keeping stage, context and cause.
    ///
    /// Used at stage boundaries, e.g. an encoder failure at predict time
    /// becomes an inference error.
    #[must_use]
    pub fn into_kind(self, kind: ErrorKind) -> Self {
        let detail = match self {
            Error::Io(d)
            | Error::Validation(d)
            | Error::ModelQuality(d)
            | Error::Index(d)
            | Error::Inference(d) => d,
        };
        match kind {
            ErrorKind::Io => Error::Io(detail),
            ErrorKind::Validation => Error::Validation(detail),
            ErrorKind::ModelQuality => Error::ModelQuality(detail),
            ErrorKind::Index => Error::Index(detail),
            ErrorKind::Inference => Error::Inference(detail),
        }
    }
}

/// Wrap foreign errors with stage context
pub trait ResultExt<T> {
    fn io_context(self, stage: Stage, message: impl Into<String>) -> Result<T>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<BoxError>,
{
    fn io_context(self, stage: Stage, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::io(stage, message).caused_by(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_kind_and_context() {
        let err = Error::validation(Stage::Ingestion, "negative nutrient")
            .with("field", "Nitrogen")
            .with("row", 7);

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.detail().get("field"), Some("Nitrogen"));
        assert_eq!(err.detail().get("row"), Some("7"));

        let msg = err.to_string();
        assert!(msg.contains("ingestion"));
        assert!(msg.contains("field=Nitrogen"));
    }

    #[test]
    fn test_cause_is_preserved() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Result<()> = Err(io).io_context(Stage::Storage, "reading model");
        let err = err.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Io);
        let detail = err.source().expect("detail");
        assert!(detail.source().expect("cause").to_string().contains("gone"));
    }

    #[test]
    fn test_into_kind_keeps_detail() {
        let err = Error::validation(Stage::Transform, "bad").with("column", "Soil_Type");
        let err = err.into_kind(ErrorKind::Inference);
        assert_eq!(err.kind(), ErrorKind::Inference);
        assert_eq!(err.detail().get("column"), Some("Soil_Type"));
    }
}
