//! # fertirag Core
//!
//! Core library for the fertirag fertilizer recommender.
//!
//! This crate provides the data model shared by every pipeline stage:
//!
//! - [`RecordFields`] / [`Record`] - one soil/crop observation and its derived
//!   soil health score
//! - [`Dataset`] - labeled records loaded from CSV, split deterministically
//! - [`Vector`] - dense embedding vector used by the document index
//! - [`Error`] - the closed set of error kinds surfaced by the pipeline
//!
//! ## Example
//!
//! ```rust
//! use fertirag_core::{Record, RecordFields};
//!
//! let fields = RecordFields {
//!     temperature: 26.0,
//!     humidity: 52.0,
//!     moisture: 38.0,
//!     soil_type: "Sandy".to_string(),
//!     crop_type: "Maize".to_string(),
//!     nitrogen: 37.0,
//!     potassium: 0.0,
//!     phosphorous: 0.0,
//! };
//! let record = Record::from_fields(fields).unwrap();
//! assert!((record.soil_health_score - 25.4).abs() < 1e-9);
//! ```

pub mod dataset;
pub mod error;
pub mod record;
pub mod vector;

pub use dataset::{normalize_column_name, Dataset, DEFAULT_SEED, DEFAULT_TEST_FRACTION};
pub use error::{BoxError, Error, ErrorDetail, ErrorKind, Result, ResultExt, Stage};
pub use record::{
    columns, soil_health_score, LabeledRecord, Record, RecordFields, FERTILIZER_LABELS,
    SOIL_HEALTH_WEIGHTS,
};
pub use vector::Vector;
