//! # fertirag Schema
//!
//! Tabular feature encoding for the fertilizer classifier.
//!
//! ## Overview
//!
//! The encoder turns a [`fertirag_core::Record`] into a fixed-length numeric
//! vector:
//!
//! 1. Numeric columns are standardized with train-set mean and standard deviation
//! 2. Categorical columns are one-hot encoded over the train-set vocabulary
//! 3. Categories never seen during fit encode to an all-zero block
//!
//! The [`LabelCodec`] maps fertilizer names to contiguous integer codes.
//!
//! ## Example
//!
//! ```rust
//! use fertirag_core::{Record, RecordFields};
//! use fertirag_schema::{FeatureSchema, TabularEncoder};
//!
//! let record = Record::from_fields(RecordFields {
//!     temperature: 26.0,
//!     humidity: 52.0,
//!     moisture: 38.0,
//!     soil_type: "Sandy".to_string(),
//!     crop_type: "Maize".to_string(),
//!     nitrogen: 37.0,
//!     potassium: 0.0,
//!     phosphorous: 0.0,
//! }).unwrap();
//!
//! let encoder = TabularEncoder::fit(FeatureSchema::fertilizer(), [&record]).unwrap();
//! let vector = encoder.transform(&record).unwrap();
//! assert_eq!(vector.len(), encoder.dim());
//! ```
//!
//! ## Encoding Flow
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Record    │────>│   Scalers   │────>│  [numeric]  │
//! │  (fields)   │     └─────────────┘     ├─────────────┤
//! │             │     ┌─────────────┐     │  [one-hot]  │
//! │             │────>│  One-hot    │────>│  [one-hot]  │
//! └─────────────┘     └─────────────┘     └─────────────┘
//! ```

pub mod encoder;
pub mod label;
pub mod onehot;
pub mod scaler;
pub mod schema;
pub mod transform;

// Re-export main types
pub use encoder::TabularEncoder;
pub use label::LabelCodec;
pub use onehot::OneHotEncoder;
pub use scaler::StandardScaler;
pub use schema::{FeatureSchema, SchemaError};
pub use transform::{DataTransformer, EncodedSplit, TransformOutput};
