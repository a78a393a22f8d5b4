//! Feature schema definitions
//!
//! Declares which record columns are fed to the encoder and how each one
//! is treated. The schema travels inside the fitted encoder, so training
//! and inference always agree on column order.

use fertirag_core::{columns, Error, Stage};
use serde::{Deserialize, Serialize};

/// Feature schema for tabular encoding
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureSchema {
    /// Schema version for future compatibility
    #[serde(default = "default_version")]
    pub version: u32,

    /// Columns standardized to zero mean / unit variance, in output order
    pub numeric: Vec<String>,

    /// Columns one-hot encoded, in output order after the numeric block
    pub categorical: Vec<String>,

    /// Target column
    pub target: String,
}

fn default_version() -> u32 {
    1
}

impl FeatureSchema {
    pub fn new(numeric: Vec<String>, categorical: Vec<String>, target: impl Into<String>) -> Self {
        Self {
            version: 1,
            numeric,
            categorical,
            target: target.into(),
        }
    }

    /// Static schema of the fertilizer dataset
    pub fn fertilizer() -> Self {
        let numeric = [
            columns::TEMPERATURE,
            columns::HUMIDITY,
            columns::MOISTURE,
            columns::NITROGEN,
            columns::POTASSIUM,
            columns::PHOSPHOROUS,
            columns::SOIL_HEALTH_SCORE,
        ];
        let categorical = [columns::SOIL_TYPE, columns::CROP_TYPE];
        Self::new(
            numeric.iter().map(|s| s.to_string()).collect(),
            categorical.iter().map(|s| s.to_string()).collect(),
            columns::TARGET,
        )
    }

    /// Validate the schema: non-empty, no duplicate or target columns
    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.numeric.is_empty() && self.categorical.is_empty() {
            return Err(SchemaError::EmptySchema);
        }

        let mut seen = ahash::AHashSet::new();
        for name in self.numeric.iter().chain(self.categorical.iter()) {
            if name == &self.target {
                return Err(SchemaError::TargetAsFeature(name.clone()));
            }
            if !seen.insert(name.as_str()) {
                return Err(SchemaError::DuplicateField(name.clone()));
            }
        }

        Ok(())
    }

    /// Total number of input columns
    pub fn field_count(&self) -> usize {
        self.numeric.len() + self.categorical.len()
    }
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self::fertilizer()
    }
}

/// Errors that can occur while building or applying an encoder
#[derive(Debug, Clone, thiserror::Error)]
pub enum SchemaError {
    #[error("Schema cannot be empty")]
    EmptySchema,

    #[error("Field '{0}' appears more than once")]
    DuplicateField(String),

    #[error("Target '{0}' cannot also be a feature")]
    TargetAsFeature(String),

    #[error("Field '{0}' not found in record")]
    FieldNotFound(String),

    #[error("Cannot fit on an empty training set")]
    EmptyTrainingSet,

    #[error("Label '{0}' is outside the fitted vocabulary")]
    UnknownLabel(String),

    #[error("Label '{0}' is outside the closed label set")]
    ForeignLabel(String),

    #[error("Class code {0} is out of range")]
    UnknownCode(usize),
}

impl From<SchemaError> for Error {
    fn from(err: SchemaError) -> Self {
        let detail = err.to_string();
        let base = match &err {
            SchemaError::UnknownCode(code) => Error::inference("label decoding failed")
                .with("code", code),
            SchemaError::FieldNotFound(field) => {
                Error::validation(Stage::Transform, "missing feature").with("field", field)
            }
            SchemaError::UnknownLabel(label) | SchemaError::ForeignLabel(label) => {
                Error::validation(Stage::Transform, "label rejected").with("label", label)
            }
            _ => Error::validation(Stage::Transform, "invalid feature schema"),
        };
        base.caused_by(detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fertirag_core::ErrorKind;

    #[test]
    fn test_fertilizer_schema() {
        let schema = FeatureSchema::fertilizer();
        assert_eq!(schema.version, 1);
        assert_eq!(schema.numeric.len(), 7);
        assert_eq!(schema.categorical, vec!["Soil_Type", "Crop_Type"]);
        assert!(schema.validate().is_ok());
    }

    #[test]
    fn test_empty_schema_error() {
        let schema = FeatureSchema::new(vec![], vec![], "y");
        assert!(matches!(schema.validate(), Err(SchemaError::EmptySchema)));
    }

    #[test]
    fn test_duplicate_field_error() {
        let schema = FeatureSchema::new(
            vec!["Nitrogen".to_string()],
            vec!["Nitrogen".to_string()],
            "y",
        );
        assert!(matches!(schema.validate(), Err(SchemaError::DuplicateField(_))));
    }

    #[test]
    fn test_error_conversion_kinds() {
        let err: Error = SchemaError::UnknownLabel("Potash".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::Validation);
        let err: Error = SchemaError::UnknownCode(9).into();
        assert_eq!(err.kind(), ErrorKind::Inference);
    }

    #[test]
    fn test_serde_roundtrip() {
        let schema = FeatureSchema::fertilizer();
        let json = serde_json::to_string(&schema).unwrap();
        let parsed: FeatureSchema = serde_json::from_str(&json).unwrap();
        assert_eq!(schema, parsed);
    }
}
