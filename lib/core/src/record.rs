//! Soil and crop telemetry records
//!
//! A [`Record`] is always built through [`Record::from_fields`], which is the
//! only place the derived soil health score is computed. Ingestion and
//! prediction both go through it, so the two paths cannot disagree on the
//! formula.

use crate::error::{Error, Result, Stage};
use serde::{Deserialize, Serialize};

/// Canonical column names after header normalization
pub mod columns {
    pub const TEMPERATURE: &str = "Temperature";
    /// Misspelling used by the published fertilizer dataset
    pub const TEMPERATURE_ALIAS: &str = "Temparature";
    pub const HUMIDITY: &str = "Humidity";
    pub const MOISTURE: &str = "Moisture";
    pub const SOIL_TYPE: &str = "Soil_Type";
    pub const CROP_TYPE: &str = "Crop_Type";
    pub const NITROGEN: &str = "Nitrogen";
    pub const POTASSIUM: &str = "Potassium";
    pub const PHOSPHOROUS: &str = "Phosphorous";
    pub const SOIL_HEALTH_SCORE: &str = "soil_health_score";
    pub const TARGET: &str = "Fertilizer_Name";
}

/// Closed set of fertilizer classes the classifier may emit
pub const FERTILIZER_LABELS: [&str; 7] = [
    "Urea", "DAP", "14-35-14", "28-28", "17-17-17", "20-20", "10-26-26",
];

/// Weights of the soil health score, in field order
/// (temperature, humidity, moisture, nitrogen, potassium, phosphorous)
pub const SOIL_HEALTH_WEIGHTS: [f64; 6] = [0.2, 0.1, 0.2, 0.2, 0.15, 0.15];

/// Upper bound for percentage fields (humidity, moisture)
const MAX_PERCENT: f64 = 100.0;

/// Raw feature columns of one observation, without the label
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecordFields {
    #[serde(rename = "Temperature", alias = "Temparature")]
    pub temperature: f64,
    #[serde(rename = "Humidity")]
    pub humidity: f64,
    #[serde(rename = "Moisture")]
    pub moisture: f64,
    #[serde(rename = "Soil_Type")]
    pub soil_type: String,
    #[serde(rename = "Crop_Type")]
    pub crop_type: String,
    #[serde(rename = "Nitrogen")]
    pub nitrogen: f64,
    #[serde(rename = "Potassium")]
    pub potassium: f64,
    #[serde(rename = "Phosphorous")]
    pub phosphorous: f64,
}

impl RecordFields {
    /// Check field constraints.
    ///
    /// Numbers must be finite, nutrients non-negative, humidity and
    /// moisture within 0..=100, categorical fields non-empty.
    pub fn validate(&self) -> Result<()> {
        let numeric = [
            (columns::TEMPERATURE, self.temperature),
            (columns::HUMIDITY, self.humidity),
            (columns::MOISTURE, self.moisture),
            (columns::NITROGEN, self.nitrogen),
            (columns::POTASSIUM, self.potassium),
            (columns::PHOSPHOROUS, self.phosphorous),
        ];
        for (name, value) in numeric {
            if !value.is_finite() {
                return Err(invalid(name, value, "value must be finite"));
            }
        }

        for (name, value) in [
            (columns::NITROGEN, self.nitrogen),
            (columns::POTASSIUM, self.potassium),
            (columns::PHOSPHOROUS, self.phosphorous),
        ] {
            if value < 0.0 {
                return Err(invalid(name, value, "nutrient value cannot be negative"));
            }
        }

        for (name, value) in [
            (columns::HUMIDITY, self.humidity),
            (columns::MOISTURE, self.moisture),
        ] {
            if !(0.0..=MAX_PERCENT).contains(&value) {
                return Err(invalid(name, value, "percentage must be within 0..=100"));
            }
        }

        for (name, value) in [
            (columns::SOIL_TYPE, &self.soil_type),
            (columns::CROP_TYPE, &self.crop_type),
        ] {
            if value.trim().is_empty() {
                return Err(Error::validation(Stage::Ingestion, "categorical field is empty")
                    .with("field", name));
            }
        }

        Ok(())
    }
}

fn invalid(field: &str, value: f64, message: &str) -> Error {
    Error::validation(Stage::Ingestion, message)
        .with("field", field)
        .with("value", value)
}

/// Weighted linear combination of telemetry fields
pub fn soil_health_score(fields: &RecordFields) -> f64 {
    let values = [
        fields.temperature,
        fields.humidity,
        fields.moisture,
        fields.nitrogen,
        fields.potassium,
        fields.phosphorous,
    ];
    values
        .iter()
        .zip(SOIL_HEALTH_WEIGHTS.iter())
        .map(|(v, w)| v * w)
        .sum()
}

/// One observation with its derived feature
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Record {
    #[serde(flatten)]
    pub fields: RecordFields,
    pub soil_health_score: f64,
}

impl Record {
    /// Validate the fields and compute the derived score
    pub fn from_fields(fields: RecordFields) -> Result<Self> {
        fields.validate()?;
        let soil_health_score = soil_health_score(&fields);
        Ok(Self {
            fields,
            soil_health_score,
        })
    }

    /// Numeric feature by canonical column name
    pub fn numeric(&self, name: &str) -> Option<f64> {
        let f = &self.fields;
        match name {
            columns::TEMPERATURE | columns::TEMPERATURE_ALIAS => Some(f.temperature),
            columns::HUMIDITY => Some(f.humidity),
            columns::MOISTURE => Some(f.moisture),
            columns::NITROGEN => Some(f.nitrogen),
            columns::POTASSIUM => Some(f.potassium),
            columns::PHOSPHOROUS => Some(f.phosphorous),
            columns::SOIL_HEALTH_SCORE => Some(self.soil_health_score),
            _ => None,
        }
    }

    /// Categorical feature by canonical column name
    pub fn categorical(&self, name: &str) -> Option<&str> {
        match name {
            columns::SOIL_TYPE => Some(self.fields.soil_type.as_str()),
            columns::CROP_TYPE => Some(self.fields.crop_type.as_str()),
            _ => None,
        }
    }
}

/// A record together with its target label
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledRecord {
    pub record: Record,
    pub label: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    pub(crate) fn sample_fields() -> RecordFields {
        RecordFields {
            temperature: 26.0,
            humidity: 52.0,
            moisture: 38.0,
            soil_type: "Sandy".to_string(),
            crop_type: "Maize".to_string(),
            nitrogen: 37.0,
            potassium: 0.0,
            phosphorous: 0.0,
        }
    }

    #[test]
    fn test_soil_health_score_reference_value() {
        let record = Record::from_fields(sample_fields()).unwrap();
        // 5.2 + 5.2 + 7.6 + 7.4
        assert!((record.soil_health_score - 25.4).abs() < 1e-9);
    }

    #[test]
    fn test_negative_nutrient_rejected() {
        let mut fields = sample_fields();
        fields.potassium = -1.0;
        let err = Record::from_fields(fields).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.detail().get("field"), Some("Potassium"));
    }

    #[test]
    fn test_empty_categorical_rejected() {
        let mut fields = sample_fields();
        fields.crop_type = "   ".to_string();
        let err = fields.validate().unwrap_err();
        assert_eq!(err.detail().get("field"), Some("Crop_Type"));
    }

    #[test]
    fn test_humidity_out_of_range_rejected() {
        let mut fields = sample_fields();
        fields.humidity = 140.0;
        assert!(fields.validate().is_err());
    }

    #[test]
    fn test_non_finite_rejected() {
        let mut fields = sample_fields();
        fields.temperature = f64::NAN;
        assert!(fields.validate().is_err());
    }

    #[test]
    fn test_feature_accessors() {
        let record = Record::from_fields(sample_fields()).unwrap();
        assert_eq!(record.numeric("Temperature"), Some(26.0));
        assert_eq!(record.numeric("Temparature"), Some(26.0));
        assert_eq!(record.numeric("soil_health_score"), Some(record.soil_health_score));
        assert_eq!(record.categorical("Soil_Type"), Some("Sandy"));
        assert_eq!(record.numeric("Soil_Type"), None);
    }

    #[test]
    fn test_fields_accept_dataset_spelling() {
        let json = r#"{"Temparature": 30.0, "Humidity": 60.0, "Moisture": 40.0,
            "Soil_Type": "Loamy", "Crop_Type": "Wheat",
            "Nitrogen": 10.0, "Potassium": 5.0, "Phosphorous": 20.0}"#;
        let fields: RecordFields = serde_json::from_str(json).unwrap();
        assert_eq!(fields.temperature, 30.0);
    }
}
