//! Tabular Encoder
//!
//! Converts a record into a fixed-length numeric vector according to the
//! feature schema. Fitted once on the training partition, then reused
//! unchanged for the test partition and every inference request.

use crate::onehot::OneHotEncoder;
use crate::scaler::StandardScaler;
use crate::schema::{FeatureSchema, SchemaError};
use fertirag_core::Record;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Fitted encoding artifact
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TabularEncoder {
    schema: FeatureSchema,
    scalers: Vec<StandardScaler>,
    encoders: Vec<OneHotEncoder>,
}

impl TabularEncoder {
    /// Fit scalers and one-hot vocabularies on the given records
    pub fn fit<'a, I>(schema: FeatureSchema, records: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = &'a Record>,
    {
        schema.validate()?;
        let records: Vec<&Record> = records.into_iter().collect();
        if records.is_empty() {
            return Err(SchemaError::EmptyTrainingSet);
        }

        let mut scalers = Vec::with_capacity(schema.numeric.len());
        for name in &schema.numeric {
            let column = records
                .iter()
                .map(|r| r.numeric(name).ok_or_else(|| SchemaError::FieldNotFound(name.clone())))
                .collect::<Result<Vec<f64>, _>>()?;
            scalers.push(StandardScaler::fit(&column)?);
        }

        let mut encoders = Vec::with_capacity(schema.categorical.len());
        for name in &schema.categorical {
            let column = records
                .iter()
                .map(|r| r.categorical(name).ok_or_else(|| SchemaError::FieldNotFound(name.clone())))
                .collect::<Result<Vec<&str>, _>>()?;
            encoders.push(OneHotEncoder::fit(column));
        }

        let encoder = Self {
            schema,
            scalers,
            encoders,
        };
        info!(
            rows = records.len(),
            numeric = ?encoder.schema.numeric,
            categorical = ?encoder.schema.categorical,
            dim = encoder.dim(),
            "Fitted tabular encoder"
        );
        Ok(encoder)
    }

    /// Get a reference to the schema
    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Total output dimension
    pub fn dim(&self) -> usize {
        self.scalers.len() + self.encoders.iter().map(OneHotEncoder::width).sum::<usize>()
    }

    /// Output column names, `column=category` for one-hot slots
    pub fn feature_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.schema.numeric.clone();
        for (name, encoder) in self.schema.categorical.iter().zip(&self.encoders) {
            names.extend(encoder.categories().iter().map(|c| format!("{}={}", name, c)));
        }
        names
    }

    /// Encode a single record.
    ///
    /// The vector is laid out as the scaled numeric columns in schema order
    /// followed by one one-hot block per categorical column.
    pub fn transform(&self, record: &Record) -> Result<Vec<f64>, SchemaError> {
        let mut out = vec![0.0; self.dim()];

        for (i, (name, scaler)) in self.schema.numeric.iter().zip(&self.scalers).enumerate() {
            let value = record
                .numeric(name)
                .ok_or_else(|| SchemaError::FieldNotFound(name.clone()))?;
            out[i] = scaler.transform(value);
        }

        let mut offset = self.scalers.len();
        for (name, encoder) in self.schema.categorical.iter().zip(&self.encoders) {
            let value = record
                .categorical(name)
                .ok_or_else(|| SchemaError::FieldNotFound(name.clone()))?;
            let width = encoder.width();
            encoder.encode_into(value, &mut out[offset..offset + width]);
            offset += width;
        }

        Ok(out)
    }

    pub fn transform_batch<'a, I>(&self, records: I) -> Result<Vec<Vec<f64>>, SchemaError>
    where
        I: IntoIterator<Item = &'a Record>,
    {
        records.into_iter().map(|r| self.transform(r)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fertirag_core::RecordFields;

    fn record(soil: &str, crop: &str, nitrogen: f64) -> Record {
        Record::from_fields(RecordFields {
            temperature: 26.0,
            humidity: 52.0,
            moisture: 38.0,
            soil_type: soil.to_string(),
            crop_type: crop.to_string(),
            nitrogen,
            potassium: 0.0,
            phosphorous: 0.0,
        })
        .unwrap()
    }

    fn fitted() -> TabularEncoder {
        let train = vec![
            record("Sandy", "Maize", 37.0),
            record("Loamy", "Wheat", 12.0),
            record("Black", "Maize", 7.0),
        ];
        TabularEncoder::fit(FeatureSchema::fertilizer(), &train).unwrap()
    }

    #[test]
    fn test_dimension() {
        let encoder = fitted();
        // 7 numeric + 3 soil types + 2 crop types
        assert_eq!(encoder.dim(), 7 + 3 + 2);
        assert_eq!(encoder.feature_names().len(), encoder.dim());
        assert_eq!(encoder.feature_names()[7], "Soil_Type=Black");
    }

    #[test]
    fn test_one_hot_layout() {
        let encoder = fitted();
        let v = encoder.transform(&record("Loamy", "Wheat", 12.0)).unwrap();
        assert_eq!(&v[7..10], &[0.0, 1.0, 0.0]);
        assert_eq!(&v[10..12], &[0.0, 1.0]);
    }

    #[test]
    fn test_unknown_category_gives_zero_block() {
        let encoder = fitted();
        let v = encoder.transform(&record("Peaty", "Maize", 12.0)).unwrap();
        assert_eq!(&v[7..10], &[0.0, 0.0, 0.0]);
        assert_eq!(&v[10..12], &[1.0, 0.0]);
    }

    #[test]
    fn test_numeric_columns_use_train_statistics() {
        let encoder = fitted();
        let v = encoder.transform(&record("Sandy", "Maize", 37.0)).unwrap();
        // temperature is constant in train, so it scales to zero
        assert_eq!(v[0], 0.0);
        // nitrogen: mean 56/3, population std ~ 13.12
        assert!(v[3] > 1.0);
    }

    #[test]
    fn test_same_record_same_vector() {
        let encoder = fitted();
        let r = record("Black", "Wheat", 20.0);
        assert_eq!(encoder.transform(&r).unwrap(), encoder.transform(&r).unwrap());
    }

    #[test]
    fn test_empty_training_set() {
        let empty: Vec<Record> = Vec::new();
        assert!(matches!(
            TabularEncoder::fit(FeatureSchema::fertilizer(), &empty),
            Err(SchemaError::EmptyTrainingSet)
        ));
    }

    #[test]
    fn test_unknown_schema_column() {
        let schema = FeatureSchema::new(vec!["Rainfall".to_string()], vec![], "Fertilizer_Name");
        let train = vec![record("Sandy", "Maize", 37.0)];
        assert!(matches!(
            TabularEncoder::fit(schema, &train),
            Err(SchemaError::FieldNotFound(_))
        ));
    }
}
