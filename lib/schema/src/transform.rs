//! Train/test transformation
//!
//! Fits the encoder and the label codec on the training partition only,
//! then applies both (without refitting) to the test partition.

use crate::encoder::TabularEncoder;
use crate::label::LabelCodec;
use crate::schema::FeatureSchema;
use fertirag_core::{Dataset, Result, Stage, FERTILIZER_LABELS};
use tracing::info;

/// Encoded features and integer labels of one partition
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedSplit {
    pub features: Vec<Vec<f64>>,
    pub labels: Vec<usize>,
}

impl EncodedSplit {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Rows as `[features..., label]`
    pub fn rows(&self) -> Vec<Vec<f64>> {
        self.features
            .iter()
            .zip(&self.labels)
            .map(|(x, &y)| {
                let mut row = x.clone();
                row.push(y as f64);
                row
            })
            .collect()
    }
}

/// Output of a transformation run
#[derive(Debug, Clone)]
pub struct TransformOutput {
    pub train: EncodedSplit,
    pub test: EncodedSplit,
    pub encoder: TabularEncoder,
    pub codec: LabelCodec,
}

/// Fits the encoding artifact and label codec
#[derive(Debug, Clone)]
pub struct DataTransformer {
    schema: FeatureSchema,
    vocabulary: Vec<&'static str>,
}

impl DataTransformer {
    pub fn new(schema: FeatureSchema) -> Self {
        Self {
            schema,
            vocabulary: FERTILIZER_LABELS.to_vec(),
        }
    }

    /// Override the closed label set accepted at fit time
    pub fn with_vocabulary(mut self, vocabulary: Vec<&'static str>) -> Self {
        self.vocabulary = vocabulary;
        self
    }

    pub fn fit_transform(&self, train: &Dataset, test: &Dataset) -> Result<TransformOutput> {
        let with_partition = |partition: &'static str| {
            move |e: fertirag_core::Error| e.with("partition", partition)
        };

        let encoder = TabularEncoder::fit(self.schema.clone(), train.records())
            .map_err(fertirag_core::Error::from)
            .map_err(with_partition("train"))?;
        let codec = LabelCodec::fit(train.labels(), &self.vocabulary)
            .map_err(fertirag_core::Error::from)
            .map_err(with_partition("train"))?;

        let train_split = EncodedSplit {
            features: encoder
                .transform_batch(train.records())
                .map_err(fertirag_core::Error::from)?,
            labels: codec
                .encode_all(train.labels())
                .map_err(fertirag_core::Error::from)?,
        };
        let test_split = EncodedSplit {
            features: encoder
                .transform_batch(test.records())
                .map_err(fertirag_core::Error::from)
                .map_err(with_partition("test"))?,
            labels: codec
                .encode_all(test.labels())
                .map_err(fertirag_core::Error::from)
                .map_err(with_partition("test"))?,
        };

        info!(
            stage = %Stage::Transform,
            train_rows = train_split.len(),
            test_rows = test_split.len(),
            dim = encoder.dim(),
            classes = codec.n_classes(),
            "Applied encoder to train and test partitions"
        );

        Ok(TransformOutput {
            train: train_split,
            test: test_split,
            encoder,
            codec,
        })
    }
}

impl Default for DataTransformer {
    fn default() -> Self {
        Self::new(FeatureSchema::fertilizer())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fertirag_core::{ErrorKind, LabeledRecord, Record, RecordFields};

    fn row(soil: &str, nitrogen: f64, label: &str) -> LabeledRecord {
        LabeledRecord {
            record: Record::from_fields(RecordFields {
                temperature: 30.0,
                humidity: 50.0,
                moisture: 40.0,
                soil_type: soil.to_string(),
                crop_type: "Maize".to_string(),
                nitrogen,
                potassium: 0.0,
                phosphorous: 10.0,
            })
            .unwrap(),
            label: label.to_string(),
        }
    }

    #[test]
    fn test_fit_on_train_apply_to_test() {
        let train = Dataset::new(vec![
            row("Sandy", 40.0, "Urea"),
            row("Loamy", 10.0, "DAP"),
            row("Sandy", 35.0, "Urea"),
        ]);
        let test = Dataset::new(vec![row("Clayey", 38.0, "Urea")]);

        let out = DataTransformer::default().fit_transform(&train, &test).unwrap();
        assert_eq!(out.train.len(), 3);
        assert_eq!(out.test.len(), 1);
        assert_eq!(out.codec.classes(), &["DAP", "Urea"]);

        // Clayey never seen during fit: soil block is all zero
        let soil_block = &out.test.features[0][7..9];
        assert_eq!(soil_block, &[0.0, 0.0]);

        let rows = out.test.rows();
        assert_eq!(rows[0].len(), out.encoder.dim() + 1);
        assert_eq!(*rows[0].last().unwrap(), 1.0);
    }

    #[test]
    fn test_unseen_test_label_is_validation_error() {
        let train = Dataset::new(vec![row("Sandy", 40.0, "Urea"), row("Loamy", 10.0, "DAP")]);
        let test = Dataset::new(vec![row("Sandy", 20.0, "28-28")]);

        let err = DataTransformer::default().fit_transform(&train, &test).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.detail().get("partition"), Some("test"));
        assert_eq!(err.detail().get("label"), Some("28-28"));
    }
}
