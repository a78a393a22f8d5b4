//! Online classification against the published model

use fertirag_core::{Error, ErrorKind, Record, RecordFields, Result, Stage, FERTILIZER_LABELS};
use fertirag_model::Model;
use fertirag_schema::{LabelCodec, TabularEncoder};
use fertirag_storage::{ArtifactStore, ModelManifest};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Prediction {
    pub label: String,
}

/// Encoder, model and class table of one published model version
#[derive(Debug)]
pub struct Predictor {
    manifest: ModelManifest,
    encoder: TabularEncoder,
    model: Model,
    codec: LabelCodec,
}

impl Predictor {
    /// Load the live model version. Missing files are IO errors; corrupt or
    /// inconsistent artifacts are inference errors.
    pub fn load(store: &ArtifactStore) -> Result<Self> {
        let (manifest, encoder, model): (ModelManifest, TabularEncoder, Model) = store
            .load_model()
            .map_err(|e| e.into_error(Stage::Prediction, ErrorKind::Inference))?;
        let predictor = Self::from_parts(manifest, encoder, model)?;
        info!(
            version = %predictor.manifest.version,
            model = %predictor.manifest.summary.winner,
            classes = predictor.codec.n_classes(),
            "Loaded model artifacts"
        );
        Ok(predictor)
    }

    pub fn from_parts(manifest: ModelManifest, encoder: TabularEncoder, model: Model) -> Result<Self> {
        let classes = &manifest.summary.classes;
        if classes.is_empty() {
            return Err(Error::inference("model manifest has an empty class table")
                .with("version", &manifest.version));
        }
        if let Some(foreign) = classes.iter().find(|c| !FERTILIZER_LABELS.contains(&c.as_str())) {
            return Err(Error::inference("model manifest names an unknown fertilizer")
                .with("version", &manifest.version)
                .with("label", foreign));
        }
        if encoder.schema().version != manifest.summary.schema_version {
            return Err(Error::inference("encoder schema version disagrees with manifest")
                .with("version", &manifest.version)
                .with("encoder_schema", encoder.schema().version)
                .with("manifest_schema", manifest.summary.schema_version));
        }

        if !model.is_fitted() {
            return Err(Error::inference("model artifact holds an unfitted classifier")
                .with("version", &manifest.version));
        }
        if model.n_features() != encoder.dim() {
            return Err(Error::inference("model input width disagrees with encoder")
                .with("version", &manifest.version)
                .with("encoder_dim", encoder.dim())
                .with("model_features", model.n_features()));
        }

        let codec = LabelCodec::from_classes(classes.clone());
        Ok(Self {
            manifest,
            encoder,
            model,
            codec,
        })
    }

    pub fn version(&self) -> &str {
        &self.manifest.version
    }

    pub fn manifest(&self) -> &ModelManifest {
        &self.manifest
    }

    /// Validate, derive the soil health score, encode, classify, decode
    pub fn predict(&self, fields: &RecordFields) -> Result<Prediction> {
        let record = Record::from_fields(fields.clone())?;
        let features = self
            .encoder
            .transform(&record)
            .map_err(|e| Error::from(e).into_kind(ErrorKind::Inference))?;
        debug!(stage = "encoded", dim = features.len(), "Encoded request");

        let code = self.model.predict_one(&features);
        let label = self.codec.decode(code)?.to_string();
        debug!(stage = "classified", code, label = %label, "Classified request");

        Ok(Prediction { label })
    }

    pub fn predict_batch(&self, batch: &[RecordFields]) -> Result<Vec<Prediction>> {
        batch.iter().map(|fields| self.predict(fields)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use fertirag_model::{default_candidates, DecisionTree, TreeParams};
    use fertirag_schema::FeatureSchema;
    use fertirag_storage::{ArtifactLayout, BlobFormat, BlobRef, ModelSummary};

    fn fields(temperature: f64, soil: &str, nitrogen: f64) -> RecordFields {
        RecordFields {
            temperature,
            humidity: 50.0,
            moisture: 40.0,
            soil_type: soil.to_string(),
            crop_type: "Maize".to_string(),
            nitrogen,
            potassium: 0.0,
            phosphorous: 0.0,
        }
    }

    fn blob(file: &str) -> BlobRef {
        BlobRef {
            file: file.to_string(),
            format: BlobFormat::Bincode,
            sha256: String::new(),
            size: 0,
        }
    }

    fn summary(classes: &[&str]) -> ModelSummary {
        ModelSummary {
            schema_version: FeatureSchema::fertilizer().version,
            classes: classes.iter().map(|c| c.to_string()).collect(),
            winner: "Decision Tree".to_string(),
            model_kind: "decision_tree".to_string(),
            accuracy: 1.0,
            quality_floor: 0.6,
            scores: Vec::new(),
        }
    }

    /// High-nitrogen rows are Urea (code 1), low-nitrogen rows DAP (code 0)
    fn fitted() -> (TabularEncoder, Model) {
        let records: Vec<Record> = (0..10)
            .map(|i| Record::from_fields(fields(25.0 + i as f64, "Sandy", if i < 5 { 5.0 } else { 40.0 })).unwrap())
            .collect();
        let encoder = TabularEncoder::fit(FeatureSchema::fertilizer(), &records).unwrap();
        let x = encoder.transform_batch(&records).unwrap();
        let y: Vec<usize> = (0..10).map(|i| usize::from(i >= 5)).collect();
        let model = default_candidates()[0].fit(&x, &y, 2, 42).unwrap();
        (encoder, model)
    }

    fn manifest(classes: &[&str]) -> ModelManifest {
        ModelManifest {
            version: "test".to_string(),
            created_at: Utc::now(),
            summary: summary(classes),
            encoder: blob("encoder-test.bin"),
            model: blob("model-test.bin"),
        }
    }

    #[test]
    fn test_decodes_through_manifest_table() {
        let (encoder, model) = fitted();
        let predictor = Predictor::from_parts(manifest(&["DAP", "Urea"]), encoder, model).unwrap();

        let label = predictor.predict(&fields(30.0, "Sandy", 40.0)).unwrap().label;
        assert_eq!(label, "Urea");
        let label = predictor.predict(&fields(26.0, "Sandy", 5.0)).unwrap().label;
        assert_eq!(label, "DAP");
    }

    #[test]
    fn test_prediction_is_deterministic() {
        let (encoder, model) = fitted();
        let predictor = Predictor::from_parts(manifest(&["DAP", "Urea"]), encoder, model).unwrap();
        let request = fields(31.0, "Loamy", 22.0);
        let first = predictor.predict(&request).unwrap();
        for _ in 0..5 {
            assert_eq!(predictor.predict(&request).unwrap(), first);
        }
    }

    #[test]
    fn test_unseen_category_still_predicts() {
        let (encoder, model) = fitted();
        let predictor = Predictor::from_parts(manifest(&["DAP", "Urea"]), encoder, model).unwrap();
        assert!(predictor.predict(&fields(30.0, "Volcanic", 40.0)).is_ok());
    }

    #[test]
    fn test_invalid_request_is_validation_error() {
        let (encoder, model) = fitted();
        let predictor = Predictor::from_parts(manifest(&["DAP", "Urea"]), encoder, model).unwrap();
        let err = predictor.predict(&fields(f64::NAN, "Sandy", 40.0)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_short_class_table_is_inference_error() {
        let (encoder, model) = fitted();
        let predictor = Predictor::from_parts(manifest(&["DAP"]), encoder, model).unwrap();
        let err = predictor.predict(&fields(30.0, "Sandy", 40.0)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Inference);
    }

    #[test]
    fn test_foreign_class_rejected() {
        let (encoder, model) = fitted();
        let err = Predictor::from_parts(manifest(&["DAP", "Compost"]), encoder, model).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Inference);
    }

    #[test]
    fn test_encoder_naming_absent_column_is_inference_error() {
        let (encoder, model) = fitted();
        let mut json = serde_json::to_value(&encoder).unwrap();
        json["schema"]["numeric"][0] = serde_json::Value::from("Rainfall");
        let encoder: TabularEncoder = serde_json::from_value(json).unwrap();

        let predictor = Predictor::from_parts(manifest(&["DAP", "Urea"]), encoder, model).unwrap();
        let err = predictor.predict(&fields(30.0, "Sandy", 40.0)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Inference);
        assert_eq!(err.detail().get("field"), Some("Rainfall"));
    }

    #[test]
    fn test_width_mismatch_is_rejected_at_load() {
        let (encoder, _) = fitted();
        let x: Vec<Vec<f64>> = (0..6).map(|i| vec![i as f64; 20]).collect();
        let y: Vec<usize> = (0..6).map(|i| usize::from(i >= 3)).collect();
        let wide = default_candidates()[0].fit(&x, &y, 2, 42).unwrap();

        let err = Predictor::from_parts(manifest(&["DAP", "Urea"]), encoder, wide).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Inference);
        assert_eq!(err.detail().get("model_features"), Some("20"));
    }

    #[test]
    fn test_unfitted_model_is_rejected_at_load() {
        let (encoder, _) = fitted();
        let empty = Model::DecisionTree(DecisionTree::new(TreeParams::default()));
        let err = Predictor::from_parts(manifest(&["DAP", "Urea"]), encoder, empty).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Inference);
    }

    #[test]
    fn test_load_missing_artifacts_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(ArtifactLayout::new(dir.path()));
        assert_eq!(Predictor::load(&store).unwrap_err().kind(), ErrorKind::Io);
    }
}
