//! Tabular dataset loading and deterministic partitioning

use crate::error::{Error, Result, ResultExt, Stage};
use crate::record::{columns, LabeledRecord, Record, RecordFields};
use ahash::AHashMap;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Default fraction of rows held out for testing
pub const DEFAULT_TEST_FRACTION: f64 = 0.2;

/// Default split seed
pub const DEFAULT_SEED: u64 = 42;

/// Column order used when writing a dataset back to CSV
pub const OUTPUT_COLUMNS: [&str; 10] = [
    columns::TEMPERATURE,
    columns::HUMIDITY,
    columns::MOISTURE,
    columns::SOIL_TYPE,
    columns::CROP_TYPE,
    columns::NITROGEN,
    columns::POTASSIUM,
    columns::PHOSPHOROUS,
    columns::TARGET,
    columns::SOIL_HEALTH_SCORE,
];

/// Normalize a raw header: trim, then join whitespace-separated words with `_`
pub fn normalize_column_name(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join("_")
}

/// Ordered collection of labeled records
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    rows: Vec<LabeledRecord>,
}

impl Dataset {
    pub fn new(rows: Vec<LabeledRecord>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[LabeledRecord] {
        &self.rows
    }

    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.rows.iter().map(|r| &r.record)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|r| r.label.as_str())
    }

    /// Read a CSV file from disk
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .io_context(Stage::Ingestion, "cannot open dataset")
            .map_err(|e| e.with("path", path.display()))?;
        let dataset = Self::from_reader(file).map_err(|e| e.with("path", path.display()))?;
        info!(path = %path.display(), rows = dataset.len(), "Dataset loaded");
        Ok(dataset)
    }

    /// Parse CSV data, normalizing headers and computing the derived score.
    ///
    /// An existing `soil_health_score` column is ignored and recomputed.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv_reader
            .headers()
            .io_context(Stage::Ingestion, "cannot read CSV header")?
            .clone();
        let positions: AHashMap<String, usize> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (normalize_column_name(h), i))
            .collect();
        debug!(columns = ?positions.keys().collect::<Vec<_>>(), "Normalized CSV header");

        let resolve = |name: &str| -> Result<usize> {
            positions.get(name).copied().ok_or_else(|| {
                Error::validation(Stage::Ingestion, "required column missing").with("column", name)
            })
        };
        let temperature = positions
            .get(columns::TEMPERATURE)
            .or_else(|| positions.get(columns::TEMPERATURE_ALIAS))
            .copied()
            .ok_or_else(|| {
                Error::validation(Stage::Ingestion, "required column missing")
                    .with("column", columns::TEMPERATURE)
            })?;
        let humidity = resolve(columns::HUMIDITY)?;
        let moisture = resolve(columns::MOISTURE)?;
        let soil_type = resolve(columns::SOIL_TYPE)?;
        let crop_type = resolve(columns::CROP_TYPE)?;
        let nitrogen = resolve(columns::NITROGEN)?;
        let potassium = resolve(columns::POTASSIUM)?;
        let phosphorous = resolve(columns::PHOSPHOROUS)?;
        let target = resolve(columns::TARGET)?;

        let mut rows = Vec::new();
        for (i, result) in csv_reader.records().enumerate() {
            // header is line 1
            let line = i + 2;
            let row = result
                .io_context(Stage::Ingestion, "malformed CSV row")
                .map_err(|e| e.with("line", line))?;

            let number = |idx: usize, name: &str| -> Result<f64> {
                let raw = row.get(idx).unwrap_or("");
                raw.parse::<f64>().map_err(|e| {
                    Error::validation(Stage::Ingestion, "not a number")
                        .with("line", line)
                        .with("column", name)
                        .with("value", raw)
                        .caused_by(e)
                })
            };
            let text = |idx: usize| row.get(idx).unwrap_or("").to_string();

            let fields = RecordFields {
                temperature: number(temperature, columns::TEMPERATURE)?,
                humidity: number(humidity, columns::HUMIDITY)?,
                moisture: number(moisture, columns::MOISTURE)?,
                soil_type: text(soil_type),
                crop_type: text(crop_type),
                nitrogen: number(nitrogen, columns::NITROGEN)?,
                potassium: number(potassium, columns::POTASSIUM)?,
                phosphorous: number(phosphorous, columns::PHOSPHOROUS)?,
            };
            let record = Record::from_fields(fields).map_err(|e| e.with("line", line))?;

            let label = text(target);
            if label.is_empty() {
                return Err(Error::validation(Stage::Ingestion, "target label is empty")
                    .with("line", line)
                    .with("column", columns::TARGET));
            }
            rows.push(LabeledRecord { record, label });
        }

        Ok(Self { rows })
    }

    /// Serialize to CSV with canonical headers and the derived score column
    pub fn to_csv_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(OUTPUT_COLUMNS)
            .io_context(Stage::Ingestion, "cannot write CSV header")?;

        for row in &self.rows {
            let f = &row.record.fields;
            writer
                .write_record([
                    f.temperature.to_string(),
                    f.humidity.to_string(),
                    f.moisture.to_string(),
                    f.soil_type.clone(),
                    f.crop_type.clone(),
                    f.nitrogen.to_string(),
                    f.potassium.to_string(),
                    f.phosphorous.to_string(),
                    row.label.clone(),
                    row.record.soil_health_score.to_string(),
                ])
                .io_context(Stage::Ingestion, "cannot write CSV row")?;
        }

        writer
            .into_inner()
            .map_err(|e| Error::io(Stage::Ingestion, "cannot flush CSV").caused_by(e.to_string()))
    }

    /// Deterministic train/test split.
    ///
    /// Rows are shuffled with a seeded RNG; the test partition takes
    /// `ceil(len * test_fraction)` rows and the rest go to train.
    pub fn split(&self, test_fraction: f64, seed: u64) -> Result<(Dataset, Dataset)> {
        if !(test_fraction > 0.0 && test_fraction < 1.0) {
            return Err(Error::validation(Stage::Ingestion, "test fraction must be in (0, 1)")
                .with("test_fraction", test_fraction));
        }
        if self.rows.len() < 2 {
            return Err(Error::validation(Stage::Ingestion, "need at least two rows to split")
                .with("rows", self.rows.len()));
        }

        let mut indices: Vec<usize> = (0..self.rows.len()).collect();
        let mut rng = StdRng::seed_from_u64(seed);
        indices.shuffle(&mut rng);

        let n_test = ((self.rows.len() as f64) * test_fraction).ceil() as usize;
        let n_test = n_test.clamp(1, self.rows.len() - 1);

        let test = indices[..n_test]
            .iter()
            .map(|&i| self.rows[i].clone())
            .collect();
        let train = indices[n_test..]
            .iter()
            .map(|&i| self.rows[i].clone())
            .collect();

        Ok((Dataset::new(train), Dataset::new(test)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const CSV: &str = "Temparature,Humidity ,Moisture,Soil Type,Crop Type,Nitrogen,Potassium,Phosphorous,Fertilizer Name\n\
26,52,38,Sandy,Maize,37,0,0,Urea\n\
29,52,45,Loamy,Sugarcane,12,0,36,DAP\n\
34,65,62,Black,Cotton,7,9,30,14-35-14\n\
32,62,34,Red,Tobacco,22,0,20,28-28\n\
28,54,46,Clayey,Paddy,35,0,0,Urea\n";

    #[test]
    fn test_normalize_column_name() {
        assert_eq!(normalize_column_name("Humidity "), "Humidity");
        assert_eq!(normalize_column_name(" Soil  Type"), "Soil_Type");
        assert_eq!(normalize_column_name("Fertilizer Name"), "Fertilizer_Name");
    }

    #[test]
    fn test_from_reader_normalizes_and_scores() {
        let dataset = Dataset::from_reader(CSV.as_bytes()).unwrap();
        assert_eq!(dataset.len(), 5);

        let first = &dataset.rows()[0];
        assert_eq!(first.label, "Urea");
        assert_eq!(first.record.fields.soil_type, "Sandy");
        assert!((first.record.soil_health_score - 25.4).abs() < 1e-9);
    }

    #[test]
    fn test_missing_column_is_validation_error() {
        let csv = "Temperature,Humidity\n1,2\n";
        let err = Dataset::from_reader(csv.as_bytes()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.detail().get("column"), Some("Moisture"));
    }

    #[test]
    fn test_bad_number_reports_line() {
        let csv = CSV.replace("29,52,45", "29,abc,45");
        let err = Dataset::from_reader(csv.as_bytes()).unwrap_err();
        assert_eq!(err.detail().get("line"), Some("3"));
        assert_eq!(err.detail().get("column"), Some("Humidity"));
    }

    #[test]
    fn test_split_is_deterministic() {
        let dataset = Dataset::from_reader(CSV.as_bytes()).unwrap();
        let (train_a, test_a) = dataset.split(0.2, 42).unwrap();
        let (train_b, test_b) = dataset.split(0.2, 42).unwrap();

        assert_eq!(train_a, train_b);
        assert_eq!(test_a, test_b);
        assert_eq!(test_a.len(), 1);
        assert_eq!(train_a.len(), 4);
    }

    #[test]
    fn test_split_rejects_bad_fraction() {
        let dataset = Dataset::from_reader(CSV.as_bytes()).unwrap();
        assert!(dataset.split(1.0, 42).is_err());
        assert!(dataset.split(0.0, 42).is_err());
    }

    #[test]
    fn test_csv_roundtrip_keeps_rows() {
        let dataset = Dataset::from_reader(CSV.as_bytes()).unwrap();
        let bytes = dataset.to_csv_bytes().unwrap();
        let reloaded = Dataset::from_reader(bytes.as_slice()).unwrap();
        assert_eq!(dataset, reloaded);

        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("Temperature,Humidity,Moisture,Soil_Type"));
    }

    #[test]
    fn test_from_csv_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fertilizer.csv");
        std::fs::write(&path, CSV).unwrap();
        assert_eq!(Dataset::from_csv_path(&path).unwrap().len(), 5);

        let err = Dataset::from_csv_path(dir.path().join("missing.csv")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
