use crate::schema::SchemaError;
use serde::{Deserialize, Serialize};

/// Standardizes one numeric column with statistics taken from the fit data.
///
/// Uses the population standard deviation. A constant column keeps a
/// scale of 1 so it maps to zero instead of dividing by zero.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StandardScaler {
    mean: f64,
    scale: f64,
}

impl StandardScaler {
    pub fn fit(values: &[f64]) -> Result<Self, SchemaError> {
        if values.is_empty() {
            return Err(SchemaError::EmptyTrainingSet);
        }

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let std = variance.sqrt();
        let scale = if std > f64::EPSILON { std } else { 1.0 };

        Ok(Self { mean, scale })
    }

    #[inline]
    pub fn transform(&self, value: f64) -> f64 {
        (value - self.mean) / self.scale
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }
}
