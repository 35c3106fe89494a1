//! Logistic-regression model exported as JSON.
//!
//! ```json
//! {
//!   "intercept": -3.2,
//!   "coefficients": [0.15, 0.9],
//!   "means": [6.1, 1.4],
//!   "scales": [4.0, 2.3],
//!   "threshold": 0.5
//! }
//! ```
//!
//! `means`/`scales` are optional standard-scaler parameters applied to the
//! features before the linear term.

use serde::Deserialize;
use std::path::Path;

use super::service::{LateFeatures, LatePredictor, ModelError};

const FEATURE_COUNT: usize = 2;

fn default_threshold() -> f64 {
    0.5
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LogisticModel {
    intercept: f64,
    coefficients: Vec<f64>,
    #[serde(default)]
    means: Option<Vec<f64>>,
    #[serde(default)]
    scales: Option<Vec<f64>>,
    #[serde(default = "default_threshold")]
    threshold: f64,
}

impl LogisticModel {
    pub fn from_json(raw: &str) -> Result<Self, ModelError> {
        let model: Self = serde_json::from_str(raw)?;
        model.validate()?;
        Ok(model)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    fn validate(&self) -> Result<(), ModelError> {
        if self.coefficients.len() != FEATURE_COUNT {
            return Err(ModelError::Invalid(format!(
                "expected {FEATURE_COUNT} coefficients, got {}",
                self.coefficients.len()
            )));
        }
        for (name, values) in [("means", &self.means), ("scales", &self.scales)] {
            if let Some(values) = values
                && values.len() != FEATURE_COUNT
            {
                return Err(ModelError::Invalid(format!(
                    "expected {FEATURE_COUNT} {name}, got {}",
                    values.len()
                )));
            }
        }
        if self
            .scales
            .as_ref()
            .is_some_and(|s| s.iter().any(|v| *v == 0.0))
        {
            return Err(ModelError::Invalid("scales must be non-zero".to_string()));
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(ModelError::Invalid(format!(
                "threshold must be within 0..=1, got {}",
                self.threshold
            )));
        }
        Ok(())
    }

    /// Probability of a late return.
    pub fn probability(&self, features: &LateFeatures) -> f64 {
        let z = features
            .as_vec()
            .iter()
            .enumerate()
            .map(|(i, value)| {
                let mean = self.means.as_ref().map_or(0.0, |m| m[i]);
                let scale = self.scales.as_ref().map_or(1.0, |s| s[i]);
                self.coefficients[i] * (value - mean) / scale
            })
            .sum::<f64>()
            + self.intercept;

        1.0 / (1.0 + (-z).exp())
    }
}

impl LatePredictor for LogisticModel {
    fn predict_late(&self, features: &LateFeatures) -> Option<bool> {
        let p = self.probability(features);
        if p.is_finite() {
            Some(p >= self.threshold)
        } else {
            None
        }
    }

    fn is_enabled(&self) -> bool {
        true
    }
}
