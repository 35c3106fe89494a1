//! Predictor used when no model is configured.

use super::service::{LateFeatures, LatePredictor};

#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledPredictor;

impl LatePredictor for DisabledPredictor {
    fn predict_late(&self, _features: &LateFeatures) -> Option<bool> {
        None
    }

    fn is_enabled(&self) -> bool {
        false
    }
}
