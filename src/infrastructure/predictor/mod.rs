//! Late-return prediction.
//!
//! Provides a [`LatePredictor`] trait with two implementations:
//! - [`LogisticModel`] - Pre-trained model loaded from `LATE_MODEL_PATH`
//! - [`DisabledPredictor`] - No-op used when no model is available

mod disabled;
mod logistic;
mod service;

use std::sync::Arc;

pub use disabled::DisabledPredictor;
pub use logistic::LogisticModel;
pub use service::{LateFeatures, LatePredictor, ModelError};

#[cfg(test)]
pub use service::MockLatePredictor;

/// Loads the configured model, falling back to [`DisabledPredictor`].
pub fn load_predictor(path: Option<&str>) -> Arc<dyn LatePredictor> {
    let Some(path) = path else {
        tracing::info!("Late predictor disabled (LATE_MODEL_PATH not set)");
        return Arc::new(DisabledPredictor);
    };

    match LogisticModel::from_file(path) {
        Ok(model) => {
            tracing::info!(path, "Late predictor enabled");
            Arc::new(model)
        }
        Err(e) => {
            tracing::warn!(path, error = %e, "Failed to load late predictor model, predictor disabled");
            Arc::new(DisabledPredictor)
        }
    }
}
