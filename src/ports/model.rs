//! Model ports: Traits for the pretrained scaler and classifier.
//!
//! Both are fitted elsewhere and loaded once at startup. Implementations
//! must be immutable after construction so a single instance can serve any
//! number of requests without locking.

use crate::domain::{FeatureRow, SchemaError};

/// Errors that can occur while applying a pretrained model.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("Feature count mismatch: model expects {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Invalid model parameters: {0}")]
    InvalidParameters(String),

    #[error("Non-finite value: {0}")]
    NonFinite(String),

    #[error("Estimator failure: {0}")]
    Estimator(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Trait for a fitted feature scaler.
///
/// Scaling is column-wise and order-sensitive: the row must follow the
/// column order the scaler was fitted on.
pub trait FeatureScaler: Send + Sync {
    /// Number of columns the scaler was fitted on.
    fn n_features(&self) -> usize;

    /// Column names seen during fitting, if recorded.
    fn feature_names(&self) -> Option<&[String]> {
        None
    }

    /// Scale a row, producing a new row over the same schema.
    ///
    /// # Errors
    /// Returns `ModelError::DimensionMismatch` if the row width differs from
    /// the fitted width.
    fn transform<'s>(&self, row: &FeatureRow<'s>) -> Result<FeatureRow<'s>, ModelError>;
}

/// Trait for a fitted binary classifier.
pub trait Classifier: Send + Sync {
    /// Number of input columns the classifier was fitted on.
    fn n_features(&self) -> usize;

    /// Short name of the model family, for logs and diagnostics.
    fn kind(&self) -> &'static str;

    /// Check that the fitted parameters are usable for prediction.
    ///
    /// # Errors
    /// Returns `ModelError::InvalidParameters` or `ModelError::NonFinite`.
    fn validate(&self) -> Result<(), ModelError> {
        Ok(())
    }

    /// Predict the class label (0 or 1) of a scaled row.
    ///
    /// # Errors
    /// Returns `ModelError::DimensionMismatch` if the row width differs from
    /// the fitted width.
    fn predict(&self, row: &FeatureRow<'_>) -> Result<u8, ModelError>;
}
