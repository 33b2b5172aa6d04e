//! Standard scaler: Implementation of FeatureScaler.
//!
//! Applies `x' = (x - mean) / scale` column by column, with the parameters
//! exported from the training pipeline's fitted scaler.

use serde::{Deserialize, Serialize};

use crate::domain::FeatureRow;
use crate::ports::{FeatureScaler, ModelError};

/// Fitted standardization parameters.
///
/// A zero `scale` entry marks a constant training column and is treated as 1,
/// matching how the training library stores such columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,
}

impl StandardScaler {
    /// Create a scaler from fitted parameters.
    ///
    /// # Errors
    /// Returns error if the parameters are inconsistent.
    pub fn new(
        mean: Vec<f64>,
        scale: Vec<f64>,
        feature_names: Option<Vec<String>>,
    ) -> Result<Self, ModelError> {
        let scaler = Self {
            mean,
            scale,
            feature_names,
        };
        scaler.validate()?;
        Ok(scaler)
    }

    /// Check parameter shapes and values.
    ///
    /// # Errors
    /// Returns `ModelError::InvalidParameters` on length mismatches and
    /// `ModelError::NonFinite` on NaN/infinite parameters.
    pub fn validate(&self) -> Result<(), ModelError> {
        let n = self.mean.len();
        if n == 0 {
            return Err(ModelError::InvalidParameters(
                "scaler has no columns".into(),
            ));
        }
        if self.scale.len() != n {
            return Err(ModelError::InvalidParameters(format!(
                "scaler mean has {n} entries but scale has {}",
                self.scale.len()
            )));
        }
        if let Some(names) = &self.feature_names {
            if names.len() != n {
                return Err(ModelError::InvalidParameters(format!(
                    "scaler has {n} columns but {} feature names",
                    names.len()
                )));
            }
        }
        if let Some(i) = self.mean.iter().position(|m| !m.is_finite()) {
            return Err(ModelError::NonFinite(format!("scaler mean[{i}]")));
        }
        if let Some(i) = self.scale.iter().position(|s| !s.is_finite() || *s < 0.0) {
            return Err(ModelError::NonFinite(format!(
                "scaler scale[{i}] must be finite and non-negative"
            )));
        }
        Ok(())
    }
}

impl FeatureScaler for StandardScaler {
    fn n_features(&self) -> usize {
        self.mean.len()
    }

    fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    fn transform<'s>(&self, row: &FeatureRow<'s>) -> Result<FeatureRow<'s>, ModelError> {
        let values = row.values();
        if values.len() != self.mean.len() {
            return Err(ModelError::DimensionMismatch {
                expected: self.mean.len(),
                got: values.len(),
            });
        }

        let scaled = values
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (mean, scale))| {
                let scale = if *scale == 0.0 { 1.0 } else { *scale };
                (x - mean) / scale
            })
            .collect();

        Ok(row.with_values(scaled)?)
    }
}
