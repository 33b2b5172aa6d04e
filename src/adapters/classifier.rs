//! Classifier adapters: Implementations of Classifier.
//!
//! The training pipeline exports one of two model families:
//! - `knn`: k-nearest neighbours over the scaled training rows
//! - `logistic`: a linear decision function
//!
//! The exported file carries a `kind` tag selecting the family.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize, Serializer};
use smartcore::algorithm::neighbour::KNNAlgorithmName;
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::metrics::distance::euclidian::Euclidian;
use smartcore::neighbors::knn_classifier::{KNNClassifier, KNNClassifierParameters};
use smartcore::neighbors::KNNWeightFunction;

use crate::domain::FeatureRow;
use crate::ports::{Classifier, ModelError};

type KnnModel = KNNClassifier<f64, u32, DenseMatrix<f64>, Vec<u32>, Euclidian<f64>>;

/// Neighbour vote weighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KnnWeights {
    /// Every neighbour casts one vote.
    #[default]
    Uniform,
    /// Votes are weighted by inverse distance; exact matches win outright.
    Distance,
}

impl From<KnnWeights> for KNNWeightFunction {
    fn from(weights: KnnWeights) -> Self {
        match weights {
            KnnWeights::Uniform => KNNWeightFunction::Uniform,
            KnnWeights::Distance => KNNWeightFunction::Distance,
        }
    }
}

fn default_neighbors() -> usize {
    5
}

/// Exported form of a k-nearest-neighbours model: the scaled training rows
/// and their labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnnParams {
    #[serde(default = "default_neighbors")]
    pub n_neighbors: usize,
    #[serde(default)]
    pub weights: KnnWeights,
    pub samples: Vec<Vec<f64>>,
    pub labels: Vec<u8>,
}

impl KnnParams {
    /// Check parameter shapes and values.
    ///
    /// # Errors
    /// Returns `ModelError::InvalidParameters` or `ModelError::NonFinite`.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.samples.is_empty() {
            return Err(ModelError::InvalidParameters(
                "knn model has no training samples".into(),
            ));
        }
        // The estimator rejects k = 1.
        if self.n_neighbors < 2 || self.n_neighbors > self.samples.len() {
            return Err(ModelError::InvalidParameters(format!(
                "n_neighbors must be in [2, {}], got {}",
                self.samples.len(),
                self.n_neighbors
            )));
        }
        if self.labels.len() != self.samples.len() {
            return Err(ModelError::InvalidParameters(format!(
                "knn model has {} samples but {} labels",
                self.samples.len(),
                self.labels.len()
            )));
        }
        if let Some(label) = self.labels.iter().find(|l| **l > 1) {
            return Err(ModelError::InvalidParameters(format!(
                "knn labels must be 0 or 1, got {label}"
            )));
        }

        let width = self.samples[0].len();
        if width == 0 {
            return Err(ModelError::InvalidParameters(
                "knn samples have no columns".into(),
            ));
        }
        for (i, sample) in self.samples.iter().enumerate() {
            if sample.len() != width {
                return Err(ModelError::InvalidParameters(format!(
                    "knn sample {i} has {} columns, expected {width}",
                    sample.len()
                )));
            }
            if sample.iter().any(|v| !v.is_finite()) {
                return Err(ModelError::NonFinite(format!("knn sample {i}")));
            }
        }
        Ok(())
    }
}

/// Fitted k-nearest-neighbours classifier.
///
/// Fitting happens once, on construction, from validated [`KnnParams`];
/// a `KnnClassifier` cannot exist in an unfitted state. Distances are
/// Euclidean over a linear search.
#[derive(Clone, Deserialize)]
#[serde(try_from = "KnnParams")]
pub struct KnnClassifier {
    params: KnnParams,
    model: Arc<KnnModel>,
}

impl KnnClassifier {
    /// Create a classifier from training rows.
    ///
    /// # Errors
    /// Returns error if the parameters are inconsistent or fitting fails.
    pub fn new(
        n_neighbors: usize,
        weights: KnnWeights,
        samples: Vec<Vec<f64>>,
        labels: Vec<u8>,
    ) -> Result<Self, ModelError> {
        Self::fit(KnnParams {
            n_neighbors,
            weights,
            samples,
            labels,
        })
    }

    /// Fit the estimator on exported parameters.
    ///
    /// # Errors
    /// Returns `ModelError::InvalidParameters` for malformed parameters and
    /// `ModelError::Estimator` if the estimator rejects them.
    pub fn fit(params: KnnParams) -> Result<Self, ModelError> {
        params.validate()?;

        let x = DenseMatrix::from_2d_vec(&params.samples);
        let y: Vec<u32> = params.labels.iter().map(|&l| u32::from(l)).collect();
        let parameters = KNNClassifierParameters::default()
            .with_k(params.n_neighbors)
            .with_algorithm(KNNAlgorithmName::LinearSearch)
            .with_weight(params.weights.into());
        let model = KnnModel::fit(&x, &y, parameters)
            .map_err(|e| ModelError::Estimator(e.to_string()))?;

        Ok(Self {
            params,
            model: Arc::new(model),
        })
    }

    #[must_use]
    pub fn params(&self) -> &KnnParams {
        &self.params
    }
}

impl TryFrom<KnnParams> for KnnClassifier {
    type Error = ModelError;

    fn try_from(params: KnnParams) -> Result<Self, Self::Error> {
        Self::fit(params)
    }
}

impl Serialize for KnnClassifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.params.serialize(serializer)
    }
}

impl PartialEq for KnnClassifier {
    fn eq(&self, other: &Self) -> bool {
        self.params == other.params
    }
}

impl fmt::Debug for KnnClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KnnClassifier")
            .field("n_neighbors", &self.params.n_neighbors)
            .field("weights", &self.params.weights)
            .field("samples", &self.params.samples.len())
            .finish()
    }
}

fn check_input(row: &FeatureRow<'_>, expected: usize) -> Result<(), ModelError> {
    let values = row.values();
    if values.len() != expected {
        return Err(ModelError::DimensionMismatch {
            expected,
            got: values.len(),
        });
    }
    if let Some((name, _)) = row.iter().find(|(_, v)| !v.is_finite()) {
        return Err(ModelError::NonFinite(format!("input column {name}")));
    }
    Ok(())
}

impl Classifier for KnnClassifier {
    fn n_features(&self) -> usize {
        self.params.samples.first().map_or(0, Vec::len)
    }

    fn kind(&self) -> &'static str {
        "knn"
    }

    fn validate(&self) -> Result<(), ModelError> {
        self.params.validate()
    }

    fn predict(&self, row: &FeatureRow<'_>) -> Result<u8, ModelError> {
        check_input(row, self.n_features())?;
        let x = DenseMatrix::from_2d_vec(&vec![row.values().to_vec()]);
        let predicted = self
            .model
            .predict(&x)
            .map_err(|e| ModelError::Estimator(e.to_string()))?;
        match predicted.first() {
            Some(&label) if label <= 1 => Ok(u8::from(label == 1)),
            Some(&label) => Err(ModelError::Estimator(format!(
                "knn predicted unknown label {label}"
            ))),
            None => Err(ModelError::Estimator("knn returned no prediction".into())),
        }
    }
}

/// Fitted logistic regression: label 1 iff `coefficients · x + intercept > 0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticClassifier {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LogisticClassifier {
    /// # Errors
    /// Returns error if the parameters are empty or non-finite.
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> Result<Self, ModelError> {
        let model = Self {
            coefficients,
            intercept,
        };
        model.validate()?;
        Ok(model)
    }

    /// # Errors
    /// Returns `ModelError::InvalidParameters` or `ModelError::NonFinite`.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.coefficients.is_empty() {
            return Err(ModelError::InvalidParameters(
                "logistic model has no coefficients".into(),
            ));
        }
        if let Some(i) = self.coefficients.iter().position(|c| !c.is_finite()) {
            return Err(ModelError::NonFinite(format!("coefficient[{i}]")));
        }
        if !self.intercept.is_finite() {
            return Err(ModelError::NonFinite("intercept".into()));
        }
        Ok(())
    }

    /// Linear decision value for a scaled input.
    #[must_use]
    pub fn decision_function(&self, x: &[f64]) -> f64 {
        self.coefficients
            .iter()
            .zip(x)
            .map(|(w, v)| w * v)
            .sum::<f64>()
            + self.intercept
    }
}

impl Classifier for LogisticClassifier {
    fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    fn kind(&self) -> &'static str {
        "logistic"
    }

    fn validate(&self) -> Result<(), ModelError> {
        LogisticClassifier::validate(self)
    }

    fn predict(&self, row: &FeatureRow<'_>) -> Result<u8, ModelError> {
        check_input(row, self.n_features())?;
        Ok(u8::from(self.decision_function(row.values()) > 0.0))
    }
}

/// Exported classifier, tagged by model family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifierArtifact {
    Knn(KnnClassifier),
    Logistic(LogisticClassifier),
}

impl Classifier for ClassifierArtifact {
    fn n_features(&self) -> usize {
        match self {
            Self::Knn(m) => m.n_features(),
            Self::Logistic(m) => m.n_features(),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Knn(m) => m.kind(),
            Self::Logistic(m) => m.kind(),
        }
    }

    fn validate(&self) -> Result<(), ModelError> {
        match self {
            Self::Knn(m) => Classifier::validate(m),
            Self::Logistic(m) => Classifier::validate(m),
        }
    }

    fn predict(&self, row: &FeatureRow<'_>) -> Result<u8, ModelError> {
        match self {
            Self::Knn(m) => m.predict(row),
            Self::Logistic(m) => m.predict(row),
        }
    }
}
