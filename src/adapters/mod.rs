//! Adapters layer: Concrete implementations of ports.
//!
//! These modules contain the integration with the exported model files:
//! - `scaler`: standardization parameters
//! - `classifier`: k-nearest-neighbours and logistic models
//! - `artifacts`: loading and digest verification of the artifact directory
//! - `sanitize`: clinical data filtering for logs

pub mod artifacts;
pub mod classifier;
pub mod sanitize;
pub mod scaler;

pub use artifacts::{load_artifacts, ArtifactError, ArtifactPaths, ModelArtifacts};
pub use classifier::{
    ClassifierArtifact, KnnClassifier, KnnParams, KnnWeights, LogisticClassifier,
};
pub use scaler::StandardScaler;
