//! # cardiorisk
//!
//! Heart disease risk screening with a pretrained classifier.
//!
//! This crate provides:
//! - Alignment of form inputs to the column layout the model was trained on
//! - Scaling and classification with exported, pretrained model artifacts
//! - A command line front end for local screening
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core types (patient input, schema, feature row, diagnosis) and alignment
//! - `ports`: Trait definitions for the scaler and classifier
//! - `adapters`: Concrete implementations (standard scaler, KNN, logistic, artifact loading)
//! - `application`: The prediction service orchestrating domain and ports
//! - `cli`: Command line input collection and outcome rendering

pub mod adapters;
pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod ports;

pub use application::PredictionService;
pub use domain::{
    align, Diagnosis, ExpectedSchema, FeatureAligner, FeatureRow, PatientInput, RiskLevel,
};

/// Result type for cardiorisk operations
pub type Result<T> = std::result::Result<T, CardioriskError>;

/// Main error type for cardiorisk
#[derive(Debug, thiserror::Error)]
pub enum CardioriskError {
    #[error("Feature alignment failed: {0}")]
    Align(#[from] domain::AlignError),

    #[error("Invalid schema: {0}")]
    Schema(#[from] domain::SchemaError),

    #[error("Model error: {0}")]
    Model(#[from] ports::ModelError),

    #[error("Artifact error: {0}")]
    Artifact(#[from] adapters::ArtifactError),

    #[error("Artifacts are inconsistent: {0}")]
    Inconsistent(String),

    #[error("Invalid patient data: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
