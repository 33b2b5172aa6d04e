//! Domain layer: Core business types and logic.
//!
//! This module contains pure Rust types with no I/O.
//! Feature alignment lives here because it depends only on the patient
//! input and the expected schema.

pub mod alignment;
mod diagnosis;
pub mod patient;
mod schema;

pub use alignment::{align, AlignError, FeatureAligner};
pub use diagnosis::{Diagnosis, RiskLevel};
pub use patient::{
    Categorical, ChestPainType, ExerciseAngina, PatientInput, RestingEcg, Sex, StSlope,
};
pub use schema::{ExpectedSchema, FeatureRow, SchemaError};
