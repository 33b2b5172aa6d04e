//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundaries
//! between the application and the pretrained model artifacts.

mod model;

pub use model::{Classifier, FeatureScaler, ModelError};
