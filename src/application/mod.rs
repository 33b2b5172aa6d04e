//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with ports to implement
//! the screening use case.

mod prediction;

pub use prediction::PredictionService;
