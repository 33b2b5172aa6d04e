//! Prediction service: Orchestrates risk prediction.
//!
//! This service coordinates:
//! - Feature alignment against the expected schema
//! - Scaling with the fitted scaler
//! - Classification
//!
//! The service is the process-wide model context. It is built once from the
//! loaded artifacts, never mutated afterwards and passed by reference to
//! every request.

use std::sync::Arc;

use crate::adapters::{ClassifierArtifact, ModelArtifacts, StandardScaler};
use crate::domain::{Diagnosis, ExpectedSchema, FeatureAligner, PatientInput};
use crate::ports::{Classifier, FeatureScaler};
use crate::CardioriskError;

/// Service for running heart disease risk predictions.
pub struct PredictionService<S, C>
where
    S: FeatureScaler,
    C: Classifier,
{
    aligner: FeatureAligner,
    scaler: Arc<S>,
    classifier: Arc<C>,
}

impl<S, C> PredictionService<S, C>
where
    S: FeatureScaler,
    C: Classifier,
{
    /// Create a prediction service over a schema and its fitted models.
    ///
    /// # Errors
    /// Returns `CardioriskError::Model` if the classifier parameters are
    /// unusable, and `CardioriskError::Inconsistent` if the scaler or
    /// classifier was fitted on a different column layout than the schema.
    pub fn new(
        schema: ExpectedSchema,
        scaler: Arc<S>,
        classifier: Arc<C>,
    ) -> Result<Self, CardioriskError> {
        classifier.validate()?;

        if scaler.n_features() != schema.len() {
            return Err(CardioriskError::Inconsistent(format!(
                "scaler was fitted on {} columns but the schema has {}",
                scaler.n_features(),
                schema.len()
            )));
        }
        if let Some(names) = scaler.feature_names() {
            if names != schema.columns() {
                return Err(CardioriskError::Inconsistent(
                    "scaler feature names differ from the schema columns".to_string(),
                ));
            }
        }
        if classifier.n_features() != schema.len() {
            return Err(CardioriskError::Inconsistent(format!(
                "{} classifier was fitted on {} columns but the schema has {}",
                classifier.kind(),
                classifier.n_features(),
                schema.len()
            )));
        }

        let aligner = FeatureAligner::new(Arc::new(schema));
        let unmapped = aligner.unmapped_columns();
        if !unmapped.is_empty() {
            tracing::warn!(
                "Schema lacks {} form columns; inputs selecting them will be rejected: {}",
                unmapped.len(),
                unmapped.join(", ")
            );
        }

        tracing::info!(
            "Prediction service ready ({} columns, {} classifier)",
            aligner.schema().len(),
            classifier.kind()
        );

        Ok(Self {
            aligner,
            scaler,
            classifier,
        })
    }

    #[must_use]
    pub fn schema(&self) -> &ExpectedSchema {
        self.aligner.schema()
    }

    #[must_use]
    pub fn aligner(&self) -> &FeatureAligner {
        &self.aligner
    }

    #[must_use]
    pub fn classifier_kind(&self) -> &'static str {
        self.classifier.kind()
    }

    /// Run the prediction pipeline on one patient input.
    ///
    /// Performs:
    /// 1. Align the input to the schema
    /// 2. Scale the aligned row
    /// 3. Classify the scaled row
    ///
    /// # Errors
    /// Returns `CardioriskError::Align` on a schema mismatch and
    /// `CardioriskError::Model` if scaling or classification fails.
    pub fn run_prediction(&self, input: &PatientInput) -> Result<Diagnosis, CardioriskError> {
        tracing::debug!("Step 1: Aligning features...");
        let row = self.aligner.align(input)?;

        tracing::debug!("Step 2: Scaling {} columns...", row.values().len());
        let scaled = self.scaler.transform(&row)?;

        tracing::debug!("Step 3: Running {} classifier...", self.classifier.kind());
        let label = self.classifier.predict(&scaled)?;

        let diagnosis = Diagnosis::from_label(label);
        tracing::info!("Prediction complete: risk={}", diagnosis.risk_level);
        Ok(diagnosis)
    }
}

impl PredictionService<StandardScaler, ClassifierArtifact> {
    /// Build the service from loaded artifacts.
    ///
    /// # Errors
    /// Returns `CardioriskError::Inconsistent` if the artifacts disagree on
    /// the column layout.
    pub fn from_artifacts(artifacts: ModelArtifacts) -> Result<Self, CardioriskError> {
        Self::new(
            artifacts.schema,
            Arc::new(artifacts.scaler),
            Arc::new(artifacts.classifier),
        )
    }
}
