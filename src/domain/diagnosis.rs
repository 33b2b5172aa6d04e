//! Diagnosis result types.
//!
//! Represents the output of the heart disease classifier.

use serde::Serialize;

/// Risk level classification for heart disease.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    /// Classifier predicted no heart disease
    Low,
    /// Classifier predicted heart disease
    High,
}

impl RiskLevel {
    /// Map a classifier label to a risk level. Only label 1 means high risk.
    #[must_use]
    pub fn from_label(label: u8) -> Self {
        if label == 1 {
            Self::High
        } else {
            Self::Low
        }
    }

    /// Get a human-readable description.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Low => "Low Risk of Heart Disease. Stay healthy!",
            Self::High => "High Risk of Heart Disease. Please consult a doctor.",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::High => write!(f, "HIGH"),
        }
    }
}

/// Outcome of one screening request.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnosis {
    /// Raw classifier label (0 = no disease, 1 = disease)
    pub prediction: u8,

    /// Risk classification
    #[serde(rename = "risk")]
    pub risk_level: RiskLevel,

    /// Timestamp of diagnosis
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Diagnosis {
    /// Create a diagnosis from a classifier label.
    #[must_use]
    pub fn from_label(prediction: u8) -> Self {
        Self {
            prediction,
            risk_level: RiskLevel::from_label(prediction),
            created_at: chrono::Utc::now(),
        }
    }

    #[must_use]
    pub fn is_high_risk(&self) -> bool {
        self.risk_level == RiskLevel::High
    }
}
