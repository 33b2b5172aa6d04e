//! Command line interface: the input collection layer.
//!
//! Collects one patient's attributes (from flags or a JSON document),
//! enforces the form's ranges and renders the screening outcome.

mod form;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{Diagnosis, ExpectedSchema};

pub use form::{load_input, PatientForm};

#[derive(Debug, Parser)]
#[command(name = "cardiorisk")]
#[command(about = "Heart disease risk screening with a pretrained classifier")]
#[command(version)]
pub struct Cli {
    /// Directory holding the model artifacts (overrides CARDIORISK_ARTIFACT_DIR)
    #[arg(long, global = true, value_name = "DIR")]
    pub artifacts: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Predict heart disease risk for one patient
    Predict(PredictArgs),

    /// Print the columns the model expects, in order
    Columns,

    /// Load and cross-check the model artifacts
    Verify,
}

/// Argument ids of the form flags; `--input` replaces all of them.
const FORM_FIELDS: [&str; 11] = [
    "age",
    "sex",
    "chest_pain_type",
    "resting_bp",
    "cholesterol",
    "fasting_bs",
    "resting_ecg",
    "max_hr",
    "exercise_angina",
    "oldpeak",
    "st_slope",
];

#[derive(Debug, Args)]
pub struct PredictArgs {
    #[command(flatten)]
    pub form: PatientForm,

    /// Read the patient from a JSON file ("-" for stdin) instead of the field flags
    #[arg(long, value_name = "FILE", conflicts_with_all = FORM_FIELDS)]
    pub input: Option<PathBuf>,

    /// Print the outcome as JSON
    #[arg(long)]
    pub json: bool,
}

/// Render a diagnosis as the fixed outcome text, or as JSON.
///
/// # Errors
/// Returns error if JSON serialization fails.
pub fn render_outcome(diagnosis: &Diagnosis, json: bool) -> Result<String, serde_json::Error> {
    if json {
        serde_json::to_string_pretty(diagnosis)
    } else {
        Ok(diagnosis.risk_level.description().to_string())
    }
}

/// One column name per line.
#[must_use]
pub fn render_columns(schema: &ExpectedSchema) -> String {
    schema.columns().join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChestPainType, RiskLevel, Sex};

    #[test]
    fn test_parse_predict_flags() {
        let cli = Cli::try_parse_from([
            "cardiorisk",
            "--artifacts",
            "/srv/models",
            "predict",
            "--age",
            "63",
            "--sex",
            "female",
            "--chest-pain-type",
            "ASY",
            "--oldpeak",
            "6.0",
            "--fasting-bs",
            "1",
        ])
        .expect("Should parse");

        assert_eq!(cli.artifacts, Some(PathBuf::from("/srv/models")));
        let Command::Predict(args) = cli.command else {
            panic!("Expected predict");
        };
        let input = args.form.into_input();
        assert_eq!(input.age, 63);
        assert_eq!(input.sex, Sex::Female);
        assert_eq!(input.chest_pain_type, ChestPainType::Asy);
        assert!(input.fasting_bs);
        assert!((input.oldpeak - 6.0).abs() < f64::EPSILON);
        // Untouched fields keep the form defaults.
        assert_eq!(input.max_hr, 150);
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_out_of_range_flags_rejected() {
        for args in [
            vec!["cardiorisk", "predict", "--age", "17"],
            vec!["cardiorisk", "predict", "--cholesterol", "601"],
            vec!["cardiorisk", "predict", "--oldpeak", "6.1"],
            vec!["cardiorisk", "predict", "--fasting-bs", "2"],
            vec!["cardiorisk", "predict", "--st-slope", "sideways"],
        ] {
            assert!(Cli::try_parse_from(args.iter().copied()).is_err(), "{args:?} should fail");
        }
    }

    #[test]
    fn test_input_file_excludes_form_flags() {
        let cli = Cli::try_parse_from(["cardiorisk", "predict", "--input", "patient.json"])
            .expect("Should parse");
        let Command::Predict(args) = cli.command else {
            panic!("Expected predict");
        };
        assert_eq!(args.input, Some(PathBuf::from("patient.json")));

        let err = Cli::try_parse_from([
            "cardiorisk",
            "predict",
            "--input",
            "patient.json",
            "--age",
            "70",
        ])
        .err()
        .expect("Should conflict");
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_other_commands() {
        let cli = Cli::try_parse_from(["cardiorisk", "columns"]).expect("Should parse");
        assert!(matches!(cli.command, Command::Columns));

        let cli = Cli::try_parse_from(["cardiorisk", "verify", "--artifacts", "x"])
            .expect("Should parse");
        assert!(matches!(cli.command, Command::Verify));
        assert_eq!(cli.artifacts, Some(PathBuf::from("x")));
    }

    #[test]
    fn test_render_outcome() {
        let high = Diagnosis::from_label(1);
        assert_eq!(
            render_outcome(&high, false).expect("render"),
            RiskLevel::High.description()
        );

        let json = render_outcome(&Diagnosis::from_label(0), true).expect("render");
        let value: serde_json::Value = serde_json::from_str(&json).expect("json");
        assert_eq!(value["risk"], "LOW");
        assert!(value.get("probability").is_none());
    }
}
