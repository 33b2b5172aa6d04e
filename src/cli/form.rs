//! Patient form flags and JSON input.

use std::io::Read;
use std::ops::RangeInclusive;
use std::path::Path;

use clap::Args;

use crate::domain::patient::{
    AGE_RANGE, CHOLESTEROL_RANGE, MAX_HR_RANGE, OLDPEAK_RANGE, RESTING_BP_RANGE,
};
use crate::domain::{ChestPainType, ExerciseAngina, PatientInput, RestingEcg, Sex, StSlope};
use crate::CardioriskError;

/// Form fields, with the form's ranges and defaults.
#[derive(Debug, Clone, Args)]
pub struct PatientForm {
    /// Age in years [18, 100]
    #[arg(long, default_value_t = 40, value_parser = parse_age)]
    pub age: u32,

    /// Sex: Male or Female
    #[arg(long, default_value = "Male")]
    pub sex: Sex,

    /// Chest pain type: ATA, NAP, TA or ASY
    #[arg(long, default_value = "ATA")]
    pub chest_pain_type: ChestPainType,

    /// Resting blood pressure in mm Hg [80, 200]
    #[arg(long, default_value_t = 120, value_parser = parse_resting_bp)]
    pub resting_bp: u32,

    /// Serum cholesterol in mg/dL [100, 600]
    #[arg(long, default_value_t = 200, value_parser = parse_cholesterol)]
    pub cholesterol: u32,

    /// Fasting blood sugar > 120 mg/dL: 0 or 1
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=1))]
    pub fasting_bs: u8,

    /// Resting ECG: Normal, ST or LVH
    #[arg(long, default_value = "Normal")]
    pub resting_ecg: RestingEcg,

    /// Maximum heart rate [60, 220]
    #[arg(long, default_value_t = 150, value_parser = parse_max_hr)]
    pub max_hr: u32,

    /// Exercise-induced angina: Yes or No
    #[arg(long, default_value = "Yes")]
    pub exercise_angina: ExerciseAngina,

    /// ST depression (oldpeak) [0.0, 6.0]
    #[arg(long, default_value_t = 1.0, value_parser = parse_oldpeak)]
    pub oldpeak: f64,

    /// ST slope: Up, Flat or Down
    #[arg(long, default_value = "Up")]
    pub st_slope: StSlope,
}

impl PatientForm {
    #[must_use]
    pub fn into_input(self) -> PatientInput {
        PatientInput {
            age: self.age,
            resting_bp: self.resting_bp,
            cholesterol: self.cholesterol,
            fasting_bs: self.fasting_bs == 1,
            max_hr: self.max_hr,
            oldpeak: self.oldpeak,
            sex: self.sex,
            chest_pain_type: self.chest_pain_type,
            resting_ecg: self.resting_ecg,
            exercise_angina: self.exercise_angina,
            st_slope: self.st_slope,
        }
    }
}

fn parse_bounded(s: &str, range: RangeInclusive<u32>) -> Result<u32, String> {
    let value: u32 = s.trim().parse().map_err(|e| format!("{e}"))?;
    if range.contains(&value) {
        Ok(value)
    } else {
        Err(format!("must be in [{}, {}]", range.start(), range.end()))
    }
}

fn parse_age(s: &str) -> Result<u32, String> {
    parse_bounded(s, AGE_RANGE)
}

fn parse_resting_bp(s: &str) -> Result<u32, String> {
    parse_bounded(s, RESTING_BP_RANGE)
}

fn parse_cholesterol(s: &str) -> Result<u32, String> {
    parse_bounded(s, CHOLESTEROL_RANGE)
}

fn parse_max_hr(s: &str) -> Result<u32, String> {
    parse_bounded(s, MAX_HR_RANGE)
}

fn parse_oldpeak(s: &str) -> Result<f64, String> {
    let value: f64 = s.trim().parse().map_err(|e| format!("{e}"))?;
    if value.is_finite() && OLDPEAK_RANGE.contains(&value) {
        Ok(value)
    } else {
        Err(format!(
            "must be in [{}, {}]",
            OLDPEAK_RANGE.start(),
            OLDPEAK_RANGE.end()
        ))
    }
}

/// Read a patient from a JSON document (`-` reads stdin) and validate it.
///
/// # Errors
/// Returns error if the document cannot be read or parsed, or a value is
/// outside the form's ranges.
pub fn load_input(path: &Path) -> Result<PatientInput, CardioriskError> {
    let content = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(path)?
    };

    let input: PatientInput = serde_json::from_str(&content)?;
    input
        .validate()
        .map_err(|errors| CardioriskError::Validation(errors.join("; ")))?;
    Ok(input)
}
