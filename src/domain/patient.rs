//! Patient attributes collected by the screening form.
//!
//! Eleven attributes of the UCI heart failure dataset: five numeric
//! measurements, the fasting blood sugar flag and five categorical selections.

use std::ops::RangeInclusive;

use serde::{de, Deserialize, Deserializer, Serialize};

/// Accepted age range in years.
pub const AGE_RANGE: RangeInclusive<u32> = 18..=100;
/// Accepted resting blood pressure range in mm Hg.
pub const RESTING_BP_RANGE: RangeInclusive<u32> = 80..=200;
/// Accepted serum cholesterol range in mg/dL.
pub const CHOLESTEROL_RANGE: RangeInclusive<u32> = 100..=600;
/// Accepted maximum heart rate range in bpm.
pub const MAX_HR_RANGE: RangeInclusive<u32> = 60..=220;
/// Accepted ST depression (oldpeak) range.
pub const OLDPEAK_RANGE: RangeInclusive<f64> = 0.0..=6.0;

/// Column names of the numeric attributes, in the order returned by
/// [`PatientInput::numeric_values`].
pub const NUMERIC_COLUMNS: [&str; 6] = [
    "Age",
    "RestingBP",
    "Cholesterol",
    "FastingBS",
    "MaxHR",
    "Oldpeak",
];

/// A categorical attribute with a closed set of categories.
///
/// Each category becomes a one-hot indicator column named
/// `<FIELD>_<label>` in the training data.
pub trait Categorical: Copy + Eq + 'static {
    /// Field name as used in indicator column names.
    const FIELD: &'static str;

    /// Every category, in declaration order.
    const ALL: &'static [Self];

    /// Category label as used in indicator column names.
    fn label(self) -> &'static str;

    /// Position of this category in [`Categorical::ALL`].
    fn ordinal(self) -> usize;
}

macro_rules! categorical {
    (
        $(#[$meta:meta])*
        $name:ident, $field:literal {
            $($(#[$vmeta:meta])* $variant:ident => $label:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl Categorical for $name {
            const FIELD: &'static str = $field;
            const ALL: &'static [Self] = &[$(Self::$variant),+];

            fn label(self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }

            fn ordinal(self) -> usize {
                self as usize
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.label())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|c| c.label().eq_ignore_ascii_case(wanted))
                    .ok_or_else(|| {
                        let labels: Vec<&str> = Self::ALL.iter().map(|c| c.label()).collect();
                        format!(
                            "invalid {} '{}' (expected one of: {})",
                            $field,
                            s,
                            labels.join(", ")
                        )
                    })
            }
        }
    };
}

categorical! {
    /// Biological sex.
    Sex, "Sex" {
        Male => "Male",
        Female => "Female",
    }
}

categorical! {
    /// Chest pain type.
    ChestPainType, "ChestPainType" {
        /// Atypical angina
        Ata => "ATA",
        /// Non-anginal pain
        Nap => "NAP",
        /// Typical angina
        Ta => "TA",
        /// Asymptomatic
        Asy => "ASY",
    }
}

categorical! {
    /// Resting electrocardiogram result.
    RestingEcg, "RestingECG" {
        Normal => "Normal",
        /// ST-T wave abnormality
        St => "ST",
        /// Left ventricular hypertrophy
        Lvh => "LVH",
    }
}

categorical! {
    /// Exercise-induced angina.
    ExerciseAngina, "ExerciseAngina" {
        Yes => "Yes",
        No => "No",
    }
}

categorical! {
    /// Slope of the peak exercise ST segment.
    StSlope, "ST_Slope" {
        Up => "Up",
        Flat => "Flat",
        Down => "Down",
    }
}

/// Raw patient attributes as entered in the form.
///
/// Ranges are enforced by the input layer through [`PatientInput::validate`];
/// feature alignment takes the values as given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientInput {
    /// Age in years
    pub age: u32,

    /// Resting blood pressure in mm Hg
    pub resting_bp: u32,

    /// Serum cholesterol in mg/dL
    pub cholesterol: u32,

    /// Fasting blood sugar > 120 mg/dL (JSON accepts `true`/`false` or `0`/`1`)
    #[serde(deserialize_with = "deserialize_flag")]
    pub fasting_bs: bool,

    /// Maximum heart rate achieved
    pub max_hr: u32,

    /// ST depression induced by exercise relative to rest
    pub oldpeak: f64,

    pub sex: Sex,
    pub chest_pain_type: ChestPainType,
    pub resting_ecg: RestingEcg,
    pub exercise_angina: ExerciseAngina,
    pub st_slope: StSlope,
}

impl Default for PatientInput {
    fn default() -> Self {
        Self {
            age: 40,
            resting_bp: 120,
            cholesterol: 200,
            fasting_bs: false,
            max_hr: 150,
            oldpeak: 1.0,
            sex: Sex::Male,
            chest_pain_type: ChestPainType::Ata,
            resting_ecg: RestingEcg::Normal,
            exercise_angina: ExerciseAngina::Yes,
            st_slope: StSlope::Up,
        }
    }
}

impl PatientInput {
    /// Numeric attributes in [`NUMERIC_COLUMNS`] order.
    #[must_use]
    pub fn numeric_values(&self) -> [f64; 6] {
        [
            f64::from(self.age),
            f64::from(self.resting_bp),
            f64::from(self.cholesterol),
            if self.fasting_bs { 1.0 } else { 0.0 },
            f64::from(self.max_hr),
            self.oldpeak,
        ]
    }

    /// Validate that all attributes are within the ranges offered by the form.
    ///
    /// # Errors
    /// Returns validation errors as a vector of strings.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        check_range(&mut errors, "Age", self.age, &AGE_RANGE);
        check_range(&mut errors, "Resting BP", self.resting_bp, &RESTING_BP_RANGE);
        check_range(&mut errors, "Cholesterol", self.cholesterol, &CHOLESTEROL_RANGE);
        check_range(&mut errors, "Max HR", self.max_hr, &MAX_HR_RANGE);

        if !self.oldpeak.is_finite() || !OLDPEAK_RANGE.contains(&self.oldpeak) {
            errors.push(format!(
                "Oldpeak {} out of range [{}, {}]",
                self.oldpeak,
                OLDPEAK_RANGE.start(),
                OLDPEAK_RANGE.end()
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn check_range(errors: &mut Vec<String>, name: &str, value: u32, range: &RangeInclusive<u32>) {
    if !range.contains(&value) {
        errors.push(format!(
            "{name} {value} out of range [{}, {}]",
            range.start(),
            range.end()
        ));
    }
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(u64),
    }

    match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => Ok(b),
        Flag::Int(0) => Ok(false),
        Flag::Int(1) => Ok(true),
        Flag::Int(n) => Err(de::Error::custom(format!(
            "fasting_bs must be 0 or 1, got {n}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_values_order() {
        let input = PatientInput {
            fasting_bs: true,
            oldpeak: 2.5,
            ..Default::default()
        };

        let values = input.numeric_values();
        assert_eq!(values.len(), NUMERIC_COLUMNS.len());
        assert!((values[0] - 40.0).abs() < f64::EPSILON);
        assert!((values[3] - 1.0).abs() < f64::EPSILON);
        assert!((values[5] - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_category_parsing() {
        assert_eq!("male".parse::<Sex>(), Ok(Sex::Male));
        assert_eq!("asy".parse::<ChestPainType>(), Ok(ChestPainType::Asy));
        assert_eq!(" LVH ".parse::<RestingEcg>(), Ok(RestingEcg::Lvh));
        assert_eq!("Flat".parse::<StSlope>(), Ok(StSlope::Flat));

        let err = "sideways".parse::<StSlope>().unwrap_err();
        assert!(err.contains("ST_Slope"));
        assert!(err.contains("Up, Flat, Down"));
    }

    #[test]
    fn test_ordinals_follow_declaration_order() {
        for (i, c) in ChestPainType::ALL.iter().enumerate() {
            assert_eq!(c.ordinal(), i);
        }
        assert_eq!(ExerciseAngina::No.ordinal(), 1);
    }

    #[test]
    fn test_validation() {
        assert!(PatientInput::default().validate().is_ok());

        let boundary = PatientInput {
            age: 100,
            oldpeak: 6.0,
            ..Default::default()
        };
        assert!(boundary.validate().is_ok());

        let invalid = PatientInput {
            age: 10,
            cholesterol: 700,
            oldpeak: f64::NAN,
            ..Default::default()
        };
        let errors = invalid.validate().unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_json_roundtrip_uses_labels() {
        let json = r#"{
            "age": 54, "resting_bp": 140, "cholesterol": 239, "fasting_bs": 1,
            "max_hr": 160, "oldpeak": 1.2, "sex": "Female", "chest_pain_type": "NAP",
            "resting_ecg": "ST", "exercise_angina": "No", "st_slope": "Down"
        }"#;
        let input: PatientInput = serde_json::from_str(json).expect("Should parse");
        assert!(input.fasting_bs);
        assert_eq!(input.chest_pain_type, ChestPainType::Nap);
        assert_eq!(input.st_slope, StSlope::Down);

        let out = serde_json::to_string(&input).expect("Should serialize");
        assert!(out.contains(r#""resting_ecg":"ST""#));

        let bad = json.replace(r#""fasting_bs": 1"#, r#""fasting_bs": 2"#);
        assert!(serde_json::from_str::<PatientInput>(&bad).is_err());
    }
}
