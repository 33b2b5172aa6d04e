//! Feature alignment: patient attributes to the model's column layout.
//!
//! Categorical selections are one-hot encoded into `<Field>_<Category>`
//! indicator columns. Every column name the form can produce is resolved to a
//! schema position once, when the aligner is built; aligning a request only
//! writes values into a zero-filled row at precomputed positions.

use std::marker::PhantomData;
use std::sync::Arc;

use super::patient::{
    Categorical, ChestPainType, ExerciseAngina, PatientInput, RestingEcg, Sex, StSlope,
    NUMERIC_COLUMNS,
};
use super::schema::{ExpectedSchema, FeatureRow};

/// Errors raised while aligning a patient input to the schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AlignError {
    /// The input produced columns the model was never trained on.
    ///
    /// Indicates training/serving skew in the schema artifact.
    #[error(
        "Schema mismatch: input produced columns absent from the schema: {}",
        .unexpected.join(", ")
    )]
    SchemaMismatch { unexpected: Vec<String> },
}

/// Name of the one-hot indicator column for a categorical value.
#[must_use]
pub fn indicator_name(field: &str, label: &str) -> String {
    format!("{field}_{label}")
}

/// Schema positions of one categorical field's indicator columns.
#[derive(Debug, Clone)]
struct IndicatorSlots<C> {
    names: Vec<String>,
    positions: Vec<Option<usize>>,
    _field: PhantomData<C>,
}

impl<C: Categorical> IndicatorSlots<C> {
    fn resolve(schema: &ExpectedSchema) -> Self {
        let names: Vec<String> = C::ALL
            .iter()
            .map(|c| indicator_name(C::FIELD, c.label()))
            .collect();
        let positions = names.iter().map(|n| schema.position(n)).collect();

        Self {
            names,
            positions,
            _field: PhantomData,
        }
    }

    fn activate(&self, value: C, row: &mut FeatureRow<'_>, unexpected: &mut Vec<String>) {
        let i = value.ordinal();
        match self.positions[i] {
            Some(pos) => row.set(pos, 1.0),
            None => unexpected.push(self.names[i].clone()),
        }
    }

    fn unmapped(&self) -> impl Iterator<Item = &str> + '_ {
        self.names
            .iter()
            .zip(&self.positions)
            .filter(|(_, pos)| pos.is_none())
            .map(|(name, _)| name.as_str())
    }
}

/// Lookup table from every producible column to its schema position.
#[derive(Debug, Clone)]
struct ColumnSlots {
    numeric: [Option<usize>; 6],
    sex: IndicatorSlots<Sex>,
    chest_pain_type: IndicatorSlots<ChestPainType>,
    resting_ecg: IndicatorSlots<RestingEcg>,
    exercise_angina: IndicatorSlots<ExerciseAngina>,
    st_slope: IndicatorSlots<StSlope>,
}

impl ColumnSlots {
    fn resolve(schema: &ExpectedSchema) -> Self {
        Self {
            numeric: NUMERIC_COLUMNS.map(|name| schema.position(name)),
            sex: IndicatorSlots::resolve(schema),
            chest_pain_type: IndicatorSlots::resolve(schema),
            resting_ecg: IndicatorSlots::resolve(schema),
            exercise_angina: IndicatorSlots::resolve(schema),
            st_slope: IndicatorSlots::resolve(schema),
        }
    }

    fn fill<'s>(
        &self,
        input: &PatientInput,
        schema: &'s ExpectedSchema,
    ) -> Result<FeatureRow<'s>, AlignError> {
        let mut row = FeatureRow::zeros(schema);
        let mut unexpected = Vec::new();

        for ((name, slot), value) in NUMERIC_COLUMNS
            .iter()
            .zip(&self.numeric)
            .zip(input.numeric_values())
        {
            match slot {
                Some(pos) => row.set(*pos, value),
                None => unexpected.push((*name).to_string()),
            }
        }

        self.sex.activate(input.sex, &mut row, &mut unexpected);
        self.chest_pain_type
            .activate(input.chest_pain_type, &mut row, &mut unexpected);
        self.resting_ecg
            .activate(input.resting_ecg, &mut row, &mut unexpected);
        self.exercise_angina
            .activate(input.exercise_angina, &mut row, &mut unexpected);
        self.st_slope.activate(input.st_slope, &mut row, &mut unexpected);

        if !unexpected.is_empty() {
            return Err(AlignError::SchemaMismatch { unexpected });
        }
        Ok(row)
    }

    fn unmapped(&self) -> Vec<&str> {
        NUMERIC_COLUMNS
            .iter()
            .zip(&self.numeric)
            .filter(|(_, slot)| slot.is_none())
            .map(|(name, _)| *name)
            .chain(self.sex.unmapped())
            .chain(self.chest_pain_type.unmapped())
            .chain(self.resting_ecg.unmapped())
            .chain(self.exercise_angina.unmapped())
            .chain(self.st_slope.unmapped())
            .collect()
    }
}

/// Aligns patient inputs to a fixed schema.
///
/// Built once per loaded schema and shared read-only across requests.
#[derive(Debug, Clone)]
pub struct FeatureAligner {
    schema: Arc<ExpectedSchema>,
    slots: ColumnSlots,
}

impl FeatureAligner {
    /// Resolve every producible column against `schema`.
    #[must_use]
    pub fn new(schema: Arc<ExpectedSchema>) -> Self {
        let slots = ColumnSlots::resolve(&schema);
        Self { schema, slots }
    }

    #[must_use]
    pub fn schema(&self) -> &Arc<ExpectedSchema> {
        &self.schema
    }

    /// Columns the form can produce that the schema does not contain.
    ///
    /// Inputs that select one of these fail alignment.
    #[must_use]
    pub fn unmapped_columns(&self) -> Vec<&str> {
        self.slots.unmapped()
    }

    /// Build the feature row for `input`.
    ///
    /// Numeric attributes are copied under their column names, the selected
    /// indicator of each categorical field is set to 1 and every other schema
    /// column is 0. The row follows schema order.
    ///
    /// # Errors
    /// Returns `AlignError::SchemaMismatch` if the input produces a column the
    /// schema does not contain.
    pub fn align(&self, input: &PatientInput) -> Result<FeatureRow<'_>, AlignError> {
        self.slots.fill(input, &self.schema)
    }
}

/// One-shot alignment of `input` against `schema`.
///
/// Equivalent to building a [`FeatureAligner`] and aligning once; prefer the
/// aligner when the schema is reused.
///
/// # Errors
/// Returns `AlignError::SchemaMismatch` if the input produces a column the
/// schema does not contain.
pub fn align<'s>(
    input: &PatientInput,
    schema: &'s ExpectedSchema,
) -> Result<FeatureRow<'s>, AlignError> {
    ColumnSlots::resolve(schema).fill(input, schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const TRAINING_COLUMNS: [&str; 20] = [
        "Age",
        "RestingBP",
        "Cholesterol",
        "FastingBS",
        "MaxHR",
        "Oldpeak",
        "Sex_Male",
        "Sex_Female",
        "ChestPainType_ATA",
        "ChestPainType_NAP",
        "ChestPainType_TA",
        "ChestPainType_ASY",
        "RestingECG_Normal",
        "RestingECG_ST",
        "RestingECG_LVH",
        "ExerciseAngina_Yes",
        "ExerciseAngina_No",
        "ST_Slope_Up",
        "ST_Slope_Flat",
        "ST_Slope_Down",
    ];

    fn schema_of(cols: &[&str]) -> ExpectedSchema {
        ExpectedSchema::new(cols.iter().map(|c| c.to_string()).collect()).expect("Valid schema")
    }

    fn training_aligner() -> FeatureAligner {
        FeatureAligner::new(Arc::new(schema_of(&TRAINING_COLUMNS)))
    }

    fn sample_input() -> PatientInput {
        PatientInput {
            age: 40,
            resting_bp: 120,
            cholesterol: 200,
            fasting_bs: false,
            max_hr: 150,
            oldpeak: 1.0,
            sex: Sex::Male,
            chest_pain_type: ChestPainType::Ata,
            resting_ecg: RestingEcg::Normal,
            exercise_angina: ExerciseAngina::No,
            st_slope: StSlope::Up,
        }
    }

    fn all_inputs() -> Vec<PatientInput> {
        let mut inputs = Vec::new();
        for &sex in Sex::ALL {
            for &chest_pain_type in ChestPainType::ALL {
                for &resting_ecg in RestingEcg::ALL {
                    for &exercise_angina in ExerciseAngina::ALL {
                        for &st_slope in StSlope::ALL {
                            for fasting_bs in [false, true] {
                                inputs.push(PatientInput {
                                    fasting_bs,
                                    sex,
                                    chest_pain_type,
                                    resting_ecg,
                                    exercise_angina,
                                    st_slope,
                                    ..sample_input()
                                });
                            }
                        }
                    }
                }
            }
        }
        inputs
    }

    fn hot_count<C: Categorical>(row: &FeatureRow<'_>) -> usize {
        C::ALL
            .iter()
            .filter(|c| row.get(&indicator_name(C::FIELD, c.label())) == Some(1.0))
            .count()
    }

    #[test]
    fn test_reference_example() {
        let aligner = training_aligner();
        let row = aligner.align(&sample_input()).expect("Should align");

        let expected = [
            40.0, 120.0, 200.0, 0.0, 150.0, 1.0, // numeric
            1.0, 0.0, // Sex
            1.0, 0.0, 0.0, 0.0, // ChestPainType
            1.0, 0.0, 0.0, // RestingECG
            0.0, 1.0, // ExerciseAngina
            1.0, 0.0, 0.0, // ST_Slope
        ];
        assert_eq!(row.values(), &expected);
        assert_eq!(row.columns(), aligner.schema().columns());
    }

    #[test]
    fn test_every_combination_matches_schema() {
        let aligner = training_aligner();
        let inputs = all_inputs();
        assert_eq!(inputs.len(), 2 * 4 * 3 * 2 * 3 * 2);

        for input in &inputs {
            let row = aligner.align(input).expect("Should align");
            let names: Vec<&str> = row.iter().map(|(name, _)| name).collect();
            assert_eq!(names, TRAINING_COLUMNS);

            assert_eq!(hot_count::<Sex>(&row), 1);
            assert_eq!(hot_count::<ChestPainType>(&row), 1);
            assert_eq!(hot_count::<RestingEcg>(&row), 1);
            assert_eq!(hot_count::<ExerciseAngina>(&row), 1);
            assert_eq!(hot_count::<StSlope>(&row), 1);

            // Indicators are strictly 0/1.
            for (name, value) in row.iter().skip(NUMERIC_COLUMNS.len()) {
                assert!(value == 0.0 || value == 1.0, "{name} = {value}");
            }
        }
    }

    #[test]
    fn test_free_function_matches_aligner() {
        let schema = schema_of(&TRAINING_COLUMNS);
        let aligner = training_aligner();
        for input in all_inputs() {
            let a = align(&input, &schema).expect("Should align");
            let b = aligner.align(&input).expect("Should align");
            assert_eq!(a.values(), b.values());
        }
    }

    #[test]
    fn test_schema_order_is_respected() {
        let mut reordered = TRAINING_COLUMNS;
        reordered.reverse();
        let schema = schema_of(&reordered);

        let row = align(&sample_input(), &schema).expect("Should align");
        assert_eq!(row.values()[0], 0.0); // ST_Slope_Down
        assert_eq!(row.values()[2], 1.0); // ST_Slope_Up
        assert_eq!(row.values()[19], 40.0); // Age
        assert_eq!(row.get("MaxHR"), Some(150.0));
    }

    #[test]
    fn test_extra_schema_columns_are_zero_filled() {
        let mut cols = TRAINING_COLUMNS.to_vec();
        cols.insert(8, "ChestPainType_Unknown");
        cols.push("Smoker");
        let schema = schema_of(&cols);

        let row = align(&sample_input(), &schema).expect("Should align");
        assert_eq!(row.values().len(), 22);
        assert_eq!(row.get("ChestPainType_Unknown"), Some(0.0));
        assert_eq!(row.get("Smoker"), Some(0.0));
        assert_eq!(row.get("ChestPainType_ATA"), Some(1.0));
    }

    #[test]
    fn test_missing_indicator_is_schema_mismatch() {
        let cols: Vec<&str> = TRAINING_COLUMNS
            .iter()
            .copied()
            .filter(|c| *c != "RestingECG_LVH")
            .collect();
        let aligner = FeatureAligner::new(Arc::new(schema_of(&cols)));
        assert_eq!(aligner.unmapped_columns(), vec!["RestingECG_LVH"]);

        // Inputs that don't select the missing category still align.
        assert!(aligner.align(&sample_input()).is_ok());

        let input = PatientInput {
            resting_ecg: RestingEcg::Lvh,
            ..sample_input()
        };
        assert_eq!(
            aligner.align(&input),
            Err(AlignError::SchemaMismatch {
                unexpected: vec!["RestingECG_LVH".to_string()]
            })
        );
    }

    #[test]
    fn test_missing_numeric_column_is_schema_mismatch() {
        let cols: Vec<&str> = TRAINING_COLUMNS
            .iter()
            .copied()
            .filter(|c| *c != "Oldpeak")
            .collect();
        let schema = schema_of(&cols);

        match align(&sample_input(), &schema) {
            Err(AlignError::SchemaMismatch { unexpected }) => {
                assert_eq!(unexpected, vec!["Oldpeak".to_string()]);
            }
            other => panic!("Expected schema mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_oldpeak_boundaries_pass_through() {
        let aligner = training_aligner();
        for oldpeak in [0.0, 6.0] {
            let input = PatientInput {
                oldpeak,
                ..sample_input()
            };
            let row = aligner.align(&input).expect("Should align");
            assert_eq!(row.get("Oldpeak"), Some(oldpeak));
        }
    }

    fn patient_strategy() -> impl Strategy<Value = PatientInput> {
        let numeric = (
            18u32..=100,
            80u32..=200,
            100u32..=600,
            any::<bool>(),
            60u32..=220,
            0.0f64..=6.0,
        );
        let categorical = (
            prop::sample::select(Sex::ALL),
            prop::sample::select(ChestPainType::ALL),
            prop::sample::select(RestingEcg::ALL),
            prop::sample::select(ExerciseAngina::ALL),
            prop::sample::select(StSlope::ALL),
        );

        (numeric, categorical).prop_map(
            |(
                (age, resting_bp, cholesterol, fasting_bs, max_hr, oldpeak),
                (sex, chest_pain_type, resting_ecg, exercise_angina, st_slope),
            )| PatientInput {
                age,
                resting_bp,
                cholesterol,
                fasting_bs,
                max_hr,
                oldpeak,
                sex,
                chest_pain_type,
                resting_ecg,
                exercise_angina,
                st_slope,
            },
        )
    }

    proptest! {
        #[test]
        fn prop_numeric_values_copied_verbatim(input in patient_strategy()) {
            let aligner = training_aligner();
            let row = aligner.align(&input).expect("Should align");

            for (name, value) in NUMERIC_COLUMNS.iter().zip(input.numeric_values()) {
                prop_assert_eq!(row.get(name), Some(value));
            }
            prop_assert_eq!(row.values().len(), TRAINING_COLUMNS.len());
            let ones = row.values()[NUMERIC_COLUMNS.len()..]
                .iter()
                .filter(|v| **v == 1.0)
                .count();
            prop_assert_eq!(ones, 5);
        }

        #[test]
        fn prop_alignment_is_idempotent(input in patient_strategy()) {
            let aligner = training_aligner();
            let first = aligner.align(&input).expect("Should align");
            let second = aligner.align(&input).expect("Should align");
            prop_assert_eq!(first, second);
        }
    }
}
