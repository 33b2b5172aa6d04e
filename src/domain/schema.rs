//! Expected column schema and the aligned feature row.
//!
//! The schema is the ordered list of column names the classifier was trained
//! on. It is loaded once and never mutated; feature rows borrow it.

use std::collections::HashMap;

/// Errors raised while building a schema or a row over it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("Schema contains no columns")]
    Empty,

    #[error("Schema column {0} has a blank name")]
    Blank(usize),

    #[error("Schema column '{0}' appears more than once")]
    Duplicate(String),

    #[error("Row length mismatch: schema has {expected} columns, got {got} values")]
    LengthMismatch { expected: usize, got: usize },
}

/// Ordered, duplicate-free list of column names established at training time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedSchema {
    columns: Vec<String>,
    positions: HashMap<String, usize>,
}

impl ExpectedSchema {
    /// Build a schema from column names in model input order.
    ///
    /// # Errors
    /// Returns error if the list is empty, or contains blank or duplicate names.
    pub fn new(columns: Vec<String>) -> Result<Self, SchemaError> {
        if columns.is_empty() {
            return Err(SchemaError::Empty);
        }

        let mut positions = HashMap::with_capacity(columns.len());
        for (i, name) in columns.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(SchemaError::Blank(i));
            }
            if positions.insert(name.clone(), i).is_some() {
                return Err(SchemaError::Duplicate(name.clone()));
            }
        }

        Ok(Self { columns, positions })
    }

    /// Column names in order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Position of a column, if the schema has it.
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether the schema has no columns. Construction rejects empty schemas.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// A numeric row holding exactly one value per schema column, in schema order.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow<'s> {
    schema: &'s ExpectedSchema,
    values: Vec<f64>,
}

impl<'s> FeatureRow<'s> {
    /// Row of zeros over `schema`.
    #[must_use]
    pub fn zeros(schema: &'s ExpectedSchema) -> Self {
        Self {
            schema,
            values: vec![0.0; schema.len()],
        }
    }

    /// Row over `schema` with the given values.
    ///
    /// # Errors
    /// Returns `SchemaError::LengthMismatch` if `values` does not have one entry per column.
    pub fn from_values(schema: &'s ExpectedSchema, values: Vec<f64>) -> Result<Self, SchemaError> {
        if values.len() != schema.len() {
            return Err(SchemaError::LengthMismatch {
                expected: schema.len(),
                got: values.len(),
            });
        }
        Ok(Self { schema, values })
    }

    /// New row over the same schema.
    ///
    /// # Errors
    /// Returns `SchemaError::LengthMismatch` if `values` does not have one entry per column.
    pub fn with_values(&self, values: Vec<f64>) -> Result<FeatureRow<'s>, SchemaError> {
        Self::from_values(self.schema, values)
    }

    #[must_use]
    pub fn schema(&self) -> &'s ExpectedSchema {
        self.schema
    }

    #[must_use]
    pub fn columns(&self) -> &'s [String] {
        self.schema.columns()
    }

    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Value of a column by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.schema.position(name).map(|i| self.values[i])
    }

    /// `(column, value)` pairs in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.schema
            .columns()
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }

    pub(crate) fn set(&mut self, position: usize, value: f64) {
        self.values[position] = value;
    }
}
