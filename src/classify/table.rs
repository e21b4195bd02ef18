//! Trial type table lookup

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{ClassifiedTrial, Resolution, TrialClassifier};
use crate::trial::{Side, TrialRecord, REWARD_SIDE_FIELD};
use crate::value::{FieldValue, TypeMismatch};
use crate::{Error, Result};

/// Requirement a table row places on one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Constraint {
    /// Inclusive interval, tested for containment.
    Range {
        /// Lower bound.
        min: FieldValue,
        /// Upper bound.
        max: FieldValue,
    },
    /// Exact value.
    Value(FieldValue),
}

impl Constraint {
    /// Build an inclusive range constraint.
    #[must_use]
    pub fn range(min: impl Into<FieldValue>, max: impl Into<FieldValue>) -> Self {
        Self::Range {
            min: min.into(),
            max: max.into(),
        }
    }

    /// Test a trial value against the constraint.
    ///
    /// # Errors
    ///
    /// Returns [`TypeMismatch`] if the value cannot be compared with the bound(s).
    pub fn matches(&self, value: &FieldValue) -> std::result::Result<bool, TypeMismatch> {
        match self {
            Self::Value(expected) => expected.try_eq(value),
            Self::Range { min, max } => {
                let above = min.try_cmp(value)?.is_some_and(std::cmp::Ordering::is_le);
                let below = value.try_cmp(max)?.is_some_and(std::cmp::Ordering::is_le);
                Ok(above && below)
            }
        }
    }
}

macro_rules! constraint_from {
    ($($t:ty),*) => {
        $(impl From<$t> for Constraint {
            fn from(value: $t) -> Self {
                Self::Value(value.into())
            }
        })*
    };
}

constraint_from!(FieldValue, i64, i32, f64, &str, String);

/// One named trial type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialTypeRow {
    name: String,
    #[serde(flatten)]
    constraints: BTreeMap<String, Constraint>,
}

impl TrialTypeRow {
    /// Create a row with no constraints.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            constraints: BTreeMap::new(),
        }
    }

    /// Add a constraint on a column.
    #[must_use]
    pub fn with(mut self, column: impl Into<String>, constraint: impl Into<Constraint>) -> Self {
        self.constraints.insert(column.into(), constraint.into());
        self
    }

    /// Get the row name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Constraint on a column.
    #[must_use]
    pub fn constraint(&self, column: &str) -> Option<&Constraint> {
        self.constraints.get(column)
    }
}

/// Ordered table of trial types.
///
/// Row order is display order; a row's index is its type key. Every row
/// constrains every column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTable")]
pub struct TrialTypeTable {
    columns: Vec<String>,
    rows: Vec<TrialTypeRow>,
}

#[derive(Deserialize)]
struct RawTable {
    columns: Vec<String>,
    rows: Vec<TrialTypeRow>,
}

impl TryFrom<RawTable> for TrialTypeTable {
    type Error = Error;

    fn try_from(raw: RawTable) -> Result<Self> {
        Self::new(raw.columns, raw.rows)
    }
}

impl TrialTypeTable {
    /// Create a validated table.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTable`] if there are no rows, or a row leaves a
    /// column unconstrained or constrains an unknown column.
    pub fn new(columns: Vec<String>, rows: Vec<TrialTypeRow>) -> Result<Self> {
        if rows.is_empty() {
            return Err(Error::InvalidTable("table has no rows".to_string()));
        }
        for row in &rows {
            Self::check_row(&columns, row)?;
        }
        Ok(Self { columns, rows })
    }

    fn check_row(columns: &[String], row: &TrialTypeRow) -> Result<()> {
        if let Some(column) = columns.iter().find(|c| !row.constraints.contains_key(*c)) {
            return Err(Error::InvalidTable(format!(
                "row '{}' has no value for column '{column}'",
                row.name
            )));
        }
        if let Some(column) = row.constraints.keys().find(|c| !columns.contains(*c)) {
            return Err(Error::InvalidTable(format!(
                "row '{}' constrains unknown column '{column}'",
                row.name
            )));
        }
        Ok(())
    }

    /// Column names.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows in display order.
    #[must_use]
    pub fn rows(&self) -> &[TrialTypeRow] {
        &self.rows
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Always false for a validated table.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append a row at the end; existing keys are unaffected.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTable`] if the row does not cover the columns.
    pub fn push(&mut self, row: TrialTypeRow) -> Result<()> {
        Self::check_row(&self.columns, &row)?;
        self.rows.push(row);
        Ok(())
    }
}

/// Which trial record field feeds each table column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnMapping(BTreeMap<String, String>);

impl ColumnMapping {
    /// Build from `(column, field)` pairs.
    #[must_use]
    pub fn from_pairs<I, C, F>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (C, F)>,
        C: Into<String>,
        F: Into<String>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(c, f)| (c.into(), f.into()))
                .collect(),
        )
    }

    /// `(column, field)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(c, f)| (c.as_str(), f.as_str()))
    }

    /// Number of mapped columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if no column is mapped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self::from_pairs([
            ("rewside", "rewside"),
            ("srvpos", "servo_pos"),
            ("stppos", "stepper_pos"),
        ])
    }
}

/// Classifies trials by matching their attributes against a [`TrialTypeTable`].
#[derive(Debug, Clone)]
pub struct TableClassifier {
    table: TrialTypeTable,
    mapping: ColumnMapping,
}

impl TableClassifier {
    /// Create a classifier.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTable`] if the mapping is empty or names a
    /// column the table does not have.
    ///
    /// Exact side constraints on the column mapped to `rewside` are stored
    /// in canonical form, so `"L"` and `"left"` match the same trials.
    pub fn new(mut table: TrialTypeTable, mapping: ColumnMapping) -> Result<Self> {
        if mapping.is_empty() {
            return Err(Error::InvalidTable("column mapping is empty".to_string()));
        }
        if let Some((column, _)) = mapping
            .iter()
            .find(|(column, _)| !table.columns.iter().any(|c| c == column))
        {
            return Err(Error::InvalidTable(format!(
                "mapped column '{column}' is not in the table"
            )));
        }
        for (column, _) in mapping.iter().filter(|(_, field)| *field == REWARD_SIDE_FIELD) {
            for row in &mut table.rows {
                if let Some(Constraint::Value(value)) = row.constraints.get_mut(column) {
                    if let Some(side) = Side::from_value(value) {
                        *value = side.into();
                    }
                }
            }
        }
        Ok(Self { table, mapping })
    }

    /// The table.
    #[must_use]
    pub const fn table(&self) -> &TrialTypeTable {
        &self.table
    }

    /// Row indices whose constraints hold for every value in the predicate.
    ///
    /// Every constraint is evaluated; an incomparable value anywhere is a
    /// type mismatch.
    fn candidates(
        &self,
        predicate: &[(&str, Cow<'_, FieldValue>)],
    ) -> std::result::Result<Vec<usize>, TypeMismatch> {
        let mut hits = Vec::new();
        for (idx, row) in self.table.rows.iter().enumerate() {
            let mut all = true;
            for (column, value) in predicate {
                let ok = match row.constraint(column) {
                    Some(constraint) => constraint.matches(value)?,
                    None => false,
                };
                all &= ok;
            }
            if all {
                hits.push(idx);
            }
        }
        Ok(hits)
    }
}

fn canonical_side(value: &FieldValue) -> Cow<'_, FieldValue> {
    Side::from_value(value).map_or(Cow::Borrowed(value), |side| Cow::Owned(side.into()))
}

impl TrialClassifier for TableClassifier {
    fn classify(&self, record: &TrialRecord) -> ClassifiedTrial {
        let mut missing = Vec::new();
        let mut predicate = Vec::with_capacity(self.mapping.len());
        for (column, field) in self.mapping.iter() {
            match record.field(field) {
                Some(value) if field == REWARD_SIDE_FIELD => {
                    predicate.push((column, canonical_side(value)));
                }
                Some(value) => predicate.push((column, Cow::Borrowed(value))),
                None => missing.push(column.to_string()),
            }
        }

        let resolution = match self.candidates(&predicate) {
            Err(_) => Resolution::TypeMismatch,
            Ok(hits) => match hits.as_slice() {
                [] => Resolution::NoMatch,
                [key] => Resolution::Unique(*key),
                [key, ..] => Resolution::Ambiguous {
                    key: *key,
                    candidates: hits.len(),
                },
            },
        };

        ClassifiedTrial {
            resolution,
            missing,
        }
    }

    fn type_names(&self) -> Vec<String> {
        self.table.rows.iter().map(|r| r.name.clone()).collect()
    }
}
