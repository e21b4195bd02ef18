//! Trial records as delivered by the trial record source
//!
//! ## Shape
//!
//! ```text
//! TrialSnapshot
//!   ├── records:  [TrialRecord]      one per trial, in trial order
//!   └── segments: [[raw line]]       the log lines of each trial
//! ```
//!
//! The last record may still be in progress ([`Outcome::Current`]).

pub mod trialspeak;

use std::fmt;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::value::FieldValue;

/// Field holding the reward side of a trial.
pub const REWARD_SIDE_FIELD: &str = "rewside";

/// Result of a trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// Correct response.
    Hit,
    /// Incorrect response.
    Error,
    /// No usable response.
    Spoil,
    /// Trial still in progress.
    Current,
}

impl Outcome {
    /// All outcomes in display order.
    pub const ALL: [Self; 4] = [Self::Hit, Self::Error, Self::Spoil, Self::Current];

    /// Lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hit => "hit",
            Self::Error => "error",
            Self::Spoil => "spoil",
            Self::Current => "current",
        }
    }

    /// Whether the trial has finished.
    #[must_use]
    pub const fn is_resolved(self) -> bool {
        !matches!(self, Self::Current)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reward side of a trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Left port.
    Left,
    /// Right port.
    Right,
}

impl Side {
    /// Lowercase name, also the text stored in the `rewside` field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }

    /// Read a side from a field value (`"L"`, `"left"`, `"R"`, `"right"`, any case).
    #[must_use]
    pub fn from_value(value: &FieldValue) -> Option<Self> {
        let text = value.as_text()?;
        if text.eq_ignore_ascii_case("l") || text.eq_ignore_ascii_case("left") {
            Some(Self::Left)
        } else if text.eq_ignore_ascii_case("r") || text.eq_ignore_ascii_case("right") {
            Some(Self::Right)
        } else {
            None
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Side> for FieldValue {
    fn from(side: Side) -> Self {
        Self::Text(side.as_str().to_string())
    }
}

/// One trial reconstructed from the log.
///
/// The field set is whatever the record source reports; an absent field is
/// missing data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    outcome: Outcome,
    bad: bool,
    fields: FxHashMap<String, FieldValue>,
}

impl TrialRecord {
    /// Create a record with no attributes.
    #[must_use]
    pub fn new(outcome: Outcome) -> Self {
        Self {
            outcome,
            bad: false,
            fields: FxHashMap::default(),
        }
    }

    /// Create a builder for a record with attributes.
    #[must_use]
    pub fn builder(outcome: Outcome) -> TrialRecordBuilder {
        TrialRecordBuilder::new(outcome)
    }

    /// Get the outcome.
    #[must_use]
    pub const fn outcome(&self) -> Outcome {
        self.outcome
    }

    /// Whether the trial is excluded from the unforced tallies.
    #[must_use]
    pub const fn is_bad(&self) -> bool {
        self.bad
    }

    /// Get an attribute by field name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// All attributes.
    #[must_use]
    pub const fn fields(&self) -> &FxHashMap<String, FieldValue> {
        &self.fields
    }

    /// Reward side, read from the `rewside` field.
    #[must_use]
    pub fn reward_side(&self) -> Option<Side> {
        self.field(REWARD_SIDE_FIELD).and_then(Side::from_value)
    }

    /// Set an attribute.
    pub fn set_field(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Mark the trial bad (or not).
    pub fn set_bad(&mut self, bad: bool) {
        self.bad = bad;
    }

    /// Set the outcome.
    pub fn set_outcome(&mut self, outcome: Outcome) {
        self.outcome = outcome;
    }
}

/// Builder for `TrialRecord`.
#[derive(Debug)]
pub struct TrialRecordBuilder {
    record: TrialRecord,
}

impl TrialRecordBuilder {
    /// Create a new builder with the required outcome.
    #[must_use]
    pub fn new(outcome: Outcome) -> Self {
        Self {
            record: TrialRecord::new(outcome),
        }
    }

    /// Add an attribute.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.record.set_field(name, value);
        self
    }

    /// Set the reward side.
    #[must_use]
    pub fn reward_side(self, side: Side) -> Self {
        self.field(REWARD_SIDE_FIELD, side)
    }

    /// Mark the trial bad.
    #[must_use]
    pub const fn bad(mut self, bad: bool) -> Self {
        self.record.bad = bad;
        self
    }

    /// Build the `TrialRecord`.
    #[must_use]
    pub fn build(self) -> TrialRecord {
        self.record
    }
}

/// A consistent view of every trial seen so far.
///
/// `segments[i]` holds the raw log lines of `records[i]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrialSnapshot {
    records: Vec<TrialRecord>,
    segments: Vec<Vec<String>>,
}

impl TrialSnapshot {
    /// Create a snapshot from records and their raw line segments.
    #[must_use]
    pub const fn new(records: Vec<TrialRecord>, segments: Vec<Vec<String>>) -> Self {
        Self { records, segments }
    }

    /// Create a snapshot without raw lines (reward tally will be empty).
    #[must_use]
    pub const fn from_records(records: Vec<TrialRecord>) -> Self {
        Self {
            records,
            segments: Vec::new(),
        }
    }

    /// Trial records in trial order.
    #[must_use]
    pub fn records(&self) -> &[TrialRecord] {
        &self.records
    }

    /// Raw per-trial line groups.
    #[must_use]
    pub fn segments(&self) -> &[Vec<String>] {
        &self.segments
    }

    /// Number of trials.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if no trial has been seen yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Reward side of each trial, by position.
    #[must_use]
    pub fn reward_sides(&self) -> Vec<Option<Side>> {
        self.records.iter().map(TrialRecord::reward_side).collect()
    }
}
