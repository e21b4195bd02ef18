//! Trial type classification
//!
//! A classifier maps one [`TrialRecord`] to one type key. Two schemes exist:
//!
//! - [`TableClassifier`]: looks the trial up in a [`TrialTypeTable`] using a
//!   partial, possibly ambiguous attribute set.
//! - [`IdentityClassifier`]: the type key is an attribute already holding a
//!   small integer (stimulus number).
//!
//! Both sit behind [`TrialClassifier`]; [`Classifier`] selects one at
//! configuration time.
//!
//! ## Batch policy
//!
//! [`classify_all`] runs a classifier over every record and collects per-trial
//! problems into a [`WarningLog`] instead of reporting them inline. A trial
//! with a type mismatch is treated as unmatched. Any unmatched trial makes
//! [`Classification::into_keys`] fail, except a trailing in-progress trial,
//! which may be torn and is left without a key.

mod identity;
mod table;

pub use identity::IdentityClassifier;
pub use table::{ColumnMapping, Constraint, TableClassifier, TrialTypeRow, TrialTypeTable};

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use tracing::{debug, warn};

use crate::trial::TrialRecord;
use crate::{Error, Result};

/// Key a trial is classified under: a table row index or a stimulus number.
pub type TypeKey = usize;

/// How a single trial resolved against the classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Exactly one candidate.
    Unique(TypeKey),
    /// Several candidates; the first in table order was taken.
    Ambiguous {
        /// Chosen key (lowest candidate).
        key: TypeKey,
        /// Number of candidates.
        candidates: usize,
    },
    /// No candidate.
    NoMatch,
    /// Values could not be compared.
    TypeMismatch,
}

/// Result of classifying one trial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedTrial {
    /// How the trial resolved.
    pub resolution: Resolution,
    /// Discriminating columns the record had no value for.
    pub missing: Vec<String>,
}

impl ClassifiedTrial {
    /// Assigned key, if the trial resolved.
    #[must_use]
    pub const fn key(&self) -> Option<TypeKey> {
        match self.resolution {
            Resolution::Unique(key) | Resolution::Ambiguous { key, .. } => Some(key),
            Resolution::NoMatch | Resolution::TypeMismatch => None,
        }
    }
}

/// Capability pair shared by every classification scheme.
pub trait TrialClassifier {
    /// Classify a single trial.
    fn classify(&self, record: &TrialRecord) -> ClassifiedTrial;

    /// Display name of each type key, in key order.
    fn type_names(&self) -> Vec<String>;
}

/// Classification scheme chosen at configuration time.
#[derive(Debug, Clone)]
pub enum Classifier {
    /// Trial type table lookup.
    Table(TableClassifier),
    /// Attribute value used directly as the type key.
    Identity(IdentityClassifier),
}

impl TrialClassifier for Classifier {
    fn classify(&self, record: &TrialRecord) -> ClassifiedTrial {
        match self {
            Self::Table(c) => c.classify(record),
            Self::Identity(c) => c.classify(record),
        }
    }

    fn type_names(&self) -> Vec<String> {
        match self {
            Self::Table(c) => c.type_names(),
            Self::Identity(c) => c.type_names(),
        }
    }
}

impl From<TableClassifier> for Classifier {
    fn from(classifier: TableClassifier) -> Self {
        Self::Table(classifier)
    }
}

impl From<IdentityClassifier> for Classifier {
    fn from(classifier: IdentityClassifier) -> Self {
        Self::Identity(classifier)
    }
}

/// Category of a per-trial classification problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// Some discriminating attributes were absent.
    MissingData,
    /// Values of incompatible kinds were compared.
    TypeError,
    /// More than one type matched.
    MultipleMatch,
    /// No type matched.
    NoMatch,
}

impl WarningKind {
    /// All kinds in reporting order.
    pub const ALL: [Self; 4] = [
        Self::TypeError,
        Self::MissingData,
        Self::NoMatch,
        Self::MultipleMatch,
    ];

    /// Whether this kind aborts the refresh cycle.
    #[must_use]
    pub const fn is_fatal(self) -> bool {
        matches!(self, Self::NoMatch)
    }

    /// Operator-facing description.
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::MissingData => "missing data",
            Self::TypeError => "type error in match",
            Self::MultipleMatch => "multiple matches",
            Self::NoMatch => "no match",
        }
    }
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// One warning category and the trials it affected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    /// Category.
    pub kind: WarningKind,
    /// Affected trial indices, ascending.
    pub trials: Vec<usize>,
}

/// Per-cycle collection of classification warnings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WarningLog {
    by_kind: BTreeMap<WarningKind, Vec<usize>>,
}

impl WarningLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a trial under a category.
    pub fn record(&mut self, kind: WarningKind, trial: usize) {
        self.by_kind.entry(kind).or_default().push(trial);
    }

    /// Trials recorded under a category.
    #[must_use]
    pub fn trials(&self, kind: WarningKind) -> &[usize] {
        self.by_kind.get(&kind).map_or(&[][..], Vec::as_slice)
    }

    /// Check if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_kind.is_empty()
    }

    /// Whether any recorded category aborts the cycle.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        self.by_kind.keys().any(|kind| kind.is_fatal())
    }

    /// Non-empty categories in reporting order.
    #[must_use]
    pub fn warnings(&self) -> Vec<Warning> {
        WarningKind::ALL
            .iter()
            .filter_map(|&kind| {
                self.by_kind.get(&kind).map(|trials| Warning {
                    kind,
                    trials: trials.clone(),
                })
            })
            .collect()
    }

    /// Log every non-empty category once.
    pub fn emit(&self) {
        for warning in self.warnings() {
            warn!(
                kind = %warning.kind,
                count = warning.trials.len(),
                trials = ?warning.trials,
                "trial classification problem"
            );
        }
    }
}

/// Classification of a whole trial sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    keys: Vec<Option<TypeKey>>,
    warnings: WarningLog,
}

impl Classification {
    /// Assigned key per trial; `None` where no type matched.
    #[must_use]
    pub fn keys(&self) -> &[Option<TypeKey>] {
        &self.keys
    }

    /// Warnings gathered over the batch.
    #[must_use]
    pub const fn warnings(&self) -> &WarningLog {
        &self.warnings
    }

    /// Resolve to one key per trial.
    ///
    /// Only a trailing in-progress trial can be left as `None`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unclassified`] if any trial matched no type.
    pub fn into_keys(self) -> Result<(Vec<Option<TypeKey>>, WarningLog)> {
        if self.warnings.is_fatal() {
            return Err(Error::Unclassified {
                no_match: self.warnings.trials(WarningKind::NoMatch).to_vec(),
                type_error: self.warnings.trials(WarningKind::TypeError).to_vec(),
            });
        }
        Ok((self.keys, self.warnings))
    }
}

/// Classify every record in trial order.
pub fn classify_all<C>(classifier: &C, records: &[TrialRecord]) -> Classification
where
    C: TrialClassifier + ?Sized,
{
    let mut warnings = WarningLog::new();
    let keys = records
        .iter()
        .enumerate()
        .map(|(trial, record)| {
            let classified = classifier.classify(record);
            if !classified.missing.is_empty() {
                warnings.record(WarningKind::MissingData, trial);
            }
            let torn_tail = trial + 1 == records.len() && !record.outcome().is_resolved();
            if torn_tail && classified.key().is_none() {
                debug!(trial, "in-progress trial not classifiable yet");
                return None;
            }
            match classified.resolution {
                Resolution::Unique(_) => {}
                Resolution::Ambiguous { .. } => warnings.record(WarningKind::MultipleMatch, trial),
                Resolution::NoMatch => warnings.record(WarningKind::NoMatch, trial),
                Resolution::TypeMismatch => {
                    warnings.record(WarningKind::TypeError, trial);
                    warnings.record(WarningKind::NoMatch, trial);
                }
            }
            classified.key()
        })
        .collect();

    Classification { keys, warnings }
}
