//! Stimulus-number scheme: the type key is read straight off the trial.

use super::{ClassifiedTrial, Resolution, TrialClassifier};
use crate::trial::TrialRecord;
use crate::value::FieldValue;

/// Uses an integer attribute as the type key.
///
/// Stimuli alternate sides starting with left, so even keys are named
/// `LEFT n` and odd keys `RIGHT n`. Keys at or beyond `n_stimuli` have no
/// name and do not match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityClassifier {
    field: String,
    n_stimuli: usize,
}

impl IdentityClassifier {
    /// Create a classifier reading `field`, with `n_stimuli` types.
    #[must_use]
    pub fn new(field: impl Into<String>, n_stimuli: usize) -> Self {
        Self {
            field: field.into(),
            n_stimuli,
        }
    }

    /// Field holding the stimulus number.
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Number of stimulus types.
    #[must_use]
    pub const fn n_stimuli(&self) -> usize {
        self.n_stimuli
    }

    fn resolve(&self, value: &FieldValue) -> Resolution {
        match value.as_index() {
            Some(key) if key < self.n_stimuli => Resolution::Unique(key),
            Some(_) => Resolution::NoMatch,
            None if matches!(value, FieldValue::Text(_)) => Resolution::TypeMismatch,
            None => Resolution::NoMatch,
        }
    }
}

impl TrialClassifier for IdentityClassifier {
    fn classify(&self, record: &TrialRecord) -> ClassifiedTrial {
        match record.field(&self.field) {
            Some(value) => ClassifiedTrial {
                resolution: self.resolve(value),
                missing: Vec::new(),
            },
            None => ClassifiedTrial {
                resolution: Resolution::NoMatch,
                missing: vec![self.field.clone()],
            },
        }
    }

    fn type_names(&self) -> Vec<String> {
        (0..self.n_stimuli)
            .map(|sn| {
                let side = if sn % 2 == 0 { "LEFT" } else { "RIGHT" };
                format!("{side} {sn}")
            })
            .collect()
    }
}
