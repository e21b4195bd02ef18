//! Performance tallies
//!
//! Four independent tallies are built from one classified trial sequence:
//!
//! ```text
//!                by type key      by reward side
//! unforced   by_type_unforced   by_side_unforced     (bad trials dropped)
//! all        by_type_all        by_side_all
//! ```
//!
//! Each maps a key to a [`HitCount`]. In-progress trials never enter a
//! hit count; they only show up in [`PerformanceTallies::trial_counts`].
//!
//! Tallies are rebuilt from scratch on every refresh. [`TallyAccumulator`]
//! is the explicit fold used to build them.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::classify::TypeKey;
use crate::trial::{Outcome, Side, TrialRecord};

/// Hits out of resolved trials.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HitCount {
    /// Trials with outcome `hit`.
    pub hits: usize,
    /// Trials with any resolved outcome.
    pub total: usize,
}

impl HitCount {
    /// Create a count.
    #[must_use]
    pub const fn new(hits: usize, total: usize) -> Self {
        Self { hits, total }
    }

    /// Fraction of hits; 0 when there are no trials.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.hits as f64 / self.total as f64
        }
    }

    /// Count one resolved outcome.
    pub fn add(&mut self, outcome: Outcome) {
        self.total += 1;
        if outcome == Outcome::Hit {
            self.hits += 1;
        }
    }
}

/// Hit counts keyed by type key or side.
pub type Tally<K> = BTreeMap<K, HitCount>;

/// All tallies of one refresh cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PerformanceTallies {
    /// By type, bad trials excluded.
    pub by_type_unforced: Tally<TypeKey>,
    /// By type, every trial.
    pub by_type_all: Tally<TypeKey>,
    /// By reward side, bad trials excluded.
    pub by_side_unforced: Tally<Side>,
    /// By reward side, every trial.
    pub by_side_all: Tally<Side>,
    /// Every unforced resolved trial.
    pub unforced_total: HitCount,
    /// Raw number of trials per type, in-progress trials included.
    pub trial_counts: BTreeMap<TypeKey, usize>,
}

impl PerformanceTallies {
    /// Unforced count for a type (zero if never seen).
    #[must_use]
    pub fn type_unforced(&self, key: TypeKey) -> HitCount {
        self.by_type_unforced.get(&key).copied().unwrap_or_default()
    }

    /// All-trials count for a type (zero if never seen).
    #[must_use]
    pub fn type_all(&self, key: TypeKey) -> HitCount {
        self.by_type_all.get(&key).copied().unwrap_or_default()
    }

    /// Unforced count for a side (zero if never seen).
    #[must_use]
    pub fn side_unforced(&self, side: Side) -> HitCount {
        self.by_side_unforced.get(&side).copied().unwrap_or_default()
    }

    /// All-trials count for a side (zero if never seen).
    #[must_use]
    pub fn side_all(&self, side: Side) -> HitCount {
        self.by_side_all.get(&side).copied().unwrap_or_default()
    }
}

/// Fold state for building [`PerformanceTallies`] one trial at a time.
#[derive(Debug, Clone, Default)]
pub struct TallyAccumulator {
    tallies: PerformanceTallies,
}

impl TallyAccumulator {
    /// Start from empty tallies.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one trial with its assigned type key.
    #[must_use]
    pub fn fold(mut self, record: &TrialRecord, key: Option<TypeKey>) -> Self {
        let t = &mut self.tallies;
        if let Some(key) = key {
            *t.trial_counts.entry(key).or_default() += 1;
        }

        let outcome = record.outcome();
        if !outcome.is_resolved() {
            return self;
        }
        let unforced = !record.is_bad();
        let side = record.reward_side();

        if let Some(key) = key {
            t.by_type_all.entry(key).or_default().add(outcome);
            if unforced {
                t.by_type_unforced.entry(key).or_default().add(outcome);
            }
        }
        if let Some(side) = side {
            t.by_side_all.entry(side).or_default().add(outcome);
            if unforced {
                t.by_side_unforced.entry(side).or_default().add(outcome);
            }
        }
        if unforced {
            t.unforced_total.add(outcome);
        }
        self
    }

    /// Finished tallies.
    #[must_use]
    pub fn finish(self) -> PerformanceTallies {
        self.tallies
    }
}

/// Build tallies from records and their type keys, paired by position.
#[must_use]
pub fn aggregate(records: &[TrialRecord], keys: &[Option<TypeKey>]) -> PerformanceTallies {
    records
        .iter()
        .zip(keys)
        .fold(TallyAccumulator::new(), |acc, (record, key)| {
            acc.fold(record, *key)
        })
        .finish()
}
