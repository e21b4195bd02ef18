//! Property-based tests for trialwatch
//!
//! - Test tally invariants over random trial sequences
//! - Run with ProptestConfig::with_cases(100)

use proptest::prelude::*;
use trialwatch::aggregate::aggregate;
use trialwatch::classify::{classify_all, IdentityClassifier};
use trialwatch::trial::{Outcome, Side, TrialRecord};

const N_STIMULI: usize = 4;

// ============================================================================
// Property Test Generators (Strategies)
// ============================================================================

fn arb_outcome() -> impl Strategy<Value = Outcome> {
    prop_oneof![
        Just(Outcome::Hit),
        Just(Outcome::Error),
        Just(Outcome::Spoil),
        Just(Outcome::Current),
    ]
}

fn arb_side() -> impl Strategy<Value = Option<Side>> {
    prop_oneof![Just(None), Just(Some(Side::Left)), Just(Some(Side::Right))]
}

/// Generate one trial with a valid stimulus number
fn arb_trial() -> impl Strategy<Value = TrialRecord> {
    (arb_outcome(), arb_side(), any::<bool>(), 0..N_STIMULI).prop_map(
        |(outcome, side, bad, stim)| {
            let mut builder = TrialRecord::builder(outcome)
                .field("stim_number", stim)
                .bad(bad);
            if let Some(side) = side {
                builder = builder.reward_side(side);
            }
            builder.build()
        },
    )
}

fn arb_session(max_trials: usize) -> impl Strategy<Value = Vec<TrialRecord>> {
    proptest::collection::vec(arb_trial(), 0..max_trials)
}

fn classify(records: &[TrialRecord]) -> Vec<Option<usize>> {
    let classifier = IdentityClassifier::new("stim_number", N_STIMULI);
    let (keys, _) = classify_all(&classifier, records).into_keys().unwrap();
    keys
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: recomputing from the same records yields the same tallies
    #[test]
    fn prop_refresh_is_idempotent(records in arb_session(60)) {
        let first = aggregate(&records, &classify(&records));
        let second = aggregate(&records, &classify(&records));
        prop_assert_eq!(first, second);
    }

    /// Property: every unforced tally is bounded by its "all" counterpart
    #[test]
    fn prop_all_dominates_unforced(records in arb_session(60)) {
        let tallies = aggregate(&records, &classify(&records));
        for (key, unforced) in &tallies.by_type_unforced {
            let all = tallies.type_all(*key);
            prop_assert!(unforced.total <= all.total);
            prop_assert!(unforced.hits <= all.hits);
        }
        for side in [Side::Left, Side::Right] {
            prop_assert!(tallies.side_unforced(side).total <= tallies.side_all(side).total);
        }
    }

    /// Property: ratios stay within [0, 1]
    #[test]
    fn prop_ratio_in_unit_interval(records in arb_session(60)) {
        let tallies = aggregate(&records, &classify(&records));
        for count in tallies.by_type_all.values().chain(tallies.by_side_all.values()) {
            prop_assert!(count.hits <= count.total);
            let ratio = count.ratio();
            prop_assert!((0.0..=1.0).contains(&ratio));
        }
        prop_assert!((0.0..=1.0).contains(&tallies.unforced_total.ratio()));
    }

    /// Property: by-type "all" totals account for every resolved trial
    #[test]
    fn prop_type_totals_cover_resolved_trials(records in arb_session(60)) {
        let tallies = aggregate(&records, &classify(&records));
        let resolved = records.iter().filter(|r| r.outcome().is_resolved()).count();
        let counted: usize = tallies.by_type_all.values().map(|c| c.total).sum();
        prop_assert_eq!(counted, resolved);

        let raw: usize = tallies.trial_counts.values().sum();
        prop_assert_eq!(raw, records.len());
    }

    /// Property: trial order does not change tallies
    #[test]
    fn prop_tallies_ignore_order(records in arb_session(40)) {
        let mut reversed = records.clone();
        reversed.reverse();

        prop_assert_eq!(
            aggregate(&records, &classify(&records)),
            aggregate(&reversed, &classify(&reversed))
        );
    }
}
