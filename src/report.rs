//! Plain-data views for display layers
//!
//! Nothing here knows about windows or figures: labels and titles are
//! strings, plot series are index lists.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::ops::Range;

use serde::Serialize;

use crate::aggregate::{HitCount, PerformanceTallies};
use crate::classify::TypeKey;
use crate::reward::RewardTally;
use crate::trial::{Outcome, Side, TrialRecord};

/// `"hits/total=ratio"` with two decimals, e.g. `"3/4=0.75"`.
#[must_use]
pub fn format_perf(count: HitCount) -> String {
    format!("{}/{}={}", count.hits, count.total, format_ratio(count))
}

/// Hit ratio with two decimals; `"0.00"` when there are no trials.
#[must_use]
pub fn format_ratio(count: HitCount) -> String {
    format!("{:.2}", count.ratio())
}

fn push_section(label: &mut String, section: &str, count: Option<&HitCount>) {
    let Some(count) = count else {
        return;
    };
    let _ = write!(label, " {section}:{:03}/{:03}", count.hits, count.total);
    if count.total > 0 {
        let _ = write!(label, "={}", format_ratio(*count));
    }
    label.push('.');
}

/// One label per type: `"<name>: Unforced:003/004=0.75. All:003/005=0.60."`.
///
/// A section is left out when its tally has no entry for the type.
#[must_use]
pub fn type_labels(type_names: &[String], tallies: &PerformanceTallies) -> Vec<String> {
    type_names
        .iter()
        .enumerate()
        .map(|(key, name)| {
            let mut label = format!("{name}:");
            push_section(&mut label, "Unforced", tallies.by_type_unforced.get(&key));
            push_section(&mut label, "All", tallies.by_type_all.get(&key));
            label
        })
        .collect()
}

/// Three-line summary: reward totals, unforced per side, all per side.
#[must_use]
pub fn title(rewards: &RewardTally, tallies: &PerformanceTallies) -> String {
    let mut out = format!(
        "{} rewards L; {} rewards R;\nUF: ",
        rewards.left_total, rewards.right_total
    );
    if let Some(count) = tallies.by_side_unforced.get(&Side::Left) {
        let _ = write!(out, "L: {}; ", format_perf(*count));
    }
    if let Some(count) = tallies.by_side_unforced.get(&Side::Right) {
        let _ = write!(out, "R: {};", format_perf(*count));
    }
    out.push_str("\nAll: ");
    if let Some(count) = tallies.by_side_all.get(&Side::Left) {
        let _ = write!(out, "L_A: {}; ", format_perf(*count));
    }
    if let Some(count) = tallies.by_side_all.get(&Side::Right) {
        let _ = write!(out, "R_A: {}", format_perf(*count));
    }
    out
}

/// Points for a trial-by-type scatter plot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlotSeries {
    /// `(trial index, type key)` per outcome.
    pub by_outcome: BTreeMap<Outcome, Vec<(usize, TypeKey)>>,
    /// `(trial index, type key)` of bad trials.
    pub bad: Vec<(usize, TypeKey)>,
    /// Trailing window of trial indices to show.
    pub window: Range<usize>,
}

/// Build plot points; trials without a key are left out.
#[must_use]
pub fn plot_series(
    records: &[TrialRecord],
    keys: &[Option<TypeKey>],
    window: usize,
) -> PlotSeries {
    let mut series = PlotSeries {
        window: records.len().saturating_sub(window)..records.len(),
        ..PlotSeries::default()
    };
    for (trial, (record, key)) in records.iter().zip(keys).enumerate() {
        let Some(key) = *key else {
            continue;
        };
        series
            .by_outcome
            .entry(record.outcome())
            .or_default()
            .push((trial, key));
        if record.is_bad() {
            series.bad.push((trial, key));
        }
    }
    series
}
