//! Reward event counting over raw log lines
//!
//! Rewards are counted from the raw lines of each trial, not from the trial
//! record. Grand totals are attributed by the trial's recorded reward side:
//! a left-side trial contributes its left-marker count to the left total,
//! whatever other markers its lines contain.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::trial::trialspeak::line_timestamp;
use crate::trial::Side;

/// Substring tokens identifying reward lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardMarkers {
    /// Left reward token.
    pub left: String,
    /// Right reward token.
    pub right: String,
}

impl Default for RewardMarkers {
    fn default() -> Self {
        Self {
            left: "EVENT REWARD_L".to_string(),
            right: "EVENT REWARD_R".to_string(),
        }
    }
}

impl RewardMarkers {
    /// Side of the reward a line reports, if any.
    #[must_use]
    pub fn side_of(&self, line: &str) -> Option<Side> {
        if line.contains(&self.left) {
            Some(Side::Left)
        } else if line.contains(&self.right) {
            Some(Side::Right)
        } else {
            None
        }
    }

    /// Count reward lines in one trial's segment.
    #[must_use]
    pub fn count<S: AsRef<str>>(&self, segment: &[S]) -> RewardCounts {
        segment
            .iter()
            .fold(RewardCounts::default(), |mut counts, line| {
                match self.side_of(line.as_ref()) {
                    Some(Side::Left) => counts.left += 1,
                    Some(Side::Right) => counts.right += 1,
                    None => {}
                }
                counts
            })
    }
}

/// Reward lines of one trial, per side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RewardCounts {
    /// Left marker lines.
    pub left: usize,
    /// Right marker lines.
    pub right: usize,
}

impl RewardCounts {
    /// Both sides together.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.left + self.right
    }
}

/// Reward counts per trial and side-attributed totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RewardTally {
    /// Counts aligned with trial position.
    pub per_trial: Vec<RewardCounts>,
    /// Left rewards on left-side trials.
    pub left_total: usize,
    /// Right rewards on right-side trials.
    pub right_total: usize,
}

/// Count rewards per trial and total them by each trial's reward side.
///
/// `sides[i]` is the reward side of the trial whose lines are `segments[i]`.
/// Trials without a side count per trial but not toward a total.
#[must_use]
pub fn tally_rewards<S: AsRef<str>>(
    segments: &[Vec<S>],
    sides: &[Option<Side>],
    markers: &RewardMarkers,
) -> RewardTally {
    let per_trial: Vec<RewardCounts> = segments.iter().map(|s| markers.count(s)).collect();

    let mut tally = RewardTally::default();
    for (counts, side) in per_trial.iter().zip(sides) {
        match side {
            Some(Side::Left) => tally.left_total += counts.left,
            Some(Side::Right) => tally.right_total += counts.right,
            None => {}
        }
    }
    tally.per_trial = per_trial;
    tally
}

/// Rewards per side over wall-clock time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RewardTimeline {
    /// Bin width in seconds.
    pub bin_secs: u64,
    /// Left rewards per bin, starting at time zero.
    pub left: Vec<usize>,
    /// Right rewards per bin.
    pub right: Vec<usize>,
}

impl RewardTimeline {
    /// Start time (s) of each bin.
    #[must_use]
    pub fn bin_starts(&self) -> Vec<u64> {
        (0..self.left.len() as u64).map(|i| i.saturating_mul(self.bin_secs)).collect()
    }
}

/// Latest reward timestamp (ms) placed on the timeline: seven days.
///
/// Later timestamps come from garbled lines and are dropped.
pub const MAX_SESSION_MS: u64 = 7 * 24 * 60 * 60 * 1000;

/// Bin reward lines by their leading millisecond timestamp.
///
/// Bins run from time zero up to the bin holding the last reward; no
/// trailing empty bin is added. With no reward lines there is a single
/// empty bin. Reward lines stamped after [`MAX_SESSION_MS`] are skipped.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn reward_timeline<S: AsRef<str>>(
    lines: &[S],
    markers: &RewardMarkers,
    bin_secs: u64,
) -> RewardTimeline {
    let bin_secs = bin_secs.max(1);
    let width_ms = bin_secs.saturating_mul(1000);

    let mut dropped = 0usize;
    let events: Vec<(Side, u64)> = lines
        .iter()
        .filter_map(|line| {
            let line = line.as_ref();
            Some((markers.side_of(line)?, line_timestamp(line)?))
        })
        .filter(|&(_, ts)| {
            let keep = ts <= MAX_SESSION_MS;
            dropped += usize::from(!keep);
            keep
        })
        .collect();
    if dropped > 0 {
        warn!(dropped, max_ms = MAX_SESSION_MS, "reward lines with out-of-range timestamps");
    }

    let n_bins = events
        .iter()
        .map(|&(_, ts)| ts / width_ms)
        .max()
        .map_or(1, |last| last as usize + 1);

    let mut timeline = RewardTimeline {
        bin_secs,
        left: vec![0; n_bins],
        right: vec![0; n_bins],
    };
    for (side, ts) in events {
        let bin = (ts / width_ms) as usize;
        match side {
            Side::Left => timeline.left[bin] += 1,
            Side::Right => timeline.right[bin] += 1,
        }
    }
    timeline
}
