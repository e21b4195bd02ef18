//! One refresh cycle: snapshot in, report out
//!
//! [`Engine::refresh`] is a pure function of the snapshot and the engine's
//! read-only configuration. Nothing is carried between cycles, so a cycle
//! can be abandoned at any point.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error};

use crate::aggregate::{aggregate, PerformanceTallies};
use crate::classify::{classify_all, Classifier, TrialClassifier, TypeKey, Warning};
use crate::config::MonitorConfig;
use crate::report::{self, PlotSeries};
use crate::reward::{reward_timeline, tally_rewards, RewardMarkers, RewardTally, RewardTimeline};
use crate::trial::TrialSnapshot;
use crate::{Error, Result};

/// Everything a display layer needs from one cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefreshReport {
    /// When the report was computed.
    pub generated_at: DateTime<Utc>,
    /// Number of trials in the snapshot.
    pub trial_count: usize,
    /// Display name per type key.
    pub type_names: Vec<String>,
    /// Type key per trial; only a trailing in-progress trial may be `None`.
    pub keys: Vec<Option<TypeKey>>,
    /// Hit counts.
    pub tallies: PerformanceTallies,
    /// Reward counts.
    pub rewards: RewardTally,
    /// Rewards over time.
    pub timeline: RewardTimeline,
    /// Classification warnings of this cycle.
    pub warnings: Vec<Warning>,
    /// Scatter-plot points.
    pub series: PlotSeries,
}

impl RefreshReport {
    /// Per-type labels (see [`report::type_labels`]).
    #[must_use]
    pub fn type_labels(&self) -> Vec<String> {
        report::type_labels(&self.type_names, &self.tallies)
    }

    /// Summary title (see [`report::title`]).
    #[must_use]
    pub fn title(&self) -> String {
        report::title(&self.rewards, &self.tallies)
    }
}

/// Classification and aggregation settings, fixed for a session.
#[derive(Debug, Clone)]
pub struct Engine {
    classifier: Classifier,
    markers: RewardMarkers,
    reward_bin_secs: u64,
    plot_window: usize,
}

impl Engine {
    /// Create an engine with default reward and display settings.
    #[must_use]
    pub fn new(classifier: impl Into<Classifier>) -> Self {
        let defaults = MonitorConfig::default();
        Self {
            classifier: classifier.into(),
            markers: defaults.reward_markers,
            reward_bin_secs: defaults.reward_bin_secs,
            plot_window: defaults.plot_window,
        }
    }

    /// Create an engine from a configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the classifier
    /// cannot be built.
    pub fn from_config(config: &MonitorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            classifier: config.classifier.build()?,
            markers: config.reward_markers.clone(),
            reward_bin_secs: config.reward_bin_secs,
            plot_window: config.plot_window,
        })
    }

    /// Replace the reward markers.
    #[must_use]
    pub fn with_markers(mut self, markers: RewardMarkers) -> Self {
        self.markers = markers;
        self
    }

    /// The classifier.
    #[must_use]
    pub const fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Recompute everything from a snapshot.
    ///
    /// Warnings are logged once per category before returning.
    ///
    /// # Errors
    ///
    /// - [`Error::SourceUnavailable`] if the snapshot holds no trials.
    /// - [`Error::Unclassified`] if a finished trial matched no type; no
    ///   tallies are produced for the cycle.
    pub fn refresh(&self, snapshot: &TrialSnapshot) -> Result<RefreshReport> {
        if snapshot.is_empty() {
            return Err(Error::SourceUnavailable("no trials yet".to_string()));
        }
        let records = snapshot.records();

        let classification = classify_all(&self.classifier, records);
        classification.warnings().emit();
        let (keys, warnings) = classification.into_keys().map_err(|e| {
            error!(error = %e, "refresh aborted");
            e
        })?;

        let tallies = aggregate(records, &keys);
        let rewards = tally_rewards(snapshot.segments(), &snapshot.reward_sides(), &self.markers);
        let lines: Vec<&str> = snapshot
            .segments()
            .iter()
            .flatten()
            .map(String::as_str)
            .collect();
        let timeline = reward_timeline(&lines, &self.markers, self.reward_bin_secs);
        let series = report::plot_series(records, &keys, self.plot_window);

        debug!(
            trials = records.len(),
            unforced_hits = tallies.unforced_total.hits,
            unforced_total = tallies.unforced_total.total,
            "refresh complete"
        );

        Ok(RefreshReport {
            generated_at: Utc::now(),
            trial_count: records.len(),
            type_names: self.classifier.type_names(),
            keys,
            tallies,
            rewards,
            timeline,
            warnings: warnings.warnings(),
            series,
        })
    }
}
