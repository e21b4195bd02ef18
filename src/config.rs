//! Monitor configuration
//!
//! Loaded once from JSON. Every key is optional:
//!
//! ```json
//! {
//!   "refresh_interval_ms": 300,
//!   "plot_window": 50,
//!   "reward_markers": {"left": "EVENT REWARD_L", "right": "EVENT REWARD_R"},
//!   "reward_bin_secs": 20,
//!   "classifier": {
//!     "kind": "table",
//!     "table": {
//!       "columns": ["rewside", "srvpos", "stppos"],
//!       "rows": [{"name": "L near", "rewside": "left", "srvpos": 1750, "stppos": 50}]
//!     },
//!     "mapping": {"rewside": "rewside", "srvpos": "servo_pos", "stppos": "stepper_pos"}
//!   }
//! }
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::classify::{Classifier, ColumnMapping, IdentityClassifier, TableClassifier, TrialTypeTable};
use crate::reward::RewardMarkers;
use crate::{Error, Result};

const DEFAULT_REFRESH_INTERVAL_MS: u64 = 300;
const DEFAULT_PLOT_WINDOW: usize = 50;
const DEFAULT_REWARD_BIN_SECS: u64 = 20;
const MAX_REWARD_BIN_SECS: u64 = 24 * 60 * 60;
const DEFAULT_STIM_FIELD: &str = "stim_number";
const DEFAULT_N_STIMULI: usize = 6;

fn default_stim_field() -> String {
    DEFAULT_STIM_FIELD.to_string()
}

const fn default_n_stimuli() -> usize {
    DEFAULT_N_STIMULI
}

/// Which classification scheme to run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifierConfig {
    /// Trial type table lookup.
    Table {
        /// The table.
        table: TrialTypeTable,
        /// Column-to-field mapping.
        #[serde(default)]
        mapping: ColumnMapping,
    },
    /// Integer attribute used directly as the type key.
    Identity {
        /// Field holding the stimulus number.
        #[serde(default = "default_stim_field")]
        field: String,
        /// Number of stimulus types.
        #[serde(default = "default_n_stimuli")]
        n_stimuli: usize,
    },
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self::Identity {
            field: default_stim_field(),
            n_stimuli: DEFAULT_N_STIMULI,
        }
    }
}

impl ClassifierConfig {
    /// Build the configured classifier.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTable`] if the mapping does not fit the table,
    /// or [`Error::InvalidConfig`] for an identity scheme with no stimuli.
    pub fn build(&self) -> Result<Classifier> {
        match self {
            Self::Table { table, mapping } => {
                Ok(TableClassifier::new(table.clone(), mapping.clone())?.into())
            }
            Self::Identity { field, n_stimuli } => {
                if *n_stimuli == 0 {
                    return Err(Error::InvalidConfig("n_stimuli must be positive".to_string()));
                }
                Ok(IdentityClassifier::new(field.clone(), *n_stimuli).into())
            }
        }
    }
}

/// Settings for the polling monitor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Polling period.
    pub refresh_interval_ms: u64,
    /// Number of trailing trials a display shows.
    pub plot_window: usize,
    /// Reward line tokens.
    pub reward_markers: RewardMarkers,
    /// Reward timeline bin width.
    pub reward_bin_secs: u64,
    /// Classification scheme.
    pub classifier: ClassifierConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            refresh_interval_ms: DEFAULT_REFRESH_INTERVAL_MS,
            plot_window: DEFAULT_PLOT_WINDOW,
            reward_markers: RewardMarkers::default(),
            reward_bin_secs: DEFAULT_REWARD_BIN_SECS,
            classifier: ClassifierConfig::default(),
        }
    }
}

impl MonitorConfig {
    /// Parse and validate a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] on malformed input (including an invalid
    /// trial type table) or [`Error::InvalidConfig`] on out-of-range values.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read, otherwise as
    /// [`MonitorConfig::from_json_str`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] naming the first offending key.
    pub fn validate(&self) -> Result<()> {
        if self.refresh_interval_ms == 0 {
            return Err(Error::InvalidConfig(
                "refresh_interval_ms must be positive".to_string(),
            ));
        }
        if self.reward_bin_secs == 0 || self.reward_bin_secs > MAX_REWARD_BIN_SECS {
            return Err(Error::InvalidConfig(format!(
                "reward_bin_secs must be between 1 and {MAX_REWARD_BIN_SECS}"
            )));
        }
        let RewardMarkers { left, right } = &self.reward_markers;
        if left.is_empty() || right.is_empty() || left == right {
            return Err(Error::InvalidConfig(
                "reward markers must be non-empty and distinct".to_string(),
            ));
        }
        Ok(())
    }

    /// Polling period as a `Duration`.
    #[must_use]
    pub const fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::TrialClassifier;

    #[test]
    fn test_defaults() {
        let config = MonitorConfig::from_json_str("{}").unwrap();
        assert_eq!(config, MonitorConfig::default());
        assert_eq!(config.refresh_interval(), Duration::from_millis(300));
        assert_eq!(config.reward_markers.left, "EVENT REWARD_L");

        let classifier = config.classifier.build().unwrap();
        assert_eq!(classifier.type_names().len(), 6);
    }

    #[test]
    fn test_table_classifier_config() {
        let config = MonitorConfig::from_json_str(
            r#"{
                "refresh_interval_ms": 500,
                "classifier": {
                    "kind": "table",
                    "table": {
                        "columns": ["rewside", "stppos"],
                        "rows": [
                            {"name": "L", "rewside": "left", "stppos": 50},
                            {"name": "R", "rewside": "right", "stppos": 150}
                        ]
                    },
                    "mapping": {"rewside": "rewside", "stppos": "stepper_pos"}
                }
            }"#,
        )
        .unwrap();

        assert_eq!(config.refresh_interval_ms, 500);
        let classifier = config.classifier.build().unwrap();
        assert!(matches!(classifier, Classifier::Table(_)));
        assert_eq!(classifier.type_names(), vec!["L", "R"]);
    }

    #[test]
    fn test_default_mapping_must_fit_table() {
        // default mapping names srvpos, which this table lacks
        let config = MonitorConfig::from_json_str(
            r#"{"classifier": {"kind": "table", "table": {
                "columns": ["stppos"], "rows": [{"name": "A", "stppos": 1}]}}}"#,
        )
        .unwrap();
        assert!(matches!(
            config.classifier.build(),
            Err(Error::InvalidTable(_))
        ));
    }

    #[test]
    fn test_identity_config() {
        let config = MonitorConfig::from_json_str(
            r#"{"classifier": {"kind": "identity", "n_stimuli": 2}}"#,
        )
        .unwrap();
        let classifier = config.classifier.build().unwrap();
        assert_eq!(classifier.type_names(), vec!["LEFT 0", "RIGHT 1"]);

        let zero = ClassifierConfig::Identity {
            field: "stim_number".into(),
            n_stimuli: 0,
        };
        assert!(matches!(zero.build(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_validation() {
        let err = MonitorConfig::from_json_str(r#"{"refresh_interval_ms": 0}"#).unwrap_err();
        assert!(err.to_string().contains("refresh_interval_ms"));

        let err = MonitorConfig::from_json_str(
            r#"{"reward_markers": {"left": "REW", "right": "REW"}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));

        let err = MonitorConfig::from_json_str(r#"{"reward_bin_secs": 18446744073709551615}"#)
            .unwrap_err();
        assert!(err.to_string().contains("reward_bin_secs"));

        assert!(matches!(
            MonitorConfig::from_json_str("{not json"),
            Err(Error::Json(_))
        ));
    }
}
