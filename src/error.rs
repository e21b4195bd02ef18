//! Error types for trialwatch
//!
//! Per-trial classification problems are not errors: they are collected
//! into a [`WarningLog`](crate::classify::WarningLog). Only conditions that
//! abort a refresh cycle or invalidate configuration live here.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// trialwatch error types
#[derive(Error, Debug)]
pub enum Error {
    /// The log cannot be read yet, or it holds no trials
    #[error("Trial source unavailable: {0}\nWaiting for the next refresh")]
    SourceUnavailable(String),

    /// At least one trial matched no trial type; the cycle's tallies were discarded
    #[error(
        "Unclassified trials: no match on trials {no_match:?} (type errors on {type_error:?})\nCheck the trial type table against the rig parameters"
    )]
    Unclassified {
        /// Trials that matched zero table rows
        no_match: Vec<usize>,
        /// Subset of those trials whose values could not be compared
        type_error: Vec<usize>,
    },

    /// Trial type table or column mapping is inconsistent
    #[error("Invalid trial type table: {0}")]
    InvalidTable(String),

    /// Configuration could not be validated
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
