//! Tests for error types

use trialwatch::classify::IdentityClassifier;
use trialwatch::trial::{Outcome, TrialRecord, TrialSnapshot};
use trialwatch::{Engine, Error, MonitorConfig};

#[test]
fn test_source_unavailable_error() {
    let error = Error::SourceUnavailable("log.txt: no trials yet".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("Trial source unavailable"));
    assert!(error_str.contains("no trials yet"));
    assert!(error_str.contains("Waiting for the next refresh"));
}

#[test]
fn test_unclassified_error() {
    let error = Error::Unclassified {
        no_match: vec![3, 7],
        type_error: vec![7],
    };
    let error_str = format!("{error}");
    assert!(error_str.contains("Unclassified trials"));
    assert!(error_str.contains("[3, 7]"));
    assert!(error_str.contains("type errors on [7]"));
    assert!(error_str.contains("Check the trial type table"));
}

#[test]
fn test_invalid_table_error() {
    let error = Error::InvalidTable("row 2 lacks column stppos".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("Invalid trial type table"));
    assert!(error_str.contains("stppos"));
}

#[test]
fn test_invalid_config_error() {
    let error = Error::InvalidConfig("reward_bin_secs must be positive".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("Invalid configuration"));
    assert!(error_str.contains("reward_bin_secs"));
}

#[test]
fn test_json_error_conversion() {
    let json_error = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
    let error: Error = json_error.into();
    assert!(format!("{error}").contains("JSON error"));
}

#[test]
fn test_other_error() {
    let error = Error::Other("custom error message".to_string());
    let error_str = format!("{error}");
    assert_eq!(error_str, "custom error message");
}

#[test]
fn test_error_debug() {
    let error = Error::Unclassified {
        no_match: vec![0],
        type_error: vec![],
    };
    let debug_str = format!("{error:?}");
    assert!(debug_str.contains("Unclassified"));
}

#[test]
fn test_missing_config_file_is_io_error() {
    let error = MonitorConfig::from_path("/nonexistent/trialwatch/config.json").unwrap_err();
    assert!(matches!(error, Error::Io(_)));
    assert!(format!("{error}").contains("IO error"));
}

#[test]
fn test_refresh_reports_unclassified_trial_indices() {
    let engine = Engine::new(IdentityClassifier::new("stim_number", 2));
    let snapshot = TrialSnapshot::from_records(vec![
        TrialRecord::builder(Outcome::Hit).field("stim_number", 0).build(),
        TrialRecord::builder(Outcome::Hit).field("stim_number", 9).build(),
        TrialRecord::builder(Outcome::Error).field("stim_number", "left").build(),
    ]);

    let error_str = format!("{}", engine.refresh(&snapshot).unwrap_err());
    assert!(error_str.contains("no match on trials [1, 2]"));
    assert!(error_str.contains("type errors on [2]"));
}

#[test]
fn test_empty_snapshot_asks_to_wait() {
    let engine = Engine::new(IdentityClassifier::new("stim_number", 2));
    let error = engine.refresh(&TrialSnapshot::default()).unwrap_err();
    assert!(matches!(error, Error::SourceUnavailable(_)));
    assert!(format!("{error}").contains("Waiting for the next refresh"));
}
