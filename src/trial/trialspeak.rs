//! Reference record source for the rig controller's line protocol
//!
//! Every line starts with a millisecond timestamp:
//!
//! ```text
//! 1200 TRL_START
//! 1201 TRLP STPPOS 50
//! 1201 TRLP RWSD 1
//! 4310 EVENT REWARD_L
//! 4311 TRLR OUTC 1
//! ```
//!
//! Lines before the first `TRL_START` belong to no trial. Lines that do not
//! fit the grammar are skipped; only fields needed downstream are extracted.

use tracing::{trace, warn};

use super::{Outcome, TrialRecord, TrialSnapshot, REWARD_SIDE_FIELD};
use crate::value::FieldValue;

/// Token opening a new trial.
pub const TRIAL_START: &str = "TRL_START";
/// Token of a per-trial parameter line.
pub const TRIAL_PARAM: &str = "TRLP";
/// Token of a per-trial result line.
pub const TRIAL_RESULT: &str = "TRLR";

/// Boolean encoding on the wire.
pub const YES: i64 = 3;
/// Boolean encoding on the wire.
pub const NO: i64 = 2;

/// Field holding an `OUTC` code that maps to no outcome.
pub const UNKNOWN_OUTCOME_FIELD: &str = "outc";

const LEFT: i64 = 1;
const RIGHT: i64 = 2;
const HIT: i64 = 1;
const ERROR: i64 = 2;
const SPOIL: i64 = 3;

/// Timestamp (ms) at the start of a line.
#[must_use]
pub fn line_timestamp(line: &str) -> Option<u64> {
    line.split_whitespace().next()?.parse().ok()
}

/// Split raw lines into per-trial groups at each `TRL_START`.
#[must_use]
pub fn split_by_trial<S: AsRef<str>>(lines: &[S]) -> Vec<Vec<String>> {
    let mut segments: Vec<Vec<String>> = Vec::new();
    for line in lines {
        let line = line.as_ref().trim_end();
        let mut tokens = line.split_whitespace();
        let is_start = tokens.next().is_some() && tokens.next() == Some(TRIAL_START);
        if is_start {
            segments.push(Vec::new());
        }
        if let Some(segment) = segments.last_mut() {
            segment.push(line.to_string());
        }
    }
    segments
}

/// Build one trial record from its line group.
#[must_use]
pub fn build_record<S: AsRef<str>>(segment: &[S]) -> TrialRecord {
    let mut record = TrialRecord::new(Outcome::Current);
    for line in segment {
        let tokens: Vec<&str> = line.as_ref().split_whitespace().collect();
        let [ts, kind, name, value, ..] = tokens.as_slice() else {
            continue;
        };
        if ts.parse::<u64>().is_err() || (*kind != TRIAL_PARAM && *kind != TRIAL_RESULT) {
            trace!(line = line.as_ref(), "skipping line");
            continue;
        }
        apply(&mut record, name, FieldValue::parse(value));
    }
    record
}

fn apply(record: &mut TrialRecord, name: &str, value: FieldValue) {
    let code = match value {
        FieldValue::Int(code) => Some(code),
        _ => None,
    };
    match (name, code) {
        ("OUTC", Some(code)) => {
            let outcome = match code {
                HIT => Outcome::Hit,
                ERROR => Outcome::Error,
                SPOIL => Outcome::Spoil,
                _ => {
                    warn!(code, "unknown outcome code, trial left unresolved");
                    record.set_field(UNKNOWN_OUTCOME_FIELD, code);
                    Outcome::Current
                }
            };
            record.set_outcome(outcome);
        }
        ("RWSD", Some(LEFT)) => record.set_field(REWARD_SIDE_FIELD, "left"),
        ("RWSD", Some(RIGHT)) => record.set_field(REWARD_SIDE_FIELD, "right"),
        ("RWSD", _) => record.set_field(REWARD_SIDE_FIELD, value),
        ("ISRND", Some(code)) => {
            record.set_bad(code != YES);
            record.set_field("isrnd", value);
        }
        ("STPPOS", _) => record.set_field("stepper_pos", value),
        ("SRVPOS", _) => record.set_field("servo_pos", value),
        ("STIM", _) => record.set_field("stim_number", value),
        _ => record.set_field(name.to_ascii_lowercase(), value),
    }
}

/// Segment lines and build a record per trial.
#[must_use]
pub fn parse_lines<S: AsRef<str>>(lines: &[S]) -> TrialSnapshot {
    let segments = split_by_trial(lines);
    let records = segments.iter().map(|s| build_record(s)).collect();
    TrialSnapshot::new(records, segments)
}
