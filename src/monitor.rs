//! Polling monitor
//!
//! A [`TrialSource`] yields a fresh [`TrialSnapshot`] each cycle; the
//! [`Engine`] turns it into a [`RefreshReport`] for the display callback.
//!
//! Per-cycle policy:
//!
//! - [`Error::SourceUnavailable`]: nothing to show yet, retry next cycle.
//! - [`Error::Unclassified`]: logged, nothing displayed, retry next cycle.
//! - anything else ends the loop.

use std::path::{Path, PathBuf};

use tracing::{debug, error, warn};

use crate::engine::{Engine, RefreshReport};
use crate::trial::{trialspeak, TrialSnapshot};
use crate::{Error, Result};

/// Produces the full trial sequence seen so far.
pub trait TrialSource {
    /// Take a consistent snapshot of every trial so far.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SourceUnavailable`] when there is nothing to read yet.
    fn snapshot(&mut self) -> Result<TrialSnapshot>;
}

impl<F> TrialSource for F
where
    F: FnMut() -> Result<TrialSnapshot>,
{
    fn snapshot(&mut self) -> Result<TrialSnapshot> {
        self()
    }
}

/// Re-reads an append-only rig log from the start on every snapshot.
#[derive(Debug, Clone)]
pub struct LogFileSource {
    path: PathBuf,
}

impl LogFileSource {
    /// Watch the log at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the log.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TrialSource for LogFileSource {
    /// Bytes that are not UTF-8 (serial noise) are replaced, and the lines
    /// holding them are skipped by the parser like any malformed line.
    fn snapshot(&mut self) -> Result<TrialSnapshot> {
        let bytes = std::fs::read(&self.path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                debug!(path = %self.path.display(), "log not created yet");
            } else {
                warn!(path = %self.path.display(), error = %e, "cannot read log");
            }
            Error::SourceUnavailable(format!("{}: {e}", self.path.display()))
        })?;
        let text = String::from_utf8_lossy(&bytes);
        let lines: Vec<&str> = text.lines().collect();
        let snapshot = trialspeak::parse_lines(&lines);
        if snapshot.is_empty() {
            return Err(Error::SourceUnavailable(format!(
                "{}: no trials yet",
                self.path.display()
            )));
        }
        Ok(snapshot)
    }
}

/// Run one cycle.
///
/// # Errors
///
/// Propagates source and refresh errors unchanged.
pub fn poll_once<S>(engine: &Engine, source: &mut S) -> Result<RefreshReport>
where
    S: TrialSource + ?Sized,
{
    let snapshot = source.snapshot()?;
    engine.refresh(&snapshot)
}

/// Cycle counts of a finished watch loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatchSummary {
    /// Reports handed to the display.
    pub displayed: usize,
    /// Cycles with nothing to read.
    pub skipped: usize,
    /// Cycles aborted on unclassified trials.
    pub aborted: usize,
}

/// Refresh every `interval` until `shutdown` completes.
///
/// Shutdown is checked before each cycle; a cycle never leaves partial
/// state behind.
///
/// # Errors
///
/// Returns the first error other than an unavailable source or
/// unclassified trials.
#[cfg(feature = "tokio")]
pub async fn watch<S, D, F>(
    engine: &Engine,
    source: &mut S,
    interval: std::time::Duration,
    mut display: D,
    shutdown: F,
) -> Result<WatchSummary>
where
    S: TrialSource + ?Sized,
    D: FnMut(&RefreshReport),
    F: std::future::Future<Output = ()>,
{
    use tokio::time::MissedTickBehavior;
    use tracing::info;

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    let mut summary = WatchSummary::default();
    loop {
        tokio::select! {
            biased;
            () = &mut shutdown => {
                info!(?summary, "monitor stopped");
                return Ok(summary);
            }
            _ = ticker.tick() => {}
        }

        match poll_once(engine, source) {
            Ok(report) => {
                summary.displayed += 1;
                display(&report);
            }
            Err(Error::SourceUnavailable(reason)) => {
                summary.skipped += 1;
                debug!(%reason, "nothing to refresh");
            }
            Err(e @ Error::Unclassified { .. }) => {
                summary.aborted += 1;
                error!(error = %e, "cycle discarded");
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::IdentityClassifier;

    #[test]
    fn test_missing_file_is_unavailable() {
        let mut source = LogFileSource::new("/nonexistent/trialwatch/log.txt");
        assert!(matches!(
            source.snapshot(),
            Err(Error::SourceUnavailable(_))
        ));
    }

    #[test]
    fn test_log_with_invalid_utf8_keeps_trials() {
        let path = std::env::temp_dir().join(format!("trialwatch-noise-{}.log", std::process::id()));
        let mut log = b"1000 TRL_START\n1001 TRLP STIM 1\n2000 TRLR OUTC 1\n".to_vec();
        log.extend_from_slice(b"2100 DBG serial noise \xff\xfe\n");
        log.extend_from_slice(b"3000 TRL_START\n3001 TRLP STIM 0\n");
        std::fs::write(&path, &log).unwrap();

        let engine = Engine::new(IdentityClassifier::new("stim_number", 2));
        let mut source = LogFileSource::new(&path);
        let report = poll_once(&engine, &mut source);
        std::fs::remove_file(&path).unwrap();

        let report = report.unwrap();
        assert_eq!(report.trial_count, 2);
        assert_eq!(report.keys, vec![Some(1), Some(0)]);
        assert_eq!(report.tallies.type_all(1).hits, 1);
    }

    #[test]
    fn test_closure_source() {
        let engine = Engine::new(IdentityClassifier::new("stim_number", 3));
        let mut source = || {
            Ok(trialspeak::parse_lines(&[
                "10 TRL_START",
                "11 TRLP STIM 2",
                "90 TRLR OUTC 1",
            ]))
        };

        let report = poll_once(&engine, &mut source).unwrap();
        assert_eq!(report.keys, vec![Some(2)]);
    }

    #[cfg(feature = "tokio")]
    #[tokio::test]
    async fn test_watch_survives_bad_cycles() {
        let engine = Engine::new(IdentityClassifier::new("stim_number", 2));
        let mut cycle = 0;
        let mut source = || {
            cycle += 1;
            match cycle {
                1 => Err(Error::SourceUnavailable("not yet".to_string())),
                // stimulus 5 has no type
                2 => Ok(trialspeak::parse_lines(&["1 TRL_START", "2 TRLP STIM 5", "3 TRLR OUTC 1"])),
                _ => Ok(trialspeak::parse_lines(&["1 TRL_START", "2 TRLP STIM 1", "3 TRLR OUTC 1"])),
            }
        };

        let (tx, rx) = tokio::sync::oneshot::channel();
        let mut tx = Some(tx);
        let mut shown = 0;
        let display = |report: &RefreshReport| {
            assert_eq!(report.keys, vec![Some(1)]);
            shown += 1;
            if shown == 2 {
                if let Some(tx) = tx.take() {
                    let _ = tx.send(());
                }
            }
        };
        let shutdown = async {
            let _ = rx.await;
        };

        let summary = watch(
            &engine,
            &mut source,
            std::time::Duration::from_millis(1),
            display,
            shutdown,
        )
        .await
        .unwrap();

        assert_eq!(
            summary,
            WatchSummary {
                displayed: 2,
                skipped: 1,
                aborted: 1,
            }
        );
    }

    #[cfg(feature = "tokio")]
    #[tokio::test]
    async fn test_watch_stops_on_other_errors() {
        let engine = Engine::new(IdentityClassifier::new("stim_number", 2));
        let mut source = || -> Result<TrialSnapshot> { Err(Error::Other("rig gone".to_string())) };

        let result = watch(
            &engine,
            &mut source,
            std::time::Duration::from_millis(1),
            |_: &RefreshReport| {},
            std::future::pending::<()>(),
        )
        .await;
        assert!(matches!(result, Err(Error::Other(_))));
    }
}
