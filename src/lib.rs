//! # trialwatch: Live Trial Classification for Behavioral Rigs
//!
//! **Version**: 0.1.0
//!
//! trialwatch turns the growing trial log of a behavioral rig into per-type
//! and per-side hit counts, recomputed from scratch on every refresh.
//!
//! ```text
//! TrialSource ──snapshot──► classify ──keys──► aggregate ──► RefreshReport
//!                              │                  ▲
//!                              └── WarningLog     └── reward counts
//! ```
//!
//! ## Design Principles
//!
//! - **Stateless cycles**: every refresh is a pure function of the snapshot
//! - **Fail loud**: a finished trial matching no type aborts the cycle
//! - **Bad trials**: counted in "all" tallies, never in "unforced" ones
//!
//! ## Example Usage
//!
//! ```rust
//! use trialwatch::classify::IdentityClassifier;
//! use trialwatch::trial::trialspeak;
//! use trialwatch::Engine;
//!
//! let snapshot = trialspeak::parse_lines(&[
//!     "100 TRL_START",
//!     "101 TRLP STIM 1",
//!     "900 TRLR OUTC 1",
//! ]);
//! let engine = Engine::new(IdentityClassifier::new("stim_number", 2));
//! let report = engine.refresh(&snapshot)?;
//! assert_eq!(report.tallies.type_all(1).hits, 1);
//! # Ok::<(), trialwatch::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod aggregate;
pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod monitor;
pub mod report;
pub mod reward;
pub mod trial;
pub mod value;

pub use config::MonitorConfig;
pub use engine::{Engine, RefreshReport};
pub use error::{Error, Result};
pub use value::FieldValue;
