//! Full-refresh benchmarks
//!
//! Every cycle reprocesses the whole session, so cost grows with trial count.
//! These benchmarks track that cost for typical session lengths.
//!
//! Run with: cargo bench --bench refresh

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use trialwatch::classify::{ColumnMapping, TableClassifier, TrialTypeRow, TrialTypeTable};
use trialwatch::trial::{trialspeak, TrialSnapshot};
use trialwatch::Engine;

const SESSION_SIZES: [usize; 2] = [1_000, 5_000];
const STEPPER_POSITIONS: [i64; 3] = [50, 100, 150];

/// Six types: reward side by stepper position.
fn classifier() -> TableClassifier {
    let rows = ["left", "right"]
        .iter()
        .flat_map(|side| {
            STEPPER_POSITIONS.iter().map(move |pos| {
                TrialTypeRow::new(format!("{side} {pos}"))
                    .with("rewside", *side)
                    .with("stppos", *pos)
            })
        })
        .collect();
    let table = TrialTypeTable::new(vec!["rewside".into(), "stppos".into()], rows).unwrap();
    let mapping = ColumnMapping::from_pairs([("rewside", "rewside"), ("stppos", "stepper_pos")]);
    TableClassifier::new(table, mapping).unwrap()
}

/// Generate a rig log with `n_trials` finished trials.
fn session_log(n_trials: usize, seed: u64) -> Vec<String> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut lines = Vec::with_capacity(n_trials * 7);
    let mut ts = 1_000u64;
    for _ in 0..n_trials {
        let side = rng.gen_range(1..=2);
        let pos = STEPPER_POSITIONS[rng.gen_range(0..STEPPER_POSITIONS.len())];
        let outcome = rng.gen_range(1..=3);
        let isrnd = if rng.gen_bool(0.9) { 3 } else { 2 };

        lines.push(format!("{ts} TRL_START"));
        lines.push(format!("{} TRLP STPPOS {pos}", ts + 1));
        lines.push(format!("{} TRLP RWSD {side}", ts + 1));
        lines.push(format!("{} TRLP ISRND {isrnd}", ts + 1));
        if outcome == 1 {
            let marker = if side == 1 { "REWARD_L" } else { "REWARD_R" };
            lines.push(format!("{} EVENT {marker}", ts + 2_000));
        }
        lines.push(format!("{} TRLR OUTC {outcome}", ts + 2_001));
        ts += rng.gen_range(3_000..8_000);
    }
    lines
}

/// Benchmark parsing a log into a snapshot
fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_log");
    for n in SESSION_SIZES {
        let log = session_log(n, 42);
        group.bench_with_input(BenchmarkId::from_parameter(n), &log, |b, log| {
            b.iter(|| trialspeak::parse_lines(black_box(log)));
        });
    }
    group.finish();
}

/// Benchmark classify + aggregate + reward tally over a parsed snapshot
fn bench_refresh(c: &mut Criterion) {
    let engine = Engine::new(classifier());
    let mut group = c.benchmark_group("refresh");
    for n in SESSION_SIZES {
        let snapshot: TrialSnapshot = trialspeak::parse_lines(&session_log(n, 7));
        group.bench_with_input(BenchmarkId::from_parameter(n), &snapshot, |b, snapshot| {
            b.iter(|| engine.refresh(black_box(snapshot)).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_parse, bench_refresh);
criterion_main!(benches);
