//! trialwatch CLI - live hit counts for a running rig log
//!
//! Usage:
//!   trialwatch <LOG> [--config <json>] [--once]
//!
//! Example:
//!   trialwatch session.log --config rig3.json
//!   RUST_LOG=trialwatch=debug trialwatch session.log --once

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;
use trialwatch::monitor::{self, LogFileSource};
use trialwatch::{Engine, MonitorConfig, RefreshReport};

fn print_usage() {
    eprintln!(
        r"
trialwatch - live trial classification for behavioral rig logs

USAGE:
    trialwatch <LOG> [OPTIONS]

ARGS:
    <LOG>    Rig log to watch (re-read on every refresh)

OPTIONS:
    -c, --config <FILE>    JSON monitor configuration (default: built-in)
    --once                 Refresh once, print, and exit
    -h, --help             Print this help message

ENVIRONMENT:
    RUST_LOG               Log filter (default: info)
"
    );
}

struct CliArgs {
    log: PathBuf,
    config: Option<PathBuf>,
    once: bool,
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        std::process::exit(i32::from(args.len() < 2));
    }

    let mut cli = CliArgs {
        log: PathBuf::from(&args[1]),
        config: None,
        once: false,
    };

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                i += 1;
                if i < args.len() {
                    cli.config = Some(PathBuf::from(&args[i]));
                }
            }
            "--once" => cli.once = true,
            other => {
                eprintln!("unknown argument: {other}");
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }
    cli
}

fn display(report: &RefreshReport) {
    println!("{}", report.title());
    for label in report.type_labels() {
        println!("  {label}");
    }
    println!();
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = parse_args();

    let config = match &cli.config {
        Some(path) => MonitorConfig::from_path(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => MonitorConfig::default(),
    };
    let engine = Engine::from_config(&config).context("building engine")?;
    let mut source = LogFileSource::new(&cli.log);

    if cli.once {
        let report = monitor::poll_once(&engine, &mut source)
            .with_context(|| format!("refreshing {}", cli.log.display()))?;
        display(&report);
        return Ok(());
    }

    tracing::info!(
        log = %cli.log.display(),
        interval_ms = config.refresh_interval_ms,
        "watching"
    );
    let shutdown = async {
        // a failed signal handler just means we run until killed
        let _ = tokio::signal::ctrl_c().await;
    };
    let summary = monitor::watch(
        &engine,
        &mut source,
        config.refresh_interval(),
        display,
        shutdown,
    )
    .await?;

    eprintln!(
        "{} refreshes shown, {} skipped, {} aborted",
        summary.displayed, summary.skipped, summary.aborted
    );
    Ok(())
}
