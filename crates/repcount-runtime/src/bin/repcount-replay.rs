//! Replay recorded pose traces through the counting core.
//!
//! Usage:
//! ```bash
//! # Replay a trace file, one JSON result per line on stdout
//! repcount-replay session.jsonl
//!
//! # Read from stdin, unsmoothed, replacing duplicate sessions
//! cat session.jsonl | repcount-replay --smoothing 1 --duplicate-policy replace
//!
//! # List built-in exercises
//! repcount-replay --list-exercises
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use repcount_engine::ProfileTable;
use repcount_runtime::{LoggingConfig, ReplayConfig, ReplayReport, Replayer};
use repcount_session::{DuplicatePolicy, SessionConfig, SessionManager};
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

#[derive(Parser)]
#[command(
    name = "repcount-replay",
    about = "Replay pose traces through the repetition counter",
    version
)]
struct Args {
    /// Trace file (JSON lines); stdin when omitted
    trace: Option<PathBuf>,

    /// Moving-average window (overrides REPCOUNT_SMOOTHING_WINDOW)
    #[arg(long)]
    smoothing: Option<usize>,

    /// Keypoint confidence gate (overrides REPCOUNT_MIN_CONFIDENCE)
    #[arg(long)]
    min_confidence: Option<f32>,

    /// `reject` or `replace` (overrides REPCOUNT_DUPLICATE_POLICY)
    #[arg(long)]
    duplicate_policy: Option<DuplicatePolicy>,

    /// Fail on the first malformed trace line
    #[arg(long)]
    strict: bool,

    /// Print the replay totals to stderr when done
    #[arg(long)]
    summary: bool,

    /// Print the built-in exercise profiles as JSON and exit
    #[arg(long)]
    list_exercises: bool,

    /// Enable debug logging
    #[arg(long, short = 'v')]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut logging = LoggingConfig::from_env();
    if args.verbose {
        logging = logging.with_level("debug");
    }
    logging.init().context("failed to initialise logging")?;

    let profiles = Arc::new(ProfileTable::standard());
    if args.list_exercises {
        let listing: Vec<_> = profiles.iter().map(|p| p.as_ref()).collect();
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    let mut config = SessionConfig::from_env()?;
    if let Some(window) = args.smoothing {
        config.smoothing_window = window;
    }
    if let Some(min_confidence) = args.min_confidence {
        config.min_confidence = min_confidence;
    }
    if let Some(policy) = args.duplicate_policy {
        config.duplicate_policy = policy;
    }
    config.validate()?;

    let replayer = Replayer::new(
        Arc::new(SessionManager::new(profiles, config)),
        ReplayConfig {
            strict: args.strict,
            ..Default::default()
        },
    );

    let (tx, mut rx) = mpsc::unbounded_channel();
    let printer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(record) = rx.recv().await {
            let mut line = serde_json::to_vec(&record)?;
            line.push(b'\n');
            stdout.write_all(&line).await?;
        }
        stdout.flush().await?;
        anyhow::Ok(())
    });

    let report = match &args.trace {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("failed to open {}", path.display()))?;
            replayer.run(BufReader::new(file), tx).await?
        }
        None => replayer.run(BufReader::new(tokio::io::stdin()), tx).await?,
    };

    printer.await??;

    if args.summary {
        print_summary(&report);
    }
    Ok(())
}

fn print_summary(report: &ReplayReport) {
    eprintln!(
        "{} lines, {} events ({} malformed), {} clients, {} frames, {} rejected",
        report.lines, report.events, report.malformed, report.clients, report.frames, report.rejected
    );
}
