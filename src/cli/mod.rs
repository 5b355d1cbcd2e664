//! # CLI Module
//!
//! Command-line interface for the media ingest pipeline.
//!
//! ## Usage
//! ```bash
//! # Copy a memory card into a library
//! media-ingest /Volumes/CARD ~/Pictures/Library
//!
//! # See what would happen, without writing anything
//! media-ingest /Volumes/CARD ~/Pictures/Library --preview
//!
//! # Per-file output
//! media-ingest /Volumes/CARD ~/Pictures/Library --verbose
//!
//! # JSON output
//! media-ingest /Volumes/CARD ~/Pictures/Library --output json
//! ```

mod signal;

use clap::{Parser, ValueEnum};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use media_ingest::core::pipeline::{CancellationToken, Pipeline, PipelineResult, RunOutcome};
use media_ingest::error::{IngestError, Result};
use media_ingest::events::{Event, EventChannel, FileEvent, FileOutcome, PipelineEvent, ScanEvent};
use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;
use std::time::Duration;

/// Events queued for the progress thread before workers wait on it
const EVENT_BUFFER: usize = 1024;

/// Media Ingest - back up photos, videos and audio without duplicates
#[derive(Parser, Debug)]
#[command(name = "media-ingest")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory to ingest from
    source: PathBuf,

    /// Library root to copy into (optional with --preview)
    destination: Option<PathBuf>,

    /// Report what would be copied without writing anything
    #[arg(long)]
    preview: bool,

    /// Print every file's outcome
    #[arg(short, long)]
    verbose: bool,

    /// Skip files smaller than this many KiB
    #[arg(long, default_value_t = 10)]
    min_size_kb: u64,

    /// Worker threads (defaults to available parallelism)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Seconds to wait for a file's metadata (0 = no limit)
    #[arg(long, default_value_t = 5)]
    metadata_timeout_secs: u64,

    /// Do not fingerprint what the destination already holds
    #[arg(long)]
    no_seed: bool,

    /// Include hidden files and directories
    #[arg(long)]
    include_hidden: bool,

    /// Output format
    #[arg(short, long, default_value = "pretty")]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
}

/// Run the CLI
pub fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    media_ingest::init_tracing(cli.verbose);

    let term = Term::stderr();
    let pretty = matches!(cli.output, OutputFormat::Pretty);

    if pretty {
        term.write_line(&format!(
            "{} {}",
            style("Media Ingest").bold().cyan(),
            style(concat!("v", env!("CARGO_PKG_VERSION"))).dim()
        ))
        .ok();
        if cli.preview {
            term.write_line(&format!(
                "{}",
                style("Preview mode: nothing will be written").yellow()
            ))
            .ok();
        }
        term.write_line("").ok();
    }

    let timeout = match cli.metadata_timeout_secs {
        0 => None,
        secs => Some(Duration::from_secs(secs)),
    };

    let mut builder = Pipeline::builder()
        .source(&cli.source)
        .preview(cli.preview)
        .min_file_size(cli.min_size_kb.saturating_mul(1024))
        .metadata_timeout(timeout)
        .seed_from_destination(!cli.no_seed)
        .include_hidden(cli.include_hidden);

    if let Some(destination) = &cli.destination {
        builder = builder.destination(destination);
    }
    if let Some(workers) = cli.workers {
        builder = builder.workers(workers);
    }

    let pipeline = builder.build()?;

    let cancel = CancellationToken::new();
    signal::cancel_on_interrupt(&cancel);

    let (sender, receiver) = EventChannel::bounded(EVENT_BUFFER);

    // Progress bar for pretty output
    let progress = pretty.then(|| {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓░"),
        );
        pb
    });

    let progress_clone = progress.clone();
    let verbose = cli.verbose;

    // Handle events in a separate thread
    let event_thread = thread::spawn(move || {
        let Some(pb) = progress_clone else {
            // drain so the pipeline never blocks on a full channel
            for _ in receiver.iter() {}
            return;
        };

        for event in receiver.iter() {
            match event {
                Event::Pipeline(PipelineEvent::PhaseChanged { phase }) => {
                    pb.set_message(phase.to_string());
                }
                Event::Scan(ScanEvent::Completed { total_files }) => {
                    pb.set_length(total_files as u64);
                }
                Event::File(FileEvent::Finished { path, outcome }) => {
                    pb.inc(1);
                    if verbose {
                        pb.println(describe(&path, &outcome));
                    }
                }
                Event::Pipeline(
                    PipelineEvent::Completed { .. }
                    | PipelineEvent::Cancelled { .. }
                    | PipelineEvent::Aborted { .. },
                ) => {
                    pb.finish_and_clear();
                }
                _ => {}
            }
        }
    });

    let result = pipeline.run_with_events(&sender, &cancel);

    // Drop sender to signal event thread to finish
    drop(sender);
    event_thread.join().ok();
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    let result = result?;

    match cli.output {
        OutputFormat::Pretty => print_pretty_results(&term, &result),
        OutputFormat::Json => print_json_results(&result)?,
    }

    Ok(match result.outcome {
        RunOutcome::Completed => ExitCode::SUCCESS,
        RunOutcome::Cancelled => ExitCode::from(130),
        RunOutcome::Aborted(_) => ExitCode::FAILURE,
    })
}

fn describe(path: &std::path::Path, outcome: &FileOutcome) -> String {
    let path = path.display();
    match outcome {
        FileOutcome::Copied { destination } => {
            format!("{} {} -> {}", style("copied").green(), path, destination.display())
        }
        FileOutcome::WouldCopy { destination } => {
            format!("{} {} -> {}", style("would copy").cyan(), path, destination.display())
        }
        FileOutcome::Duplicate { existing } => {
            format!("{} {} (same as {})", style("duplicate").yellow(), path, existing)
        }
        FileOutcome::SkippedSmall => format!("{} {}", style("too small").dim(), path),
        FileOutcome::Failed { message } => format!("{} {}", style("failed").red(), message),
    }
}

fn print_pretty_results(term: &Term, result: &PipelineResult) {
    let (mark, headline) = match &result.outcome {
        RunOutcome::Completed => (style("✓").green().bold(), "Ingest complete".to_string()),
        RunOutcome::Cancelled => (style("!").yellow().bold(), "Ingest cancelled".to_string()),
        RunOutcome::Aborted(reason) => (style("✗").red().bold(), format!("Ingest aborted: {reason}")),
    };

    term.write_line(&format!(
        "{} {} in {:.1}s",
        mark,
        headline,
        result.duration_ms as f64 / 1000.0
    ))
    .ok();
    term.write_line("").ok();

    for line in result.record.render().lines() {
        if line.starts_with("  - ") {
            term.write_line(&format!("{}", style(line).dim())).ok();
        } else if line.ends_with(':') {
            term.write_line(&format!("{}", style(line).bold())).ok();
        } else {
            term.write_line(line).ok();
        }
    }
}

fn print_json_results(result: &PipelineResult) -> Result<()> {
    let output = serde_json::json!({
        "outcome": result.outcome,
        "duration_ms": result.duration_ms,
        "summary": result.summary(),
    });

    let text = serde_json::to_string_pretty(&output)
        .map_err(|e| IngestError::Output(e.to_string()))?;
    println!("{text}");
    Ok(())
}
