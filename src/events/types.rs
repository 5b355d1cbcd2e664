//! Event type definitions for progress reporting.

use crate::core::summary::BackupSummary;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All events emitted by the ingest pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Source enumeration events
    Scan(ScanEvent),
    /// Destination re-hashing events
    Seed(SeedEvent),
    /// Per-file progress and outcomes
    File(FileEvent),
    /// Pipeline-level events
    Pipeline(PipelineEvent),
}

/// Events during the scanning phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScanEvent {
    /// Scanning has started
    Started { root: PathBuf },
    /// Progress update during scanning
    Progress(ScanProgress),
    /// A media file was found
    FileFound { path: PathBuf },
    /// An error occurred but scanning continues
    Error { path: PathBuf, message: String },
    /// Scanning completed
    Completed { total_files: usize },
}

/// Progress information during scanning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanProgress {
    /// Number of directories scanned so far
    pub directories_scanned: usize,
    /// Number of media files found so far
    pub files_found: usize,
    /// Current directory being scanned
    pub current_path: PathBuf,
}

/// Events while fingerprinting an existing destination tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SeedEvent {
    Started { root: PathBuf },
    Completed { entries: usize, failures: usize },
}

/// Per-file events, in the order the presentation layer needs them
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FileEvent {
    /// A file is being worked on
    Progress(FileProgress),
    /// A file reached a terminal state
    Finished { path: PathBuf, outcome: FileOutcome },
}

/// Progress information for the current file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileProgress {
    /// 1-based position of the file in the work list
    pub index: usize,
    /// Total number of files in the work list
    pub total: usize,
    /// Bare file name of the current file
    pub filename: String,
}

/// Terminal outcome of a single file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileOutcome {
    /// Copied to the destination
    Copied { destination: PathBuf },
    /// Preview only: where the file would have gone
    WouldCopy { destination: PathBuf },
    /// Same content already claimed by another file
    Duplicate { existing: String },
    /// Below the minimum size threshold
    SkippedSmall,
    /// Failed; the run carries on
    Failed { message: String },
}

/// Pipeline-level events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PipelineEvent {
    /// Pipeline has started
    Started,
    /// Moving to a new phase
    PhaseChanged { phase: PipelinePhase },
    /// Pipeline ran to completion
    Completed { summary: BackupSummary },
    /// Pipeline was cancelled; the summary is partial
    Cancelled { summary: BackupSummary },
    /// Pipeline hit a fatal error; the summary is partial
    Aborted { message: String, summary: BackupSummary },
}

/// Phases of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelinePhase {
    Scanning,
    Seeding,
    Analyzing,
    Committing,
    Transferring,
}

impl std::fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelinePhase::Scanning => write!(f, "Scanning"),
            PipelinePhase::Seeding => write!(f, "Indexing destination"),
            PipelinePhase::Analyzing => write!(f, "Analyzing"),
            PipelinePhase::Committing => write!(f, "Deduplicating"),
            PipelinePhase::Transferring => write!(f, "Copying"),
        }
    }
}
