//! # Error Module
//!
//! Error types for the media ingest pipeline.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - every per-file error names the file it concerns
//! - **Per-file faults are local** - a `FileError` is recorded and the run
//!   moves on; only an `IngestError` stops a run

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Scanning error: {0}")]
    Scan(#[from] ScanError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to start worker pool: {0}")]
    WorkerPool(String),

    #[error("Failed to write output: {0}")]
    Output(String),
}

/// Errors that occur while enumerating the source tree
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Permission denied accessing: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("Failed to read {path}: {source}")]
    ReadEntry {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Faults scoped to a single media file.
///
/// `MetadataUnavailable` and `DateParseFailure` are recovered through the
/// filesystem fallback and never land in the error list.
/// `AttributePreservationFailure` is recorded as a warning.
#[derive(Error, Debug)]
pub enum FileError {
    #[error("Path is too long ({length} > {limit} characters): {path}")]
    PathTooLong {
        path: PathBuf,
        length: usize,
        limit: usize,
    },

    #[error("Failed to fingerprint {path}: {source}")]
    HashFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No embedded capture date in {path}")]
    MetadataUnavailable { path: PathBuf },

    #[error("Unrecognized capture date {raw:?} in {path}")]
    DateParseFailure { path: PathBuf, raw: String },

    #[error("Failed to create directory {path}: {source}")]
    DirectoryCreateFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to copy {source_path} to {destination}: {source}")]
    CopyFailure {
        source_path: PathBuf,
        destination: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Copied {path} but could not restore its {what}: {source}")]
    AttributePreservationFailure {
        path: PathBuf,
        what: &'static str,
        #[source]
        source: std::io::Error,
    },
}

impl FileError {
    /// Short machine-friendly name of the failure kind
    pub fn kind(&self) -> FailureKind {
        match self {
            FileError::PathTooLong { .. } => FailureKind::PathTooLong,
            FileError::HashFailure { .. } => FailureKind::HashFailure,
            FileError::MetadataUnavailable { .. } => FailureKind::MetadataUnavailable,
            FileError::DateParseFailure { .. } => FailureKind::DateParseFailure,
            FileError::DirectoryCreateFailure { .. } => FailureKind::DirectoryCreateFailure,
            FileError::CopyFailure { .. } => FailureKind::CopyFailure,
            FileError::AttributePreservationFailure { .. } => {
                FailureKind::AttributePreservationFailure
            }
        }
    }
}

/// Failure kinds, used by per-file state tracking and events
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum FailureKind {
    PathTooLong,
    HashFailure,
    MetadataUnavailable,
    DateParseFailure,
    DirectoryCreateFailure,
    CopyFailure,
    AttributePreservationFailure,
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, IngestError>;
