//! # Core Module
//!
//! The presentation-agnostic ingest engine.
//!
//! ## Modules
//! - `scanner` - Discovers media files under the source
//! - `fingerprint` - Hashes file contents
//! - `dedup` - Decides which file owns each piece of content
//! - `metadata` - Resolves capture dates from embedded metadata
//! - `organize` - Names, places and copies unique files
//! - `summary` - Run statistics and the end-of-run report
//! - `pipeline` - Orchestrates the full workflow

pub mod dedup;
pub mod fingerprint;
pub mod metadata;
pub mod organize;
pub mod pipeline;
pub mod scanner;
pub mod summary;

// Re-export commonly used types
pub use fingerprint::Fingerprint;
pub use metadata::{DateProvenance, MetadataProvider, ResolvedDate};
pub use organize::Category;
pub use pipeline::{CancellationToken, Pipeline, PipelineResult, RunOutcome};
pub use scanner::MediaFile;
pub use summary::{BackupRecord, BackupSummary};
