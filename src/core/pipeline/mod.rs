//! # Pipeline Module
//!
//! Orchestrates a full ingest run.
//!
//! ## Pipeline Stages
//! 1. **Scan** - Enumerate media files under the source, sorted per directory
//! 2. **Seed** - Fingerprint what the destination already holds
//! 3. **Analyze** - Size filter and content fingerprint, then date resolution
//!    and naming for each new piece of content
//! 4. **Commit** - Claim content in traversal order, so the first file wins
//! 5. **Transfer** - Copy unique files and restore their dates and attributes
//!
//! ## Parallelism
//! Analyze and Transfer run on a bounded rayon pool. Commit is sequential,
//! which keeps the choice between identical files independent of scheduling.

mod cancel;
mod executor;
mod state;

pub use cancel::CancellationToken;
pub use executor::{
    Pipeline, PipelineBuilder, PipelineConfig, PipelineResult, RunOutcome, DEFAULT_MIN_FILE_SIZE,
};
pub use state::{FileState, FileTracker, IllegalTransition};
