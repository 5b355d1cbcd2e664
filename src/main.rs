//! # media-ingest CLI
//!
//! Command-line interface for the media ingest pipeline.
//!
//! ## Usage
//! ```bash
//! media-ingest /Volumes/CARD ~/Pictures/Library
//! media-ingest /Volumes/CARD --preview --output json
//! ```

mod cli;

use console::style;
use std::process::ExitCode;

fn main() -> ExitCode {
    match cli::run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {}", style("error:").red().bold(), e);
            ExitCode::from(2)
        }
    }
}
