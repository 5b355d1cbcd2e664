//! # Media Ingest
//!
//! Backs up photos, videos and audio from a card or folder into a dated
//! library, copying each distinct piece of content exactly once.
//!
//! ## Core Philosophy
//! - **Never touch the source** - files are only ever read
//! - **Never lose a date** - capture dates come from embedded metadata,
//!   with corrected filesystem dates as the fallback
//! - **One copy per content** - byte-identical files are copied once
//!
//! ## Architecture
//! The library is split into a core engine and presentation layers:
//! - `core` - The ingest engine
//! - `events` - Event-driven progress reporting
//! - `error` - User-friendly error types

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use error::{IngestError, Result};

/// Initialize tracing for the library
///
/// This should be called by the application entry point. `RUST_LOG` wins
/// over the default level, which is `debug` when `verbose` and `warn`
/// otherwise. Calling it twice is harmless.
pub fn init_tracing(verbose: bool) {
    let default = if verbose { "media_ingest=debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
