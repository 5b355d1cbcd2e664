//! # Metadata Module
//!
//! Resolves the date a photo or video was actually captured.
//!
//! ## Sources
//! - Images: EXIF `DateTimeOriginal`, then `DateTimeDigitized`, then `DateTime`
//! - Videos: MP4/MOV movie header creation time
//! - Audio and everything else: filesystem dates only
//!
//! ## Fallback
//! When no embedded date is available or it cannot be parsed, the
//! filesystem dates are used. A creation time later than the modification
//! time is treated as a reset stamp and replaced by the modification time;
//! the correction is reported as a timestamp fix.
//!
//! Providers are pluggable through [`MetadataProvider`], so tests can feed
//! canned, malformed, missing or slow answers.

mod mp4;
mod parse;
mod provider;
mod resolver;

pub use mp4::{media_created, read_media_created};
pub use parse::{normalize, parse_capture_date};
pub use provider::{ContainerMetadataProvider, DateField, MetadataProvider};
pub use resolver::{
    corrected_creation, DateProvenance, EmbeddedDate, MetadataResolver, ResolvedDate,
    DEFAULT_METADATA_TIMEOUT,
};
