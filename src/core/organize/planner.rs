//! Placement and naming for unique files.

use super::types::{Category, Placement};
use crate::core::fingerprint::Fingerprint;
use crate::core::metadata::ResolvedDate;
use crate::core::scanner::MediaFile;
use chrono::{DateTime, Local};

/// Hex characters of the fingerprint kept in the filename (64 bits)
pub const FINGERPRINT_PREFIX_LEN: usize = 16;

/// Builds destination placements. Pure: no filesystem access.
pub struct OrganizePlanner;

impl OrganizePlanner {
    /// Where `file` goes given its resolved date and fingerprint
    pub fn plan(file: &MediaFile, date: &ResolvedDate, fingerprint: &Fingerprint) -> Placement {
        Placement {
            category: Category::from_extension(&file.extension),
            month_folder: Self::month_folder(&date.created),
            filename: Self::filename(&date.created, fingerprint, &file.extension),
        }
    }

    /// `YYYY-MM`
    pub fn month_folder(date: &DateTime<Local>) -> String {
        date.format("%Y-%m").to_string()
    }

    /// `<YYYYMMDD_HHMMSS>_<prefix>.<ext>`; no trailing dot without an extension.
    pub fn filename(date: &DateTime<Local>, fingerprint: &Fingerprint, extension: &str) -> String {
        let stamp = date.format("%Y%m%d_%H%M%S");
        let prefix = fingerprint.hex_prefix(FINGERPRINT_PREFIX_LEN);
        let extension = extension.trim_start_matches('.').to_lowercase();

        if extension.is_empty() {
            format!("{stamp}_{prefix}")
        } else {
            format!("{stamp}_{prefix}.{extension}")
        }
    }
}
