//! # Scanner Module
//!
//! Discovers media files under a source root.
//!
//! One traversal, one extension filter: the tree is walked exactly once and
//! each entry is checked against the closed set of recognized extensions
//! (see [`Category`](crate::core::organize::Category)).
//!
//! ## Example
//! ```rust,ignore
//! use media_ingest::core::scanner::{MediaScanner, ScanConfig, WalkDirScanner};
//!
//! let scanner = WalkDirScanner::new(ScanConfig::default());
//! let result = scanner.scan(Path::new("/Volumes/CARD"))?;
//! ```

mod filter;
mod walker;

pub use filter::MediaFilter;
pub use walker::{ScanConfig, WalkDirScanner};

use crate::core::organize::Category;
use crate::error::ScanError;
use crate::events::EventSender;
use serde::{Deserialize, Serialize};
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Snapshot of a discovered media file, taken once at discovery time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaFile {
    /// Path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Lowercased extension without the dot; empty when there is none
    pub extension: String,
    /// Creation time (modification time when the platform has none)
    pub created: SystemTime,
    /// Last modified time
    pub modified: SystemTime,
    /// Last access time
    pub accessed: SystemTime,
    /// Platform attributes to carry over to the copy
    pub attributes: FileAttributes,
}

impl MediaFile {
    /// Stat `path` and snapshot it.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let metadata = std::fs::metadata(path)?;
        Ok(Self::from_metadata(path, &metadata))
    }

    /// Snapshot from metadata the caller already holds.
    pub fn from_metadata(path: &Path, metadata: &Metadata) -> Self {
        let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        let created = metadata.created().unwrap_or(modified);
        let accessed = metadata.accessed().unwrap_or(modified);

        Self {
            path: path.to_path_buf(),
            size: metadata.len(),
            extension: path
                .extension()
                .and_then(|e| e.to_str())
                .map(str::to_lowercase)
                .unwrap_or_default(),
            created,
            modified,
            accessed,
            attributes: FileAttributes::from_metadata(metadata),
        }
    }

    /// Category derived from the extension
    pub fn category(&self) -> Category {
        Category::from_extension(&self.extension)
    }

    /// Bare file name, for progress display
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Platform attributes captured at discovery.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAttributes {
    /// Unix permission bits
    pub mode: Option<u32>,
    /// Raw Windows file attribute flags, hidden and read-only included
    pub windows_flags: Option<u32>,
}

impl FileAttributes {
    #[cfg(unix)]
    fn from_metadata(metadata: &Metadata) -> Self {
        use std::os::unix::fs::PermissionsExt;

        Self {
            mode: Some(metadata.permissions().mode() & 0o7777),
            windows_flags: None,
        }
    }

    #[cfg(windows)]
    fn from_metadata(metadata: &Metadata) -> Self {
        use std::os::windows::fs::MetadataExt;

        Self {
            mode: None,
            windows_flags: Some(metadata.file_attributes()),
        }
    }

    #[cfg(not(any(unix, windows)))]
    fn from_metadata(_metadata: &Metadata) -> Self {
        Self::default()
    }
}

/// Result of a scan operation
#[derive(Debug)]
pub struct ScanResult {
    /// Discovered media files in traversal order
    pub files: Vec<MediaFile>,
    /// Errors that occurred during scanning (non-fatal)
    pub errors: Vec<ScanError>,
}

/// Trait for media scanners
///
/// Implement this trait to feed the pipeline from somewhere other than
/// a directory walk (e.g., in tests).
pub trait MediaScanner: Send + Sync {
    /// Scan a root and return the discovered media files
    fn scan(&self, root: &Path) -> Result<ScanResult, ScanError>;

    /// Scan with progress reporting via events
    fn scan_with_events(&self, root: &Path, events: &EventSender)
        -> Result<ScanResult, ScanError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn snapshot_lowercases_extension() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("IMG_0001.JPG");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(b"jpeg bytes")
            .unwrap();

        let file = MediaFile::from_path(&path).unwrap();

        assert_eq!(file.extension, "jpg");
        assert_eq!(file.size, 10);
        assert_eq!(file.category(), Category::Images);
        assert_eq!(file.file_name(), "IMG_0001.JPG");
    }

    #[test]
    fn snapshot_without_extension_is_other() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("README");
        std::fs::File::create(&path).unwrap();

        let file = MediaFile::from_path(&path).unwrap();

        assert_eq!(file.extension, "");
        assert_eq!(file.category(), Category::Other);
    }

    #[cfg(unix)]
    #[test]
    fn unix_mode_bits_are_captured() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("IMG_0001.jpg");
        std::fs::File::create(&path).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o640)).unwrap();

        let file = MediaFile::from_path(&path).unwrap();

        assert_eq!(file.attributes.mode, Some(0o640));
        assert_eq!(file.attributes.windows_flags, None);
    }
}
