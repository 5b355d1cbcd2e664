//! Types for the organize module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "jpe", "png", "gif", "bmp", "tif", "tiff", "webp", "heic", "heif", "avif",
    "raw", "cr2", "cr3", "crw", "nef", "nrw", "arw", "srf", "sr2", "orf", "rw2", "raf", "dng",
    "pef", "srw", "x3f", "3fr", "erf", "kdc", "mrw", "psd",
];

const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "m4v", "mov", "qt", "avi", "mkv", "webm", "wmv", "flv", "mpg", "mpeg", "m2ts", "mts",
    "3gp", "3g2", "vob",
];

const AUDIO_EXTENSIONS: &[&str] = &[
    "mp3", "flac", "wav", "aac", "m4a", "ogg", "oga", "opus", "wma", "aiff", "aif", "alac", "ape",
];

/// Top-level destination folder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Images,
    Videos,
    Audio,
    Other,
}

impl Category {
    /// Classify an extension (with or without a leading dot, any case).
    ///
    /// Every recognized extension lands in Images, Videos or Audio; only
    /// unrecognized extensions become Other.
    pub fn from_extension(ext: &str) -> Self {
        let ext = ext.trim_start_matches('.').to_lowercase();
        let ext = ext.as_str();

        if IMAGE_EXTENSIONS.contains(&ext) {
            Category::Images
        } else if VIDEO_EXTENSIONS.contains(&ext) {
            Category::Videos
        } else if AUDIO_EXTENSIONS.contains(&ext) {
            Category::Audio
        } else {
            Category::Other
        }
    }

    /// Whether the extension belongs to the recognized media set
    pub fn is_recognized(ext: &str) -> bool {
        Self::from_extension(ext) != Category::Other
    }

    /// Folder name under the destination root
    pub fn folder_name(&self) -> &'static str {
        match self {
            Category::Images => "Images",
            Category::Videos => "Videos",
            Category::Audio => "Audio",
            Category::Other => "Other",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.folder_name())
    }
}

/// Where a unique file goes, relative to the destination root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub category: Category,
    /// `YYYY-MM` of the resolved date
    pub month_folder: String,
    /// `<YYYYMMDD_HHMMSS>_<fingerprint prefix>.<ext>`
    pub filename: String,
}

impl Placement {
    /// `<Category>/<YYYY-MM>/<filename>`
    pub fn relative_path(&self) -> PathBuf {
        PathBuf::from(self.category.folder_name())
            .join(&self.month_folder)
            .join(&self.filename)
    }
}

/// What the copier did (or would have done) with one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CopyReport {
    /// Bytes written and the file renamed into place
    Copied {
        destination: PathBuf,
        /// Attribute or timestamp restoration problems; the copy stands
        warnings: Vec<String>,
    },
    /// Preview mode: nothing was written
    Planned { destination: PathBuf },
}

impl CopyReport {
    pub fn destination(&self) -> &PathBuf {
        match self {
            CopyReport::Copied { destination, .. } | CopyReport::Planned { destination } => {
                destination
            }
        }
    }
}
