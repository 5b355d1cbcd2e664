//! Metadata providers: where raw capture-date strings come from.

use super::mp4;
use crate::core::organize::Category;
use chrono::Local;
use exif::{In, Reader, Tag, Value};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Which embedded field holds the capture date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateField {
    /// Photo "date taken"
    DateTaken,
    /// Video "media created"
    MediaCreated,
}

impl DateField {
    /// The field to consult for a category; audio and other files have none
    pub fn for_category(category: Category) -> Option<Self> {
        match category {
            Category::Images => Some(DateField::DateTaken),
            Category::Videos => Some(DateField::MediaCreated),
            Category::Audio | Category::Other => None,
        }
    }
}

/// Opaque source of embedded capture dates.
///
/// Implementations return the raw text of the requested field, untouched;
/// parsing and cleanup happen in the resolver. Calls may block, and the
/// resolver bounds them with a timeout.
pub trait MetadataProvider: Send + Sync {
    fn capture_date(&self, path: &Path, field: DateField) -> Option<String>;
}

/// Reads capture dates straight out of the file container:
/// EXIF for images, the `mvhd` box for MP4/MOV video.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContainerMetadataProvider;

impl MetadataProvider for ContainerMetadataProvider {
    fn capture_date(&self, path: &Path, field: DateField) -> Option<String> {
        match field {
            DateField::DateTaken => exif_date_taken(path),
            DateField::MediaCreated => mp4::media_created(path).map(|utc| {
                utc.with_timezone(&Local)
                    .format("%Y-%m-%d %H:%M:%S")
                    .to_string()
            }),
        }
    }
}

/// EXIF tags carrying a capture date, most specific first
const DATE_TAGS: &[Tag] = &[Tag::DateTimeOriginal, Tag::DateTimeDigitized, Tag::DateTime];

fn exif_date_taken(path: &Path) -> Option<String> {
    let file = File::open(path).ok()?;
    let mut reader = BufReader::new(file);
    let exif = Reader::new().read_from_container(&mut reader).ok()?;

    DATE_TAGS.iter().find_map(|tag| {
        let field = exif.get_field(*tag, In::PRIMARY)?;
        match field.value {
            Value::Ascii(ref vec) => vec
                .first()
                .and_then(|bytes| std::str::from_utf8(bytes).ok())
                .map(|s| s.trim_end_matches('\0').trim().to_string())
                .filter(|s| !s.is_empty()),
            _ => None,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn fields_follow_category() {
        assert_eq!(DateField::for_category(Category::Images), Some(DateField::DateTaken));
        assert_eq!(
            DateField::for_category(Category::Videos),
            Some(DateField::MediaCreated)
        );
        assert_eq!(DateField::for_category(Category::Audio), None);
    }

    #[test]
    fn container_provider_tolerates_missing_files() {
        let provider = ContainerMetadataProvider;
        assert_eq!(
            provider.capture_date(Path::new("/nonexistent/a.jpg"), DateField::DateTaken),
            None
        );
        assert_eq!(
            provider.capture_date(Path::new("/nonexistent/a.mp4"), DateField::MediaCreated),
            None
        );
    }

    #[test]
    fn container_provider_tolerates_non_exif_images() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("fake.jpg");
        File::create(&path)
            .unwrap()
            .write_all(b"definitely not a jpeg")
            .unwrap();

        assert_eq!(
            ContainerMetadataProvider.capture_date(&path, DateField::DateTaken),
            None
        );
    }
}
