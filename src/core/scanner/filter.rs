//! File filtering logic for the scanner.

use crate::core::organize::Category;
use std::path::Path;

/// Decides which directory entries are candidate media files
pub struct MediaFilter {
    /// Whether to include hidden files
    include_hidden: bool,
}

impl MediaFilter {
    /// Create a filter over the recognized media extensions
    pub fn new() -> Self {
        Self {
            include_hidden: false,
        }
    }

    /// Include hidden files (starting with .)
    pub fn with_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    /// Check if a file should be included
    pub fn should_include(&self, path: &Path) -> bool {
        if !self.include_hidden && is_hidden_name(path) {
            return false;
        }

        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(Category::is_recognized)
    }

    /// Check if the walker should descend into a directory
    pub fn should_descend(&self, path: &Path, depth: usize) -> bool {
        depth == 0 || self.include_hidden || !is_hidden_name(path)
    }
}

impl Default for MediaFilter {
    fn default() -> Self {
        Self::new()
    }
}

fn is_hidden_name(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_includes_images_videos_and_audio() {
        let filter = MediaFilter::new();
        assert!(filter.should_include(Path::new("/card/IMG_0001.JPG")));
        assert!(filter.should_include(Path::new("/card/raw/DSC_0001.nef")));
        assert!(filter.should_include(Path::new("/card/clip.MOV")));
        assert!(filter.should_include(Path::new("/music/track.flac")));
    }

    #[test]
    fn filter_excludes_non_media() {
        let filter = MediaFilter::new();
        assert!(!filter.should_include(Path::new("/card/notes.txt")));
        assert!(!filter.should_include(Path::new("/card/manual.pdf")));
        assert!(!filter.should_include(Path::new("/card/no_extension")));
    }

    #[test]
    fn filter_excludes_hidden_by_default() {
        let filter = MediaFilter::new();
        assert!(!filter.should_include(Path::new("/card/._IMG_0001.JPG")));
        assert!(filter
            .with_hidden(true)
            .should_include(Path::new("/card/._IMG_0001.JPG")));
    }

    #[test]
    fn root_is_always_descended() {
        let filter = MediaFilter::new();
        assert!(filter.should_descend(Path::new("/tmp/.staging"), 0));
        assert!(!filter.should_descend(Path::new("/tmp/.staging/.thumbnails"), 1));
    }
}
