//! Directory walking implementation using walkdir.

use super::{filter::MediaFilter, MediaFile, MediaScanner, ScanResult};
use crate::error::ScanError;
use crate::events::{Event, EventSender, ScanEvent, ScanProgress};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Configuration for the directory scanner
#[derive(Debug, Clone, Default)]
pub struct ScanConfig {
    /// Whether to follow symbolic links
    pub follow_symlinks: bool,
    /// Whether to include hidden files and directories
    pub include_hidden: bool,
    /// Directories to prune from the walk, e.g. a destination nested
    /// inside the source
    pub exclude: Vec<PathBuf>,
}

/// Scanner implementation using the walkdir crate
pub struct WalkDirScanner {
    config: ScanConfig,
    filter: MediaFilter,
    excluded: Vec<PathBuf>,
}

impl WalkDirScanner {
    /// Create a new scanner with the given configuration
    pub fn new(config: ScanConfig) -> Self {
        let filter = MediaFilter::new().with_hidden(config.include_hidden);
        let excluded = config
            .exclude
            .iter()
            .filter_map(|p| fs::canonicalize(p).ok())
            .collect();

        Self {
            config,
            filter,
            excluded,
        }
    }

    fn is_excluded(&self, entry: &DirEntry) -> bool {
        if self.excluded.is_empty() || entry.depth() == 0 || !entry.file_type().is_dir() {
            return false;
        }
        fs::canonicalize(entry.path())
            .map(|p| self.excluded.contains(&p))
            .unwrap_or(false)
    }

    fn keep_entry(&self, entry: &DirEntry) -> bool {
        if entry.file_type().is_dir() {
            return self.filter.should_descend(entry.path(), entry.depth())
                && !self.is_excluded(entry);
        }
        true
    }

    fn scan_directory(
        &self,
        root: &Path,
        events: &EventSender,
    ) -> Result<ScanResult, ScanError> {
        if !root.is_dir() {
            return Err(ScanError::DirectoryNotFound {
                path: root.to_path_buf(),
            });
        }

        let mut files = Vec::new();
        let mut errors = Vec::new();
        let mut directories_scanned = 0;

        // Sorted traversal keeps "first encountered" stable across runs
        let walker = WalkDir::new(root)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name();

        for entry_result in walker.into_iter().filter_entry(|e| self.keep_entry(e)) {
            let entry = match entry_result {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_default();
                    let error = if e.io_error().map(|io| io.kind())
                        == Some(std::io::ErrorKind::PermissionDenied)
                    {
                        ScanError::PermissionDenied { path: path.clone() }
                    } else {
                        ScanError::ReadEntry {
                            path: path.clone(),
                            source: std::io::Error::new(
                                std::io::ErrorKind::Other,
                                e.to_string(),
                            ),
                        }
                    };

                    events.send(Event::Scan(ScanEvent::Error {
                        path,
                        message: error.to_string(),
                    }));
                    errors.push(error);
                    continue;
                }
            };

            let path = entry.path();

            if entry.file_type().is_dir() {
                directories_scanned += 1;
                events.send(Event::Scan(ScanEvent::Progress(ScanProgress {
                    directories_scanned,
                    files_found: files.len(),
                    current_path: path.to_path_buf(),
                })));
                continue;
            }

            if !self.filter.should_include(path) {
                continue;
            }

            match entry.metadata() {
                Ok(metadata) if metadata.is_file() => {
                    events.send(Event::Scan(ScanEvent::FileFound {
                        path: path.to_path_buf(),
                    }));
                    files.push(MediaFile::from_metadata(path, &metadata));
                }
                Ok(_) => {}
                Err(e) => {
                    let error = ScanError::ReadEntry {
                        path: path.to_path_buf(),
                        source: std::io::Error::new(std::io::ErrorKind::Other, e.to_string()),
                    };
                    events.send(Event::Scan(ScanEvent::Error {
                        path: path.to_path_buf(),
                        message: error.to_string(),
                    }));
                    errors.push(error);
                }
            }
        }

        tracing::debug!(
            root = %root.display(),
            directories_scanned,
            files = files.len(),
            errors = errors.len(),
            "scan finished"
        );

        Ok(ScanResult { files, errors })
    }
}

impl MediaScanner for WalkDirScanner {
    fn scan(&self, root: &Path) -> Result<ScanResult, ScanError> {
        self.scan_with_events(root, &crate::events::null_sender())
    }

    fn scan_with_events(
        &self,
        root: &Path,
        events: &EventSender,
    ) -> Result<ScanResult, ScanError> {
        events.send(Event::Scan(ScanEvent::Started {
            root: root.to_path_buf(),
        }));

        let result = self.scan_directory(root, events)?;

        events.send(Event::Scan(ScanEvent::Completed {
            total_files: result.files.len(),
        }));

        Ok(result)
    }
}
