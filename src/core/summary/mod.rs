//! # Summary Module
//!
//! Run statistics for one ingest run.
//!
//! A [`BackupRecord`] is created when the run starts and shared by
//! reference with every worker. Counters are atomics and the message
//! lists sit behind mutexes, so concurrent updates need no further
//! coordination. It is never persisted; [`BackupRecord::snapshot`] turns it
//! into a plain serializable [`BackupSummary`] and
//! [`BackupRecord::render`] into the end-of-run report.

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

/// Live accumulator, safe to update from many threads
#[derive(Debug)]
pub struct BackupRecord {
    run_id: String,
    preview: bool,
    processed: AtomicU64,
    copied: AtomicU64,
    duplicates: AtomicU64,
    skipped_small: AtomicU64,
    timestamp_fixes: AtomicU64,
    failed: AtomicU64,
    bytes_copied: AtomicU64,
    bytes_saved: AtomicU64,
    errors: Mutex<Vec<String>>,
    warnings: Mutex<Vec<String>>,
    destinations: Mutex<Vec<String>>,
}

/// Frozen copy of a [`BackupRecord`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupSummary {
    pub run_id: String,
    pub preview: bool,
    /// Files that reached a terminal state
    pub processed: u64,
    /// Copied, or would be copied under preview
    pub copied: u64,
    pub duplicates: u64,
    pub skipped_small: u64,
    pub timestamp_fixes: u64,
    pub errors: u64,
    pub bytes_copied: u64,
    pub bytes_saved: u64,
    pub error_messages: Vec<String>,
    pub warning_messages: Vec<String>,
    /// Destination paths relative to the destination root, sorted
    pub destinations: Vec<String>,
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl BackupRecord {
    /// Fresh record for a run
    pub fn new(preview: bool) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            preview,
            processed: AtomicU64::new(0),
            copied: AtomicU64::new(0),
            duplicates: AtomicU64::new(0),
            skipped_small: AtomicU64::new(0),
            timestamp_fixes: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            bytes_copied: AtomicU64::new(0),
            bytes_saved: AtomicU64::new(0),
            errors: Mutex::new(Vec::new()),
            warnings: Mutex::new(Vec::new()),
            destinations: Mutex::new(Vec::new()),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn is_preview(&self) -> bool {
        self.preview
    }

    /// A unique file was copied (or planned, under preview)
    pub fn record_copied(&self, size: u64, relative_destination: &Path) {
        self.processed.fetch_add(1, Ordering::Relaxed);
        self.copied.fetch_add(1, Ordering::Relaxed);
        self.bytes_copied.fetch_add(size, Ordering::Relaxed);
        lock(&self.destinations).push(relative_destination.to_string_lossy().replace('\\', "/"));
    }

    /// Content already claimed; its bytes count as saved
    pub fn record_duplicate(&self, size: u64) {
        self.processed.fetch_add(1, Ordering::Relaxed);
        self.duplicates.fetch_add(1, Ordering::Relaxed);
        self.bytes_saved.fetch_add(size, Ordering::Relaxed);
    }

    pub fn record_skipped_small(&self) {
        self.processed.fetch_add(1, Ordering::Relaxed);
        self.skipped_small.fetch_add(1, Ordering::Relaxed);
    }

    /// Creation time was corrected; not a terminal outcome
    pub fn record_timestamp_fix(&self) {
        self.timestamp_fixes.fetch_add(1, Ordering::Relaxed);
    }

    /// A file failed; `message` already names the file
    pub fn record_error(&self, message: impl Into<String>) {
        self.processed.fetch_add(1, Ordering::Relaxed);
        self.failed.fetch_add(1, Ordering::Relaxed);
        lock(&self.errors).push(message.into());
    }

    /// Non-fatal problem that is not tied to a file's outcome
    pub fn record_warning(&self, message: impl Into<String>) {
        lock(&self.warnings).push(message.into());
    }

    pub fn copied(&self) -> u64 {
        self.copied.load(Ordering::Relaxed)
    }

    pub fn duplicates(&self) -> u64 {
        self.duplicates.load(Ordering::Relaxed)
    }

    pub fn errors(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    /// Consistent-enough copy of the current state
    pub fn snapshot(&self) -> BackupSummary {
        let mut destinations = lock(&self.destinations).clone();
        destinations.sort();

        BackupSummary {
            run_id: self.run_id.clone(),
            preview: self.preview,
            processed: self.processed.load(Ordering::Relaxed),
            copied: self.copied.load(Ordering::Relaxed),
            duplicates: self.duplicates.load(Ordering::Relaxed),
            skipped_small: self.skipped_small.load(Ordering::Relaxed),
            timestamp_fixes: self.timestamp_fixes.load(Ordering::Relaxed),
            errors: self.failed.load(Ordering::Relaxed),
            bytes_copied: self.bytes_copied.load(Ordering::Relaxed),
            bytes_saved: self.bytes_saved.load(Ordering::Relaxed),
            error_messages: lock(&self.errors).clone(),
            warning_messages: lock(&self.warnings).clone(),
            destinations,
        }
    }

    /// End-of-run report
    pub fn render(&self) -> String {
        self.snapshot().render()
    }
}

impl BackupSummary {
    /// Plain-text report: counts, byte totals, every error and warning
    pub fn render(&self) -> String {
        let mut out = String::new();
        let title = if self.preview {
            "Backup summary (preview, nothing written)"
        } else {
            "Backup summary"
        };
        let copied_label = if self.preview {
            "Would back up"
        } else {
            "Backed up"
        };

        let _ = writeln!(out, "{title}");
        let _ = writeln!(out, "  Files processed:     {}", self.processed);
        let _ = writeln!(
            out,
            "  {:<20} {} ({})",
            format!("{copied_label}:"),
            self.copied,
            format_bytes(self.bytes_copied)
        );
        let _ = writeln!(
            out,
            "  Duplicates:          {} ({} saved)",
            self.duplicates,
            format_bytes(self.bytes_saved)
        );
        let _ = writeln!(out, "  Skipped (too small): {}", self.skipped_small);
        let _ = writeln!(out, "  Timestamp fixes:     {}", self.timestamp_fixes);
        let _ = writeln!(out, "  Errors:              {}", self.errors);
        let _ = writeln!(out, "  Warnings:            {}", self.warning_messages.len());

        if !self.error_messages.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "Errors:");
            for message in &self.error_messages {
                let _ = writeln!(out, "  - {message}");
            }
        }

        if !self.warning_messages.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "Warnings:");
            for message in &self.warning_messages {
                let _ = writeln!(out, "  - {message}");
            }
        }

        out
    }
}

/// Human-readable byte count with 1024 steps
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    const TB: u64 = GB * 1024;

    if bytes >= TB {
        format!("{:.2} TB", bytes as f64 / TB as f64)
    } else if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn counters_track_outcomes() {
        let record = BackupRecord::new(false);
        record.record_copied(50 * 1024, Path::new("Images/2020-01/a.jpg"));
        record.record_duplicate(50 * 1024);
        record.record_skipped_small();
        record.record_timestamp_fix();
        record.record_error("/card/bad.jpg: unreadable");

        let summary = record.snapshot();
        assert_eq!(summary.processed, 4);
        assert_eq!(summary.copied, 1);
        assert_eq!(summary.duplicates, 1);
        assert_eq!(summary.bytes_saved, 50 * 1024);
        assert_eq!(summary.skipped_small, 1);
        assert_eq!(summary.timestamp_fixes, 1);
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.destinations, vec!["Images/2020-01/a.jpg"]);
    }

    #[test]
    fn concurrent_updates_are_not_lost() {
        let record = Arc::new(BackupRecord::new(false));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let record = Arc::clone(&record);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        record.record_duplicate(2);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(record.duplicates(), 8000);
        assert_eq!(record.snapshot().bytes_saved, 16000);
    }

    #[test]
    fn render_lists_every_error() {
        let record = BackupRecord::new(false);
        record.record_error("/card/one.jpg: Failed to fingerprint");
        record.record_error("/card/two.mp4: Failed to copy");

        let report = record.render();
        assert!(report.contains("Errors:              2"));
        assert!(report.contains("/card/one.jpg"));
        assert!(report.contains("/card/two.mp4"));
    }

    #[test]
    fn preview_report_says_would() {
        let record = BackupRecord::new(true);
        record.record_copied(10, Path::new("Audio/2019-02/x.mp3"));

        let report = record.render();
        assert!(report.contains("preview"));
        assert!(report.contains("Would back up:"));
    }

    #[test]
    fn format_bytes_units() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(50 * 1024), "50.0 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024 / 2), "1.5 MB");
        assert_eq!(format_bytes(2 * 1024 * 1024 * 1024), "2.00 GB");
    }
}
