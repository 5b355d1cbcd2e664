//! # Dedup Module
//!
//! Run-scoped index from content fingerprint to the one destination name
//! chosen for that content.
//!
//! Insertion is first-wins and entries are never overwritten. The check and
//! the insert happen under one lock, so two workers racing on the same
//! fingerprint can never both see `Inserted`.
//!
//! The index can be seeded from an existing destination tree so a second
//! run against the same library does not copy content it already holds.

use crate::core::fingerprint::{fingerprint_file, Fingerprint};
use crate::core::scanner::MediaFilter;
use crate::error::FileError;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use walkdir::WalkDir;

/// Outcome of [`DedupIndex::lookup_or_insert`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Claim {
    /// The candidate name now owns this content
    Inserted,
    /// Another file got there first; carries the winning name
    AlreadyPresent(String),
}

/// Result of fingerprinting an existing destination
#[derive(Debug, Default)]
pub struct SeedReport {
    /// Files whose content was added to the index
    pub seeded: usize,
    /// Destination files with content already seen elsewhere in the tree
    pub redundant: usize,
    /// Files that could not be fingerprinted
    pub failures: Vec<FileError>,
}

/// Fingerprint -> destination name, shared between workers
#[derive(Debug, Default)]
pub struct DedupIndex {
    entries: Mutex<HashMap<Fingerprint, String>>,
}

impl DedupIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically claim `fingerprint` for `candidate`, or report who owns it.
    pub fn lookup_or_insert(&self, fingerprint: Fingerprint, candidate: &str) -> Claim {
        // A poisoned lock only means another worker panicked mid-insert;
        // the map itself is still consistent.
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        match entries.get(&fingerprint) {
            Some(existing) => Claim::AlreadyPresent(existing.clone()),
            None => {
                entries.insert(fingerprint, candidate.to_string());
                Claim::Inserted
            }
        }
    }

    /// Name currently owning `fingerprint`, if any
    pub fn get(&self, fingerprint: &Fingerprint) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(fingerprint)
            .cloned()
    }

    /// Number of distinct contents claimed
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fingerprint every media file already under `root` and claim its
    /// content under its path relative to `root`.
    ///
    /// A missing `root` seeds nothing. Read-only: nothing under `root` is
    /// modified.
    pub fn seed_from_destination(&self, root: &Path) -> SeedReport {
        let mut report = SeedReport::default();
        if !root.is_dir() {
            return report;
        }

        let filter = MediaFilter::new().with_hidden(false);

        for entry in WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let path = entry.path();
            if !filter.should_include(path) {
                continue;
            }

            let name = path
                .strip_prefix(root)
                .unwrap_or(path)
                .to_string_lossy()
                .replace('\\', "/");

            match fingerprint_file(path) {
                Ok(fingerprint) => match self.lookup_or_insert(fingerprint, &name) {
                    Claim::Inserted => report.seeded += 1,
                    Claim::AlreadyPresent(_) => report.redundant += 1,
                },
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "could not index destination file");
                    report.failures.push(e);
                }
            }
        }

        tracing::info!(
            root = %root.display(),
            seeded = report.seeded,
            redundant = report.redundant,
            failures = report.failures.len(),
            "indexed existing destination"
        );

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Arc;
    use std::thread;
    use tempfile::TempDir;

    #[test]
    fn first_insert_wins() {
        let index = DedupIndex::new();
        let fp = Fingerprint::of_bytes(b"photo");

        assert_eq!(index.lookup_or_insert(fp, "first.jpg"), Claim::Inserted);
        assert_eq!(
            index.lookup_or_insert(fp, "second.jpg"),
            Claim::AlreadyPresent("first.jpg".to_string())
        );
        assert_eq!(index.get(&fp).as_deref(), Some("first.jpg"));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn concurrent_claims_have_exactly_one_winner() {
        let index = Arc::new(DedupIndex::new());
        let fp = Fingerprint::of_bytes(b"contended");

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let index = Arc::clone(&index);
                thread::spawn(move || index.lookup_or_insert(fp, &format!("worker-{i}.jpg")))
            })
            .collect();

        let claims: Vec<Claim> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let winners = claims.iter().filter(|c| **c == Claim::Inserted).count();

        assert_eq!(winners, 1);
        let owner = index.get(&fp).unwrap();
        for claim in claims {
            if let Claim::AlreadyPresent(existing) = claim {
                assert_eq!(existing, owner);
            }
        }
    }

    #[test]
    fn seeding_indexes_existing_library() {
        let dest = TempDir::new().unwrap();
        let month = dest.path().join("Images/2020-01");
        fs::create_dir_all(&month).unwrap();
        fs::write(month.join("20200101_120000_aaaa.jpg"), b"library photo").unwrap();
        fs::write(month.join("20200101_120000_bbbb.jpg"), b"library photo").unwrap();
        fs::write(month.join("notes.txt"), b"not media").unwrap();

        let index = DedupIndex::new();
        let report = index.seed_from_destination(dest.path());

        assert_eq!(report.seeded, 1);
        assert_eq!(report.redundant, 1);
        assert!(report.failures.is_empty());
        assert_eq!(
            index.get(&Fingerprint::of_bytes(b"library photo")).as_deref(),
            Some("Images/2020-01/20200101_120000_aaaa.jpg")
        );
    }

    #[test]
    fn seeding_missing_destination_is_empty() {
        let index = DedupIndex::new();
        let report = index.seed_from_destination(Path::new("/nonexistent/library"));

        assert_eq!(report.seeded, 0);
        assert!(index.is_empty());
    }
}
