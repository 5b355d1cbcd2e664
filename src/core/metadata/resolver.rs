//! Capture-date resolution with filesystem fallback.

use super::parse::parse_capture_date;
use super::provider::{DateField, MetadataProvider};
use crate::core::scanner::MediaFile;
use crate::error::FileError;
use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use crossbeam_channel::RecvTimeoutError;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// Default bound on a single provider call
pub const DEFAULT_METADATA_TIMEOUT: Duration = Duration::from_secs(5);

/// Default cap on lookup threads alive at once, stalled ones included
const DEFAULT_MAX_LOOKUPS: usize = 64;

/// Capture date read from inside the file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedDate {
    pub date: NaiveDateTime,
    /// Text as the provider returned it
    pub raw: String,
}

/// Where a resolved date came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateProvenance {
    Metadata,
    FilesystemCorrected,
}

/// The dates used to place, name and stamp a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedDate {
    /// Capture date; drives the folder and the filename
    pub created: DateTime<Local>,
    /// Modification time to apply to the copy; never before `created`
    pub modified: DateTime<Local>,
    pub provenance: DateProvenance,
    /// Filesystem creation time was later than modification time and
    /// has been replaced by it
    pub timestamp_fixed: bool,
    /// Raw metadata text when provenance is `Metadata`
    pub raw: Option<String>,
}

impl ResolvedDate {
    /// Dates from embedded metadata.
    pub fn from_metadata(file: &MediaFile, embedded: EmbeddedDate) -> Self {
        let created = to_local(embedded.date);
        let fs_modified = DateTime::<Local>::from(file.modified);

        Self {
            created,
            modified: created.max(fs_modified),
            provenance: DateProvenance::Metadata,
            timestamp_fixed: false,
            raw: Some(embedded.raw),
        }
    }

    /// Dates from the filesystem, with the creation > modification swap rule.
    ///
    /// A creation time later than the modification time means the file was
    /// copied or restored and its creation stamp reset; the modification
    /// time is the better estimate.
    pub fn from_filesystem(file: &MediaFile) -> Self {
        let (created, timestamp_fixed) = corrected_creation(file.created, file.modified);

        Self {
            created: DateTime::<Local>::from(created),
            modified: DateTime::<Local>::from(file.modified),
            provenance: DateProvenance::FilesystemCorrected,
            timestamp_fixed,
            raw: None,
        }
    }
}

/// Apply the swap rule; returns the corrected creation time and whether
/// a correction was made.
pub fn corrected_creation(created: SystemTime, modified: SystemTime) -> (SystemTime, bool) {
    if created > modified {
        (modified, true)
    } else {
        (created, false)
    }
}

/// Naive wall-clock time in the local zone; DST gaps resolve as UTC.
fn to_local(naive: NaiveDateTime) -> DateTime<Local> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .unwrap_or_else(|| Local.from_utc_datetime(&naive))
}

/// Resolves capture dates through a [`MetadataProvider`].
///
/// With a timeout, each provider call runs on its own lookup thread. A lookup
/// that outlives its timeout is abandoned but still counts against the lookup
/// cap until it returns; once the cap is reached, lookups report no metadata
/// instead of spawning more threads.
#[derive(Clone)]
pub struct MetadataResolver {
    provider: Arc<dyn MetadataProvider>,
    timeout: Option<Duration>,
    max_lookups: usize,
    lookups: Arc<AtomicUsize>,
}

/// One live lookup thread; released on drop
struct LookupSlot(Arc<AtomicUsize>);

impl LookupSlot {
    fn acquire(lookups: &Arc<AtomicUsize>, limit: usize) -> Option<Self> {
        lookups
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < limit).then_some(n + 1)
            })
            .ok()
            .map(|_| LookupSlot(Arc::clone(lookups)))
    }
}

impl Drop for LookupSlot {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

impl MetadataResolver {
    /// Resolver with the default timeout
    pub fn new(provider: Arc<dyn MetadataProvider>) -> Self {
        Self {
            provider,
            timeout: Some(DEFAULT_METADATA_TIMEOUT),
            max_lookups: DEFAULT_MAX_LOOKUPS,
            lookups: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Bound each provider call; `None` calls the provider inline.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Cap the lookup threads alive at once
    pub fn with_max_lookups(mut self, max_lookups: usize) -> Self {
        self.max_lookups = max_lookups.max(1);
        self
    }

    /// Resolve the dates for `file`, falling back to the filesystem.
    pub fn resolve(&self, file: &MediaFile) -> ResolvedDate {
        match self.embedded_date(file) {
            Ok(embedded) => ResolvedDate::from_metadata(file, embedded),
            Err(reason) => {
                tracing::debug!(path = %file.path.display(), %reason, "using filesystem dates");
                ResolvedDate::from_filesystem(file)
            }
        }
    }

    /// Read and parse the embedded capture date.
    ///
    /// Errors are always `MetadataUnavailable` or `DateParseFailure`; both
    /// are recoverable.
    pub fn embedded_date(&self, file: &MediaFile) -> Result<EmbeddedDate, FileError> {
        let unavailable = || FileError::MetadataUnavailable {
            path: file.path.clone(),
        };

        let field = DateField::for_category(file.category()).ok_or_else(unavailable)?;
        let raw = self.query(file, field).ok_or_else(unavailable)?;

        match parse_capture_date(&raw) {
            Some(date) => Ok(EmbeddedDate { date, raw }),
            None => Err(FileError::DateParseFailure {
                path: file.path.clone(),
                raw,
            }),
        }
    }

    fn query(&self, file: &MediaFile, field: DateField) -> Option<String> {
        let Some(timeout) = self.timeout else {
            return self.provider.capture_date(&file.path, field);
        };

        let Some(slot) = LookupSlot::acquire(&self.lookups, self.max_lookups) else {
            tracing::warn!(
                path = %file.path.display(),
                limit = self.max_lookups,
                "too many stalled metadata lookups, skipping"
            );
            return None;
        };

        let (tx, rx) = crossbeam_channel::bounded(1);
        let provider = Arc::clone(&self.provider);
        let path = file.path.clone();

        // A stalled provider keeps its thread and its slot; we stop waiting.
        let spawned = std::thread::Builder::new()
            .name("metadata-lookup".to_string())
            .spawn(move || {
                let _slot = slot;
                let _ = tx.send(provider.capture_date(&path, field));
            });

        if let Err(e) = spawned {
            tracing::warn!(error = %e, "could not spawn metadata lookup");
            return None;
        }

        match rx.recv_timeout(timeout) {
            Ok(value) => value,
            Err(RecvTimeoutError::Timeout) => {
                tracing::warn!(
                    path = %file.path.display(),
                    timeout_ms = timeout.as_millis() as u64,
                    "metadata lookup timed out"
                );
                None
            }
            Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scanner::FileAttributes;
    use chrono::Datelike;
    use std::path::{Path, PathBuf};

    struct CannedProvider(Option<&'static str>);

    impl MetadataProvider for CannedProvider {
        fn capture_date(&self, _path: &Path, _field: DateField) -> Option<String> {
            self.0.map(str::to_string)
        }
    }

    struct SlowProvider(Duration);

    impl MetadataProvider for SlowProvider {
        fn capture_date(&self, _path: &Path, _field: DateField) -> Option<String> {
            std::thread::sleep(self.0);
            Some("2001:01:01 00:00:00".to_string())
        }
    }

    fn local(y: i32, m: u32, d: u32) -> SystemTime {
        Local.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap().into()
    }

    fn media(name: &str, created: SystemTime, modified: SystemTime) -> MediaFile {
        let path = PathBuf::from("/card").join(name);
        MediaFile {
            extension: path
                .extension()
                .map(|e| e.to_string_lossy().to_lowercase())
                .unwrap_or_default(),
            path,
            size: 50 * 1024,
            created,
            modified,
            accessed: modified,
            attributes: FileAttributes::default(),
        }
    }

    fn resolver(provider: impl MetadataProvider + 'static) -> MetadataResolver {
        MetadataResolver::new(Arc::new(provider))
    }

    #[test]
    fn embedded_date_beats_filesystem_dates() {
        let file = media("IMG_0001.JPG", local(2024, 6, 1), local(2024, 6, 1));
        let resolved = resolver(CannedProvider(Some("2020:01:01 10:00:00"))).resolve(&file);

        assert_eq!(resolved.provenance, DateProvenance::Metadata);
        assert_eq!((resolved.created.year(), resolved.created.month()), (2020, 1));
        assert_eq!(resolved.raw.as_deref(), Some("2020:01:01 10:00:00"));
        assert!(!resolved.timestamp_fixed);
        assert!(resolved.created <= resolved.modified);
    }

    #[test]
    fn unparseable_metadata_falls_back_with_swap() {
        let file = media("IMG_0002.JPG", local(2024, 6, 1), local(2019, 3, 15));
        let resolver = resolver(CannedProvider(Some("garbage")));

        assert!(matches!(
            resolver.embedded_date(&file),
            Err(FileError::DateParseFailure { .. })
        ));

        let resolved = resolver.resolve(&file);
        assert_eq!(resolved.provenance, DateProvenance::FilesystemCorrected);
        assert!(resolved.timestamp_fixed);
        assert_eq!(resolved.created, DateTime::<Local>::from(local(2019, 3, 15)));
        assert_eq!(resolved.created, resolved.modified);
    }

    #[test]
    fn consistent_filesystem_dates_are_kept() {
        let file = media("song.mp3", local(2018, 1, 1), local(2018, 2, 1));
        let resolved = resolver(CannedProvider(Some("2020:01:01 10:00:00"))).resolve(&file);

        // audio has no capture-date field, so the provider is never asked
        assert_eq!(resolved.provenance, DateProvenance::FilesystemCorrected);
        assert!(!resolved.timestamp_fixed);
        assert_eq!(resolved.created, DateTime::<Local>::from(local(2018, 1, 1)));
    }

    #[test]
    fn absent_metadata_is_unavailable() {
        let file = media("clip.mp4", local(2018, 1, 1), local(2018, 1, 1));
        let resolver = resolver(CannedProvider(None));

        assert!(matches!(
            resolver.embedded_date(&file),
            Err(FileError::MetadataUnavailable { .. })
        ));
    }

    #[test]
    fn slow_provider_times_out_to_filesystem() {
        let file = media("IMG_0003.JPG", local(2017, 5, 5), local(2017, 5, 6));
        let resolver = resolver(SlowProvider(Duration::from_millis(500)))
            .with_timeout(Some(Duration::from_millis(20)));

        let resolved = resolver.resolve(&file);

        assert_eq!(resolved.provenance, DateProvenance::FilesystemCorrected);
        assert_eq!(resolved.created, DateTime::<Local>::from(local(2017, 5, 5)));
    }

    struct CountingStall {
        calls: AtomicUsize,
    }

    impl MetadataProvider for CountingStall {
        fn capture_date(&self, _path: &Path, _field: DateField) -> Option<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(500));
            Some("2001:01:01 00:00:00".to_string())
        }
    }

    #[test]
    fn stalled_lookups_are_capped() {
        let provider = Arc::new(CountingStall {
            calls: AtomicUsize::new(0),
        });
        let resolver = MetadataResolver::new(Arc::clone(&provider) as Arc<dyn MetadataProvider>)
            .with_timeout(Some(Duration::from_millis(10)))
            .with_max_lookups(2);

        for i in 0..10 {
            let file = media(&format!("IMG_{i:04}.JPG"), local(2017, 5, 5), local(2017, 5, 6));
            let resolved = resolver.resolve(&file);
            assert_eq!(resolved.provenance, DateProvenance::FilesystemCorrected);
        }

        assert!(provider.calls.load(Ordering::SeqCst) <= 2);
    }

    #[test]
    fn metadata_modified_never_precedes_capture() {
        let file = media("IMG_0004.JPG", local(2010, 1, 1), local(2010, 1, 1));
        let resolved = resolver(CannedProvider(Some("2015:06:01 09:00:00"))).resolve(&file);

        assert_eq!(resolved.modified, resolved.created);
    }

    #[test]
    fn corrected_creation_never_exceeds_modification() {
        for (c, m) in [(5u64, 3u64), (3, 5), (4, 4)] {
            let created = SystemTime::UNIX_EPOCH + Duration::from_secs(c);
            let modified = SystemTime::UNIX_EPOCH + Duration::from_secs(m);
            let (fixed, changed) = corrected_creation(created, modified);
            assert!(fixed <= modified);
            assert_eq!(changed, c > m);
        }
    }
}
