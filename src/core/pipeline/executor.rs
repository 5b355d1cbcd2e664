//! Pipeline execution implementation.

use super::cancel::CancellationToken;
use super::state::{FileState, FileTracker};
use crate::core::dedup::{Claim, DedupIndex};
use crate::core::fingerprint::{fingerprint_file, Fingerprint};
use crate::core::metadata::{
    ContainerMetadataProvider, MetadataProvider, MetadataResolver, ResolvedDate,
    DEFAULT_METADATA_TIMEOUT,
};
use crate::core::organize::{CopyReport, OrganizeExecutor, OrganizePlanner, Placement};
use crate::core::scanner::{MediaFile, MediaScanner, ScanConfig, WalkDirScanner};
use crate::core::summary::{BackupRecord, BackupSummary};
use crate::error::{FileError, IngestError, Result};
use crate::events::{
    null_sender, Event, EventSender, FileEvent, FileOutcome, FileProgress, PipelineEvent,
    PipelinePhase, SeedEvent,
};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

/// Files strictly smaller than this are skipped by default (10 KiB)
pub const DEFAULT_MIN_FILE_SIZE: u64 = 10 * 1024;

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RunOutcome {
    /// Every discovered file reached a terminal state
    Completed,
    /// Stopped through the cancellation token
    Cancelled,
    /// Stopped by a fatal condition
    Aborted(String),
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOutcome::Completed => write!(f, "completed"),
            RunOutcome::Cancelled => write!(f, "cancelled"),
            RunOutcome::Aborted(reason) => write!(f, "aborted: {reason}"),
        }
    }
}

/// Result of pipeline execution
#[derive(Debug)]
pub struct PipelineResult {
    /// Run statistics; partial unless the run completed
    pub record: BackupRecord,
    pub outcome: RunOutcome,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl PipelineResult {
    pub fn summary(&self) -> BackupSummary {
        self.record.snapshot()
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self.outcome, RunOutcome::Aborted(_))
    }
}

/// Configuration for the pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Tree to ingest from
    pub source: PathBuf,
    /// Library root; optional only under preview
    pub destination: Option<PathBuf>,
    /// Report what would happen without writing anything
    pub preview: bool,
    /// Minimum size in bytes; smaller files are skipped
    pub min_file_size: u64,
    /// Worker threads (None = available parallelism)
    pub workers: Option<usize>,
    /// Bound on each metadata lookup (None = unbounded)
    pub metadata_timeout: Option<Duration>,
    /// Fingerprint the existing destination before ingesting
    pub seed_from_destination: bool,
    /// Scanner configuration
    pub scan_config: ScanConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::new(),
            destination: None,
            preview: false,
            min_file_size: DEFAULT_MIN_FILE_SIZE,
            workers: None,
            metadata_timeout: Some(DEFAULT_METADATA_TIMEOUT),
            seed_from_destination: true,
            scan_config: ScanConfig::default(),
        }
    }
}

/// Builder for pipeline configuration
pub struct PipelineBuilder {
    config: PipelineConfig,
    provider: Option<Arc<dyn MetadataProvider>>,
}

impl PipelineBuilder {
    /// Create a new pipeline builder
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
            provider: None,
        }
    }

    /// Set the source directory
    pub fn source(mut self, source: impl Into<PathBuf>) -> Self {
        self.config.source = source.into();
        self
    }

    /// Set the destination root
    pub fn destination(mut self, destination: impl Into<PathBuf>) -> Self {
        self.config.destination = Some(destination.into());
        self
    }

    /// Enable or disable preview mode
    pub fn preview(mut self, preview: bool) -> Self {
        self.config.preview = preview;
        self
    }

    /// Set the minimum file size in bytes
    pub fn min_file_size(mut self, bytes: u64) -> Self {
        self.config.min_file_size = bytes;
        self
    }

    /// Set the number of worker threads
    pub fn workers(mut self, workers: usize) -> Self {
        self.config.workers = Some(workers);
        self
    }

    /// Bound metadata lookups; `None` waits indefinitely
    pub fn metadata_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.metadata_timeout = timeout;
        self
    }

    /// Enable or disable destination seeding
    pub fn seed_from_destination(mut self, seed: bool) -> Self {
        self.config.seed_from_destination = seed;
        self
    }

    /// Set scanner configuration
    pub fn scan_config(mut self, config: ScanConfig) -> Self {
        self.config.scan_config = config;
        self
    }

    /// Include hidden files
    pub fn include_hidden(mut self, include: bool) -> Self {
        self.config.scan_config.include_hidden = include;
        self
    }

    /// Follow symbolic links while scanning
    pub fn follow_symlinks(mut self, follow: bool) -> Self {
        self.config.scan_config.follow_symlinks = follow;
        self
    }

    /// Replace the metadata source (defaults to EXIF / MP4 container parsing)
    pub fn metadata_provider(mut self, provider: Arc<dyn MetadataProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Validate the configuration and build the pipeline
    pub fn build(self) -> Result<Pipeline> {
        let config = self.config;

        if config.source.as_os_str().is_empty() {
            return Err(IngestError::Config("a source directory is required".into()));
        }

        match &config.destination {
            None if !config.preview => {
                return Err(IngestError::Config(
                    "a destination is required unless running in preview mode".into(),
                ));
            }
            Some(destination) if same_path(destination, &config.source) => {
                return Err(IngestError::Config(format!(
                    "destination must differ from source: {}",
                    destination.display()
                )));
            }
            _ => {}
        }

        if config.workers == Some(0) {
            return Err(IngestError::Config("workers must be at least 1".into()));
        }

        let provider = self
            .provider
            .unwrap_or_else(|| Arc::new(ContainerMetadataProvider) as Arc<dyn MetadataProvider>);
        let resolver = MetadataResolver::new(provider).with_timeout(config.metadata_timeout);

        Ok(Pipeline { config, resolver })
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn same_path(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// A file that was fingerprinted and waits for the dedup decision
struct Candidate {
    file: MediaFile,
    tracker: FileTracker,
    fingerprint: Fingerprint,
}

enum Analysis {
    /// Reached a terminal state and was recorded
    Settled,
    /// Never looked at because the run was cancelled
    Untouched,
    Hashed(Candidate),
}

/// Content claimed by this run, with the identical files standing by in
/// case the owner cannot be copied
struct Transfer {
    owner: Candidate,
    date: ResolvedDate,
    placement: Placement,
    standby: VecDeque<Candidate>,
}

/// Shared state for the transfer phase
struct TransferContext<'a> {
    executor: &'a OrganizeExecutor,
    record: &'a BackupRecord,
    events: &'a EventSender,
    cancel: &'a CancellationToken,
    abort: &'a OnceLock<String>,
}

impl TransferContext<'_> {
    /// False once the run is cancelled or aborted. A missing destination
    /// root sets the abort reason.
    fn proceed(&self) -> bool {
        if self.cancel.is_cancelled() || self.abort.get().is_some() {
            return false;
        }
        if !self.executor.is_preview() && !self.executor.root().is_dir() {
            let _ = self.abort.set(vanished(self.executor.root()));
            return false;
        }
        true
    }
}

/// The ingest pipeline
pub struct Pipeline {
    config: PipelineConfig,
    resolver: MetadataResolver,
}

impl Pipeline {
    /// Create a new pipeline builder
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the pipeline without events
    pub fn run(&self) -> Result<PipelineResult> {
        self.run_with_events(&null_sender(), &CancellationToken::new())
    }

    /// Scan the source and ingest everything found.
    ///
    /// Per-file problems are recorded and never fail the run. A missing
    /// source or a vanished destination yields `RunOutcome::Aborted` with the
    /// partial record. `Err` is reserved for a worker pool that cannot start.
    pub fn run_with_events(
        &self,
        events: &EventSender,
        cancel: &CancellationToken,
    ) -> Result<PipelineResult> {
        let start_time = Instant::now();
        let record = BackupRecord::new(self.config.preview);

        events.send(Event::Pipeline(PipelineEvent::Started));
        self.enter(events, PipelinePhase::Scanning);

        let mut scan_config = self.config.scan_config.clone();
        if let Some(destination) = &self.config.destination {
            scan_config.exclude.push(destination.clone());
        }

        let scanner = WalkDirScanner::new(scan_config);
        let scan = match scanner.scan_with_events(&self.config.source, events) {
            Ok(scan) => scan,
            Err(e) => {
                tracing::error!(error = %e, "cannot scan source");
                let outcome = RunOutcome::Aborted(e.to_string());
                return Ok(self.finish(record, outcome, start_time, events));
            }
        };

        for error in &scan.errors {
            record.record_warning(error.to_string());
        }

        let outcome = self.process(scan.files, &record, events, cancel)?;
        Ok(self.finish(record, outcome, start_time, events))
    }

    /// Ingest an already enumerated list of files, in the given order.
    pub fn run_files(
        &self,
        files: Vec<MediaFile>,
        events: &EventSender,
        cancel: &CancellationToken,
    ) -> Result<PipelineResult> {
        let start_time = Instant::now();
        let record = BackupRecord::new(self.config.preview);

        events.send(Event::Pipeline(PipelineEvent::Started));
        let outcome = self.process(files, &record, events, cancel)?;
        Ok(self.finish(record, outcome, start_time, events))
    }

    fn process(
        &self,
        files: Vec<MediaFile>,
        record: &BackupRecord,
        events: &EventSender,
        cancel: &CancellationToken,
    ) -> Result<RunOutcome> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.workers.unwrap_or(0))
            .thread_name(|i| format!("ingest-worker-{i}"))
            .build()
            .map_err(|e| IngestError::WorkerPool(e.to_string()))?;

        let index = DedupIndex::new();
        let destination_existed = self.config.destination.as_deref().is_some_and(Path::is_dir);

        // Phase: seed the index from what the library already holds
        if let Some(destination) = self.seed_root() {
            self.enter(events, PipelinePhase::Seeding);
            events.send(Event::Seed(SeedEvent::Started {
                root: destination.to_path_buf(),
            }));

            let report = index.seed_from_destination(destination);
            for failure in &report.failures {
                record.record_warning(failure.to_string());
            }

            events.send(Event::Seed(SeedEvent::Completed {
                entries: index.len(),
                failures: report.failures.len(),
            }));
        }

        if cancel.is_cancelled() {
            return Ok(RunOutcome::Cancelled);
        }

        // Phase: size filter and fingerprint, in parallel, order kept
        self.enter(events, PipelinePhase::Analyzing);
        let total = files.len();
        let analyzed: Vec<Analysis> = pool.install(|| {
            files
                .into_par_iter()
                .enumerate()
                .map(|(position, file)| {
                    self.analyze(position, total, file, record, events, cancel)
                })
                .collect()
        });

        let candidates: Vec<Candidate> = analyzed
            .into_iter()
            .filter_map(|analysis| match analysis {
                Analysis::Hashed(candidate) => Some(candidate),
                Analysis::Settled | Analysis::Untouched => None,
            })
            .collect();

        // Only the first occurrence of each new content is worth a date
        // lookup; everything else will be recorded as a duplicate.
        let mut seen = HashSet::new();
        let needs_plan: Vec<bool> = candidates
            .iter()
            .map(|c| index.get(&c.fingerprint).is_none() && seen.insert(c.fingerprint))
            .collect();

        let plans: Vec<Option<(ResolvedDate, Placement)>> = pool.install(|| {
            candidates
                .par_iter()
                .zip(needs_plan.par_iter())
                .map(|(candidate, needs_plan)| {
                    if !*needs_plan || cancel.is_cancelled() {
                        return None;
                    }
                    Some(self.plan(&candidate.file, &candidate.fingerprint))
                })
                .collect()
        });

        // Phase: claim content in traversal order so the first file wins
        self.enter(events, PipelinePhase::Committing);
        let mut transfers: Vec<Transfer> = Vec::new();
        let mut claimed: HashMap<Fingerprint, usize> = HashMap::new();

        for (mut candidate, plan) in candidates.into_iter().zip(plans) {
            if let Some(&slot) = claimed.get(&candidate.fingerprint) {
                // settled once a copy of this content has landed
                transfers[slot].standby.push_back(candidate);
                continue;
            }

            let existing = match plan {
                Some((date, placement)) => {
                    let name = relative_name(&placement);
                    match index.lookup_or_insert(candidate.fingerprint, &name) {
                        Claim::Inserted => {
                            claimed.insert(candidate.fingerprint, transfers.len());
                            transfers.push(Transfer {
                                owner: candidate,
                                date,
                                placement,
                                standby: VecDeque::new(),
                            });
                            continue;
                        }
                        Claim::AlreadyPresent(existing) => existing,
                    }
                }
                None => match index.get(&candidate.fingerprint) {
                    Some(existing) => existing,
                    None => {
                        // its first occurrence was never planned
                        tracing::debug!(path = %candidate.file.path.display(), "left unprocessed");
                        continue;
                    }
                },
            };

            settle_duplicate(&mut candidate, existing, record, events);
        }

        if cancel.is_cancelled() {
            return Ok(RunOutcome::Cancelled);
        }

        // Phase: copy unique files, in parallel
        self.enter(events, PipelinePhase::Transferring);
        let Some(executor) = self.executor() else {
            return Ok(RunOutcome::Completed);
        };

        if !executor.is_preview() {
            if destination_existed && !executor.root().is_dir() {
                let reason = vanished(executor.root());
                tracing::error!(%reason, "aborting run");
                return Ok(RunOutcome::Aborted(reason));
            }
            if let Err(e) = fs::create_dir_all(executor.root()) {
                return Ok(RunOutcome::Aborted(format!(
                    "cannot create destination {}: {e}",
                    executor.root().display()
                )));
            }
        }

        let abort = OnceLock::new();
        let context = TransferContext {
            executor: &executor,
            record,
            events,
            cancel,
            abort: &abort,
        };
        pool.install(|| {
            transfers
                .into_par_iter()
                .for_each(|transfer| self.transfer(&context, transfer))
        });

        if let Some(reason) = abort.into_inner() {
            tracing::error!(%reason, "aborting run");
            return Ok(RunOutcome::Aborted(reason));
        }
        if cancel.is_cancelled() {
            return Ok(RunOutcome::Cancelled);
        }

        Ok(RunOutcome::Completed)
    }

    fn seed_root(&self) -> Option<&Path> {
        if !self.config.seed_from_destination {
            return None;
        }
        self.config.destination.as_deref()
    }

    fn executor(&self) -> Option<OrganizeExecutor> {
        match &self.config.destination {
            Some(root) => Some(OrganizeExecutor::new(root).preview(self.config.preview)),
            // preview without a destination: names are planned relative to "."
            None if self.config.preview => Some(OrganizeExecutor::new(".").preview(true)),
            None => None,
        }
    }

    fn enter(&self, events: &EventSender, phase: PipelinePhase) {
        tracing::info!(%phase, "phase");
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged { phase }));
    }

    fn analyze(
        &self,
        position: usize,
        total: usize,
        file: MediaFile,
        record: &BackupRecord,
        events: &EventSender,
        cancel: &CancellationToken,
    ) -> Analysis {
        if cancel.is_cancelled() {
            return Analysis::Untouched;
        }

        events.send(Event::File(FileEvent::Progress(FileProgress {
            index: position + 1,
            total,
            filename: file.file_name(),
        })));

        let mut tracker = FileTracker::new(&file.path);
        step(&mut tracker, FileState::SizeChecked);

        if file.size < self.config.min_file_size {
            step(&mut tracker, FileState::SkippedSmall);
            record.record_skipped_small();
            tracing::debug!(path = %file.path.display(), size = file.size, "below minimum size");
            finished(events, &file, FileOutcome::SkippedSmall);
            return Analysis::Settled;
        }

        match fingerprint_file(&file.path) {
            Ok(fingerprint) => {
                step(&mut tracker, FileState::Hashed);
                Analysis::Hashed(Candidate {
                    file,
                    tracker,
                    fingerprint,
                })
            }
            Err(e) => {
                fail(&mut tracker, &file, e, record, events);
                Analysis::Settled
            }
        }
    }

    fn plan(&self, file: &MediaFile, fingerprint: &Fingerprint) -> (ResolvedDate, Placement) {
        let date = self.resolver.resolve(file);
        let placement = OrganizePlanner::plan(file, &date, fingerprint);
        tracing::debug!(
            path = %file.path.display(),
            provenance = ?date.provenance,
            placement = %placement.relative_path().display(),
            "planned"
        );
        (date, placement)
    }

    /// Copy one claimed content. When a copy fails the next identical file
    /// takes over; files still on standby become duplicates only after a
    /// copy has landed.
    fn transfer(&self, context: &TransferContext<'_>, transfer: Transfer) {
        let Transfer {
            owner,
            date,
            placement,
            mut standby,
        } = transfer;
        let mut attempt = (owner, date, placement);

        loop {
            if !context.proceed() {
                return;
            }

            let (candidate, date, placement) = attempt;
            if self.copy(context, candidate, &date, &placement) {
                let existing = relative_name(&placement);
                for mut duplicate in standby {
                    settle_duplicate(&mut duplicate, existing.clone(), context.record, context.events);
                }
                return;
            }

            let Some(next) = standby.pop_front() else {
                return;
            };
            tracing::info!(path = %next.file.path.display(), "copy failed, promoting an identical file");
            let (date, placement) = self.plan(&next.file, &next.fingerprint);
            attempt = (next, date, placement);
        }
    }

    /// Returns whether the file reached the library (or would, under preview)
    fn copy(
        &self,
        context: &TransferContext<'_>,
        candidate: Candidate,
        date: &ResolvedDate,
        placement: &Placement,
    ) -> bool {
        let Candidate {
            file, mut tracker, ..
        } = candidate;
        let record = context.record;

        step(&mut tracker, FileState::DateResolved);
        step(&mut tracker, FileState::Classified);

        match context.executor.transfer(&file, date, placement) {
            Ok(CopyReport::Planned { destination }) => {
                step(&mut tracker, FileState::PreviewRecorded);
                if date.timestamp_fixed {
                    record.record_timestamp_fix();
                }
                record.record_copied(file.size, &placement.relative_path());
                finished(context.events, &file, FileOutcome::WouldCopy { destination });
                true
            }
            Ok(CopyReport::Copied {
                destination,
                warnings,
            }) => {
                step(&mut tracker, FileState::Copied);
                for warning in warnings {
                    record.record_warning(warning);
                }
                step(&mut tracker, FileState::AttributesApplied);
                step(&mut tracker, FileState::Recorded);
                if date.timestamp_fixed {
                    record.record_timestamp_fix();
                }
                record.record_copied(file.size, &placement.relative_path());
                finished(context.events, &file, FileOutcome::Copied { destination });
                true
            }
            Err(e) => {
                fail(&mut tracker, &file, e, record, context.events);
                false
            }
        }
    }

    fn finish(
        &self,
        record: BackupRecord,
        outcome: RunOutcome,
        start_time: Instant,
        events: &EventSender,
    ) -> PipelineResult {
        let duration_ms = start_time.elapsed().as_millis() as u64;
        let summary = record.snapshot();

        tracing::info!(
            outcome = %outcome,
            processed = summary.processed,
            copied = summary.copied,
            duplicates = summary.duplicates,
            errors = summary.errors,
            duration_ms,
            "run finished"
        );

        let event = match &outcome {
            RunOutcome::Completed => PipelineEvent::Completed { summary },
            RunOutcome::Cancelled => PipelineEvent::Cancelled { summary },
            RunOutcome::Aborted(message) => PipelineEvent::Aborted {
                message: message.clone(),
                summary,
            },
        };
        events.send(Event::Pipeline(event));

        PipelineResult {
            record,
            outcome,
            duration_ms,
        }
    }
}

/// Index key for a placement: relative path with `/` separators
fn relative_name(placement: &Placement) -> String {
    placement.relative_path().to_string_lossy().replace('\\', "/")
}

fn vanished(root: &Path) -> String {
    format!("destination {} disappeared", root.display())
}

fn settle_duplicate(
    candidate: &mut Candidate,
    existing: String,
    record: &BackupRecord,
    events: &EventSender,
) {
    step(&mut candidate.tracker, FileState::DuplicateRecorded);
    record.record_duplicate(candidate.file.size);
    tracing::debug!(
        path = %candidate.file.path.display(),
        existing = %existing,
        "duplicate"
    );
    finished(events, &candidate.file, FileOutcome::Duplicate { existing });
}

fn step(tracker: &mut FileTracker, next: FileState) {
    if let Err(e) = tracker.advance(next) {
        tracing::error!(error = %e, "file state machine violated");
    }
}

fn finished(events: &EventSender, file: &MediaFile, outcome: FileOutcome) {
    events.send(Event::File(FileEvent::Finished {
        path: file.path.clone(),
        outcome,
    }));
}

fn fail(
    tracker: &mut FileTracker,
    file: &MediaFile,
    error: FileError,
    record: &BackupRecord,
    events: &EventSender,
) {
    step(tracker, FileState::Failed(error.kind()));
    let message = format!("{}: {}", file.path.display(), error);
    tracing::warn!(path = %file.path.display(), %error, "file failed");
    record.record_error(message.clone());
    finished(events, file, FileOutcome::Failed { message });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::metadata::DateField;
    use crate::events::EventChannel;
    use std::io::Write;
    use tempfile::TempDir;

    struct NoMetadata;

    impl MetadataProvider for NoMetadata {
        fn capture_date(&self, _path: &Path, _field: DateField) -> Option<String> {
            None
        }
    }

    fn write(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
        let path = dir.join(name);
        fs::File::create(&path).unwrap().write_all(bytes).unwrap();
        path
    }

    fn pipeline(source: &Path, destination: &Path) -> Pipeline {
        Pipeline::builder()
            .source(source)
            .destination(destination)
            .metadata_provider(Arc::new(NoMetadata))
            .min_file_size(4)
            .workers(2)
            .build()
            .unwrap()
    }

    #[test]
    fn builder_requires_destination_for_live_runs() {
        let err = Pipeline::builder().source("/card").build().err().unwrap();
        assert!(matches!(err, IngestError::Config(_)));

        assert!(Pipeline::builder().source("/card").preview(true).build().is_ok());
    }

    #[test]
    fn builder_rejects_destination_equal_to_source() {
        let dir = TempDir::new().unwrap();
        let err = Pipeline::builder()
            .source(dir.path())
            .destination(dir.path())
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, IngestError::Config(_)));
    }

    #[test]
    fn builder_rejects_zero_workers() {
        let err = Pipeline::builder()
            .source("/card")
            .destination("/library")
            .workers(0)
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, IngestError::Config(_)));
    }

    #[test]
    fn builder_defaults() {
        let pipeline = Pipeline::builder()
            .source("/card")
            .destination("/library")
            .build()
            .unwrap();
        assert_eq!(pipeline.config().min_file_size, DEFAULT_MIN_FILE_SIZE);
        assert!(pipeline.config().seed_from_destination);
        assert_eq!(pipeline.config().metadata_timeout, Some(DEFAULT_METADATA_TIMEOUT));
    }

    #[test]
    fn pipeline_handles_empty_directory() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();

        let result = pipeline(src.path(), dest.path()).run().unwrap();

        assert_eq!(result.outcome, RunOutcome::Completed);
        assert_eq!(result.summary().processed, 0);
    }

    #[test]
    fn first_file_in_traversal_order_wins() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        let first = write(src.path(), "a.jpg", b"same bytes");
        let second = write(src.path(), "b.jpg", b"same bytes");

        let (sender, receiver) = EventChannel::new();
        let result = pipeline(src.path(), dest.path())
            .run_with_events(&sender, &CancellationToken::new())
            .unwrap();
        drop(sender);

        let summary = result.summary();
        assert_eq!(summary.copied, 1);
        assert_eq!(summary.duplicates, 1);

        let outcomes: Vec<_> = receiver
            .iter()
            .filter_map(|event| match event {
                Event::File(FileEvent::Finished { path, outcome }) => Some((path, outcome)),
                _ => None,
            })
            .collect();
        assert!(outcomes
            .iter()
            .any(|(p, o)| *p == first && matches!(o, FileOutcome::Copied { .. })));
        assert!(outcomes
            .iter()
            .any(|(p, o)| *p == second && matches!(o, FileOutcome::Duplicate { .. })));
    }

    #[test]
    fn missing_source_aborts_with_partial_record() {
        let dest = TempDir::new().unwrap();
        let result = pipeline(&dest.path().join("no-such-card"), dest.path())
            .run()
            .unwrap();

        assert!(result.is_aborted());
        assert_eq!(result.summary().processed, 0);
    }

    #[test]
    fn cancelled_before_start_touches_nothing() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        write(src.path(), "a.jpg", b"pixels");

        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = pipeline(src.path(), dest.path())
            .run_with_events(&null_sender(), &cancel)
            .unwrap();

        assert_eq!(result.outcome, RunOutcome::Cancelled);
        assert_eq!(result.summary().copied, 0);
        assert_eq!(fs::read_dir(dest.path()).unwrap().count(), 0);
    }

    #[test]
    fn unreadable_file_is_recorded_and_run_continues() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        let good = write(src.path(), "good.jpg", b"pixels");
        let gone = src.path().join("gone.jpg");

        let files = vec![
            MediaFile {
                path: gone.clone(),
                ..MediaFile::from_path(&good).unwrap()
            },
            MediaFile::from_path(&good).unwrap(),
        ];

        let result = pipeline(src.path(), dest.path())
            .run_files(files, &null_sender(), &CancellationToken::new())
            .unwrap();

        let summary = result.summary();
        assert_eq!(result.outcome, RunOutcome::Completed);
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.copied, 1);
        assert!(summary.error_messages[0].starts_with(&gone.display().to_string()));
    }
}
