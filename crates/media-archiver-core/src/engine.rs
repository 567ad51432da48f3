use crate::config::{AppConfig, ArchiveOptions};
use crate::copier::{FileCopier, PreservingCopier};
use crate::error::Error;
use crate::hasher::{self, ContentDigest};
use crate::metadata::{FileMetadataService, MetadataService};
use crate::naming::{self, DestinationNamer, MAX_COLLISION_ATTEMPTS};
use crate::progress::ProgressReporter;
use crate::scanner::{recent_days_cutoff, DiscoveryFilter, FileDiscoverer, SourceFile};
use chrono::Local;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant, SystemTime};
use tracing::{debug, error, info, warn};

/// Terminal state of one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// Written and verified. `replaced` is set when a differing file at the
    /// same path was deleted first (overwrite mode).
    Copied { destination: PathBuf, replaced: bool },
    /// Identical content is already archived under the derived name.
    SkippedDuplicate { existing: PathBuf },
    SkippedNoTimestamp,
    /// Overwrite mode could not remove the differing destination.
    OverwriteDeleteFailed { destination: PathBuf, reason: String },
    /// Overwrite mode removed the differing destination, then every copy
    /// attempt failed or another writer took the name back.
    OriginalDeletedCopyFailed { destination: PathBuf, reason: String },
    Failed { reason: String },
}

impl FileOutcome {
    pub fn is_copied(&self) -> bool {
        matches!(self, FileOutcome::Copied { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            FileOutcome::Copied { .. } => "copied",
            FileOutcome::SkippedDuplicate { .. } => "skipped-duplicate",
            FileOutcome::SkippedNoTimestamp => "skipped-unreadable-timestamp",
            FileOutcome::OverwriteDeleteFailed { .. } => "failed-overwrite-delete",
            FileOutcome::OriginalDeletedCopyFailed { .. } => {
                "skipped-overwritten-original-deleted"
            }
            FileOutcome::Failed { .. } => "failed-after-retries",
        }
    }
}

#[derive(Debug, Default)]
pub struct ArchiveReport {
    pub discovered: usize,
    pub copied: usize,
    pub duplicates: usize,
    pub no_timestamp: usize,
    pub failed: usize,
    pub outcomes: Vec<(PathBuf, FileOutcome)>,
    pub duration: Duration,
    pub discovery_error: Option<String>,
}

impl ArchiveReport {
    fn record(&mut self, path: PathBuf, outcome: FileOutcome) {
        match &outcome {
            FileOutcome::Copied { .. } => self.copied += 1,
            FileOutcome::SkippedDuplicate { .. } => self.duplicates += 1,
            FileOutcome::SkippedNoTimestamp => self.no_timestamp += 1,
            FileOutcome::OverwriteDeleteFailed { .. }
            | FileOutcome::OriginalDeletedCopyFailed { .. }
            | FileOutcome::Failed { .. } => self.failed += 1,
        }
        self.outcomes.push((path, outcome));
    }

    pub fn skipped_or_failed(&self) -> usize {
        self.duplicates + self.no_timestamp + self.failed
    }

    pub fn outcome_for(&self, path: &Path) -> Option<&FileOutcome> {
        self.outcomes
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, outcome)| outcome)
    }
}

pub struct ArchiveEngine {
    source_dir: PathBuf,
    namer: DestinationNamer,
    options: ArchiveOptions,
    config: AppConfig,
    metadata: Box<dyn MetadataService>,
    copier: Box<dyn FileCopier>,
    retry_delay: Duration,
}

impl ArchiveEngine {
    pub fn new(
        source_dir: impl Into<PathBuf>,
        destination_dir: impl Into<PathBuf>,
        options: ArchiveOptions,
        config: AppConfig,
    ) -> Self {
        let metadata = FileMetadataService::new(config.extensions.clone());
        let retry_delay = config.copy.retry_delay();
        Self {
            source_dir: source_dir.into(),
            namer: DestinationNamer::new(destination_dir),
            options,
            config,
            metadata: Box::new(metadata),
            copier: Box::new(PreservingCopier),
            retry_delay,
        }
    }

    pub fn with_metadata_service(mut self, metadata: impl MetadataService + 'static) -> Self {
        self.metadata = Box::new(metadata);
        self
    }

    pub fn with_copier(mut self, copier: impl FileCopier + 'static) -> Self {
        self.copier = Box::new(copier);
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Archive every discovered file, one at a time in path order.
    ///
    /// Per-file failures end up in the report; nothing here aborts the run.
    pub fn run(&self, reporter: &dyn ProgressReporter) -> ArchiveReport {
        let run_start = Instant::now();
        info!(
            "Starting archiver: {} -> {}",
            self.source_dir.display(),
            self.namer.root().display()
        );

        let mut report = ArchiveReport::default();

        reporter.on_discover_start();
        let discover_start = Instant::now();
        let files = match self.discoverer().discover(&self.source_dir) {
            Ok(files) => files,
            Err(err) => {
                error!("{}", err);
                report.discovery_error = Some(err.to_string());
                Vec::new()
            }
        };
        reporter.on_discover_complete(files.len(), discover_start.elapsed().as_secs_f64());
        report.discovered = files.len();

        if files.is_empty() {
            info!("No media files found in source directory");
        } else {
            info!("Found {} media file(s) to process", files.len());
        }

        for (index, file) in files.iter().enumerate() {
            reporter.on_file_start(index, files.len(), &file.path);
            let outcome = match self.process_file(file) {
                Ok(outcome) => outcome,
                Err(err) => {
                    error!("Error processing {}: {}", file.file_name(), err);
                    FileOutcome::Failed {
                        reason: err.to_string(),
                    }
                }
            };
            reporter.on_file_complete(&file.path, &outcome);
            report.record(file.path.clone(), outcome);
        }

        report.duration = run_start.elapsed();
        info!(
            "Processing complete: {} copied, {} skipped/failed",
            report.copied,
            report.skipped_or_failed()
        );
        reporter.on_run_complete(&report);
        report
    }

    fn discoverer(&self) -> FileDiscoverer {
        let cutoff = recent_days_cutoff(self.options.recent_days, Local::now());
        if let Some(cutoff) = cutoff {
            debug!("Including only files modified since {}", cutoff);
        }
        FileDiscoverer::new(
            self.config.extensions.clone(),
            DiscoveryFilter {
                skip_raw: self.options.skip_raw,
                ignore_subtitles: self.options.ignore_subtitles,
                modified_since: cutoff.map(SystemTime::from),
                ignore_patterns: self.config.ignore_patterns.clone(),
            },
        )
    }

    fn process_file(&self, source: &SourceFile) -> Result<FileOutcome, Error> {
        let name = source.file_name();

        let timestamp = match self
            .metadata
            .resolve_timestamp(&source.path, &source.extension)
        {
            Some(ts) => ts,
            None => {
                error!("Could not extract timestamp from {}, skipping", name);
                return Ok(FileOutcome::SkippedNoTimestamp);
            }
        };
        let device_type = self
            .metadata
            .resolve_device_type(&source.path, &source.extension);

        let base = self.namer.destination_for(
            &timestamp,
            &source.extension,
            device_type,
            self.options.device_tag.as_deref(),
        )?;

        // Hashed at most once, reused for duplicate detection and verification.
        let source_digest = hasher::digest_file(&source.path)?;
        let source_len = fs::metadata(&source.path)?.len();

        let mut replaced = false;
        let destination = if base.exists() {
            if same_content(&base, source_len, &source_digest)? {
                info!(
                    "Skipping {}: identical file already exists ({})",
                    name,
                    display_name(&base)
                );
                return Ok(FileOutcome::SkippedDuplicate { existing: base });
            }

            if self.options.overwrite {
                warn!(
                    "Destination file exists with different content: {} - overwriting",
                    name
                );
                if let Err(err) = fs::remove_file(&base) {
                    error!(
                        "Failed to delete existing file {}: {}",
                        display_name(&base),
                        err
                    );
                    return Ok(FileOutcome::OverwriteDeleteFailed {
                        destination: base,
                        reason: err.to_string(),
                    });
                }
                replaced = true;
                base.clone()
            } else {
                if let Some(existing) = find_numbered_copy(&base, source_len, &source_digest)? {
                    info!(
                        "Skipping {}: identical file already exists ({})",
                        name,
                        display_name(&existing)
                    );
                    return Ok(FileOutcome::SkippedDuplicate { existing });
                }
                naming::next_available(&base)?
            }
        } else {
            base.clone()
        };

        self.copy_with_retry(source, &base, destination, &source_digest, replaced)
    }

    fn copy_with_retry(
        &self,
        source: &SourceFile,
        base: &Path,
        mut destination: PathBuf,
        source_digest: &ContentDigest,
        replaced: bool,
    ) -> Result<FileOutcome, Error> {
        let name = source.file_name();
        let max_attempts = self.config.copy.max_attempts.max(1);
        let mut attempts = 0;
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            // The name was picked earlier; take another if it has since been used.
            if destination.exists() {
                if replaced {
                    // Overwrite only ever writes the base name.
                    last_error = format!(
                        "{} was recreated by another writer",
                        display_name(&destination)
                    );
                    break;
                }
                destination = naming::next_available(base)?;
            }
            attempts = attempt;

            match self.copy_and_verify(source, &destination, source_digest) {
                Ok(true) => {
                    info!("Copied: {} -> {}", name, display_name(&destination));
                    return Ok(FileOutcome::Copied {
                        destination,
                        replaced,
                    });
                }
                Ok(false) => {
                    warn!(
                        "Checksum mismatch for {} (attempt {}/{}): retrying...",
                        name, attempt, max_attempts
                    );
                    last_error = "checksum mismatch".to_string();
                    remove_residue(&destination);
                }
                Err(err) => {
                    warn!(
                        "Failed to copy {} (attempt {}/{}): {}",
                        name, attempt, max_attempts, err
                    );
                    // An existing file there is not ours to delete.
                    if err.kind() != io::ErrorKind::AlreadyExists {
                        remove_residue(&destination);
                    }
                    last_error = err.to_string();
                }
            }

            if attempt < max_attempts {
                thread::sleep(self.retry_delay);
            }
        }

        let reason = format!("copy failed after {} attempt(s): {}", attempts, last_error);
        error!("Failed to copy {}: {}", name, reason);

        if replaced {
            error!(
                "Previous content of {} was deleted for overwrite and could not be replaced",
                destination.display()
            );
            return Ok(FileOutcome::OriginalDeletedCopyFailed {
                destination,
                reason,
            });
        }
        Ok(FileOutcome::Failed { reason })
    }

    /// `Ok(false)` means the written bytes do not hash to `source_digest`.
    fn copy_and_verify(
        &self,
        source: &SourceFile,
        destination: &Path,
        source_digest: &ContentDigest,
    ) -> io::Result<bool> {
        self.copier.copy(&source.path, destination)?;
        hasher::matches_digest(destination, source_digest)
    }
}

fn same_content(
    candidate: &Path,
    source_len: u64,
    source_digest: &ContentDigest,
) -> io::Result<bool> {
    if fs::metadata(candidate)?.len() != source_len {
        return Ok(false);
    }
    hasher::matches_digest(candidate, source_digest)
}

/// Look through the numbered siblings of `base` for one holding the same bytes.
fn find_numbered_copy(
    base: &Path,
    source_len: u64,
    source_digest: &ContentDigest,
) -> io::Result<Option<PathBuf>> {
    for n in 1..=MAX_COLLISION_ATTEMPTS {
        let candidate = naming::numbered_sibling(base, n);
        if candidate.is_file() && same_content(&candidate, source_len, source_digest)? {
            return Ok(Some(candidate));
        }
    }
    Ok(None)
}

fn remove_residue(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => debug!("Removed incomplete copy {}", path.display()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => error!("Failed to remove bad copy {}: {}", path.display(), err),
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
