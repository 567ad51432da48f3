use crate::engine::{ArchiveReport, FileOutcome};
use std::path::Path;

/// Trait for reporting archive progress.
///
/// CLI implements with indicatif. All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    fn on_discover_start(&self) {}
    fn on_discover_complete(&self, _total_files: usize, _duration_secs: f64) {}
    fn on_file_start(&self, _index: usize, _total_files: usize, _path: &Path) {}
    fn on_file_complete(&self, _path: &Path, _outcome: &FileOutcome) {}
    fn on_run_complete(&self, _report: &ArchiveReport) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
