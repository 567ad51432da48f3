use indicatif::{ProgressBar, ProgressStyle};
use media_archiver_core::{ArchiveReport, FileOutcome, ProgressReporter};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

const TICK_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// CLI progress reporter using indicatif progress bars.
///
/// - Discovery: spinner
/// - Archiving: progress bar over the discovered files
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn guard(&self) -> MutexGuard<'_, Option<ProgressBar>> {
        self.bar.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_bar(&self, pb: ProgressBar) {
        let mut guard = self.guard();
        if let Some(old) = guard.take() {
            old.finish_and_clear();
        }
        *guard = Some(pb);
    }

    fn finish_bar(&self) {
        if let Some(pb) = self.guard().take() {
            pb.finish_and_clear();
        }
    }
}

fn style(template: &str) -> ProgressStyle {
    ProgressStyle::with_template(template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("━╸─")
        .tick_chars(TICK_CHARS)
}

impl ProgressReporter for CliReporter {
    fn on_discover_start(&self) {
        let pb = ProgressBar::new_spinner();
        pb.set_style(style("{spinner:.cyan} {msg}"));
        pb.set_message("Discovering media files...");
        pb.enable_steady_tick(Duration::from_millis(80));
        self.set_bar(pb);
    }

    fn on_discover_complete(&self, total_files: usize, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Discovery complete: {} files in {:.2}s",
            total_files, duration_secs
        );
    }

    fn on_file_start(&self, index: usize, total_files: usize, path: &Path) {
        let mut guard = self.guard();
        if guard.is_none() {
            let pb = ProgressBar::new(total_files as u64);
            pb.set_style(style(
                "  {spinner:.cyan} Archiving [{bar:30.cyan/dim}] {pos}/{len} {msg}",
            ));
            pb.enable_steady_tick(Duration::from_millis(80));
            *guard = Some(pb);
        }
        if let Some(pb) = guard.as_ref() {
            pb.set_position(index as u64);
            if let Some(name) = path.file_name() {
                pb.set_message(name.to_string_lossy().into_owned());
            }
        }
    }

    fn on_file_complete(&self, _path: &Path, _outcome: &FileOutcome) {
        if let Some(pb) = self.guard().as_ref() {
            pb.inc(1);
        }
    }

    fn on_run_complete(&self, report: &ArchiveReport) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Archive complete: {} files in {:.2}s",
            report.discovered,
            report.duration.as_secs_f64()
        );
    }
}
