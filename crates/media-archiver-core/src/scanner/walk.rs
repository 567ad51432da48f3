use crate::config::{normalize_extension, ExtensionSets};
use crate::error::Error;
use chrono::{DateTime, Days, Local, LocalResult, TimeDelta, TimeZone};
use glob::Pattern;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, error, trace, warn};
use walkdir::WalkDir;

/// Name prefix of macOS resource-fork shadow files (`._clip.mp4`).
const SIDECAR_PREFIX: &str = "._";

/// A candidate file under the source root. Never modified by the archiver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Extension as written on disk, with its leading dot.
    pub extension: String,
    pub modified: SystemTime,
}

impl SourceFile {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct DiscoveryFilter {
    pub skip_raw: bool,
    pub ignore_subtitles: bool,
    /// Files modified strictly before this instant are left out.
    pub modified_since: Option<SystemTime>,
    pub ignore_patterns: Vec<String>,
}

pub struct FileDiscoverer {
    extensions: ExtensionSets,
    filter: DiscoveryFilter,
    ignore_patterns: Vec<Pattern>,
}

impl FileDiscoverer {
    pub fn new(extensions: ExtensionSets, filter: DiscoveryFilter) -> Self {
        let ignore_patterns = filter
            .ignore_patterns
            .iter()
            .filter_map(|glob| match Pattern::new(glob) {
                Ok(p) => Some(p),
                Err(e) => {
                    error!("Invalid glob pattern '{}': {}", glob, e);
                    None
                }
            })
            .collect();

        Self {
            extensions,
            filter,
            ignore_patterns,
        }
    }

    /// List the supported media files directly inside `dir`, sorted by path.
    ///
    /// Fails only when `dir` itself cannot be read (missing, permission
    /// denied); unreadable entries inside it are logged and skipped.
    pub fn discover(&self, dir: &Path) -> Result<Vec<SourceFile>, Error> {
        let mut files = Vec::new();

        let walker = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false);

        for entry_result in walker {
            let entry = match entry_result {
                Ok(entry) => entry,
                Err(err) if err.depth() == 0 => {
                    return Err(Error::Discovery {
                        path: dir.to_path_buf(),
                        source: io::Error::from(err),
                    });
                }
                Err(err) => {
                    warn!("Error reading entry in {}: {}", dir.display(), err);
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let modified = match entry
                .metadata()
                .map_err(io::Error::from)
                .and_then(|m| m.modified())
            {
                Ok(modified) => modified,
                Err(err) => {
                    warn!(
                        "Error getting metadata for {}: {}",
                        entry.path().display(),
                        err
                    );
                    continue;
                }
            };

            if let Some(file) = self.accept(entry.path(), modified) {
                files.push(file);
            }
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }

    fn accept(&self, path: &Path, modified: SystemTime) -> Option<SourceFile> {
        let file_name = path.file_name()?.to_string_lossy();
        let extension = format!(".{}", path.extension()?.to_string_lossy());
        let ext_lower = normalize_extension(&extension);

        if !self.extensions.is_supported(&ext_lower) {
            trace!("Unsupported extension: {}", file_name);
            return None;
        }
        if file_name.starts_with(SIDECAR_PREFIX) {
            debug!("Skipping macOS metadata file: {}", file_name);
            return None;
        }
        if self.filter.skip_raw && self.extensions.is_raw(&ext_lower) {
            debug!("Skipping raw file (--skip-raw enabled): {}", file_name);
            return None;
        }
        if self.filter.ignore_subtitles && self.extensions.is_subtitle(&ext_lower) {
            debug!(
                "Skipping subtitle file (--ignore-subtitles enabled): {}",
                file_name
            );
            return None;
        }
        if self.ignore_patterns.iter().any(|p| p.matches_path(path)) {
            debug!("Skipping file matching ignore pattern: {}", file_name);
            return None;
        }
        if let Some(cutoff) = self.filter.modified_since {
            if modified < cutoff {
                debug!("Skipping file older than cutoff: {}", file_name);
                return None;
            }
        }

        Some(SourceFile {
            path: path.to_path_buf(),
            extension,
            modified,
        })
    }
}

/// Start of the "last `days` calendar days" window: local midnight `days - 1`
/// days before `now`. `0` disables the window, and so does a window reaching
/// past the earliest representable date.
pub fn recent_days_cutoff(days: u32, now: DateTime<Local>) -> Option<DateTime<Local>> {
    if days == 0 {
        return None;
    }
    let start_date = now
        .date_naive()
        .checked_sub_days(Days::new(u64::from(days - 1)))?;
    let midnight = start_date.and_hms_opt(0, 0, 0)?;

    let cutoff = match Local.from_local_datetime(&midnight) {
        LocalResult::Single(t) => t,
        LocalResult::Ambiguous(earliest, _) => earliest,
        // Midnight skipped by a DST jump; the day starts an hour later.
        LocalResult::None => Local
            .from_local_datetime(&(midnight + TimeDelta::hours(1)))
            .earliest()
            .unwrap_or(now),
    };
    Some(cutoff)
}
