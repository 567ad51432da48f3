use crate::error::Error;
use crate::metadata::DeviceType;
use chrono::NaiveDateTime;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Upper bound on numbered siblings tried before giving up on a file.
pub const MAX_COLLISION_ATTEMPTS: u32 = 999;

/// Whole-second, fixed-width, so lexicographic order is chronological order.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Derives archive paths of the form
/// `<root>/YYYY/MM/DD/YYYYMMDD-HHMMSS-<device_type>[-<tag>]<ext>`.
#[derive(Debug, Clone)]
pub struct DestinationNamer {
    root: PathBuf,
}

impl DestinationNamer {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Build the base destination path, creating the dated folder if needed.
    /// Does not look at whether the file itself already exists.
    pub fn destination_for(
        &self,
        timestamp: &NaiveDateTime,
        extension: &str,
        device_type: DeviceType,
        device_tag: Option<&str>,
    ) -> Result<PathBuf, Error> {
        let date_dir = self
            .root
            .join(timestamp.format("%Y").to_string())
            .join(timestamp.format("%m").to_string())
            .join(timestamp.format("%d").to_string());

        fs::create_dir_all(&date_dir).map_err(|source| Error::CreateDir {
            path: date_dir.clone(),
            source,
        })?;

        Ok(date_dir.join(base_filename(timestamp, extension, device_type, device_tag)))
    }
}

pub fn base_filename(
    timestamp: &NaiveDateTime,
    extension: &str,
    device_type: DeviceType,
    device_tag: Option<&str>,
) -> String {
    let mut name = format!("{}-{}", timestamp.format(TIMESTAMP_FORMAT), device_type);
    if let Some(tag) = device_tag.and_then(sanitize_tag) {
        name.push('-');
        name.push_str(&tag);
    }
    name.push_str(extension);
    name
}

/// Keep a user-supplied tag to a single filename component.
pub fn sanitize_tag(tag: &str) -> Option<String> {
    let trimmed = tag.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(
        trimmed
            .chars()
            .map(|c| match c {
                '/' | '\\' | ':' => '_',
                c if c.is_whitespace() => '_',
                c => c,
            })
            .collect(),
    )
}

/// `<stem>.<n><ext>` next to `base_path`.
pub fn numbered_sibling(base_path: &Path, n: u32) -> PathBuf {
    let stem = base_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = base_path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    base_path.with_file_name(format!("{}.{}{}", stem, n, extension))
}

/// Return `base_path` if it is free, otherwise the first free
/// `<stem>.<n><ext>` sibling for `n` in `1..=MAX_COLLISION_ATTEMPTS`.
///
/// This only picks a name. Callers must still create the file exclusively,
/// since another writer may take the name before they do.
pub fn next_available(base_path: &Path) -> Result<PathBuf, Error> {
    if !base_path.exists() {
        return Ok(base_path.to_path_buf());
    }

    let file_name = base_path
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_default();
    warn!("Destination file already exists: {}", file_name);

    for counter in 1..=MAX_COLLISION_ATTEMPTS {
        let collision_path = numbered_sibling(base_path, counter);
        if !collision_path.exists() {
            info!(
                "Using collision-avoided filename: {}",
                collision_path.display()
            );
            return Ok(collision_path);
        }
    }

    Err(Error::CollisionSpaceExhausted {
        base: base_path.to_path_buf(),
        attempts: MAX_COLLISION_ATTEMPTS,
    })
}
