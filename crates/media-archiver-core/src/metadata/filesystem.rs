use super::{DeviceType, MetadataError, MetadataService};
use crate::config::ExtensionSets;
use chrono::{DateTime, Local, NaiveDateTime};
use std::fs;
use std::path::Path;
use tracing::debug;

const NAME_TIMESTAMP_LENGTH: usize = 15; // YYYYMMDD-HHMMSS

const DRONE_PREFIX: &str = "DJI";

/// GoPro-style names: `GOPR0001`, `GP010001`, `GH010001`, `GX010001`.
const ACTION_CAMERA_PREFIXES: [&str; 4] = ["GOPR", "GH", "GX", "GP"];

/// Metadata from what the filesystem and filename already tell us: a
/// timestamp embedded in the name, else the modification time.
pub struct FileMetadataService {
    extensions: ExtensionSets,
}

impl FileMetadataService {
    pub fn new(extensions: ExtensionSets) -> Self {
        Self { extensions }
    }

    /// Like [`MetadataService::resolve_timestamp`] but keeps the reason the
    /// last source failed.
    pub fn extract_timestamp(
        &self,
        path: &Path,
        extension: &str,
    ) -> Result<NaiveDateTime, MetadataError> {
        if !self.extensions.is_supported(extension) {
            return Err(MetadataError::UnsupportedFormat(extension.to_string()));
        }

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        match timestamp_from_name(&stem) {
            Ok(dt) => {
                debug!("Using timestamp embedded in filename: {}", path.display());
                return Ok(dt);
            }
            Err(e) => debug!("{}", e),
        }

        debug!("Using file modification time as fallback: {}", path.display());
        modified_timestamp(path)
    }
}

impl MetadataService for FileMetadataService {
    fn resolve_timestamp(&self, path: &Path, extension: &str) -> Option<NaiveDateTime> {
        match self.extract_timestamp(path, extension) {
            Ok(dt) => Some(dt),
            Err(e) => {
                debug!("No timestamp for {}: {}", path.display(), e);
                None
            }
        }
    }

    fn resolve_device_type(&self, path: &Path, extension: &str) -> DeviceType {
        let name = path
            .file_name()
            .map(|s| s.to_string_lossy().to_uppercase())
            .unwrap_or_default();

        if self.extensions.is_subtitle(extension) {
            return DeviceType::Srt;
        }
        if name.starts_with(DRONE_PREFIX) {
            return DeviceType::Drone;
        }
        if is_action_camera_name(&name) {
            return DeviceType::Video;
        }
        if self.extensions.is_video(extension) {
            return DeviceType::Video;
        }
        if self.extensions.is_audio(extension) {
            return DeviceType::Audio;
        }
        if self.extensions.is_image(extension) || self.extensions.is_raw(extension) {
            return DeviceType::Image;
        }
        DeviceType::Unknown
    }
}

/// Expects an upper-cased file name. The prefix must be followed by a digit so
/// that names like `GHOST.mp3` are left alone.
fn is_action_camera_name(name: &str) -> bool {
    ACTION_CAMERA_PREFIXES.iter().any(|prefix| {
        name.strip_prefix(prefix)
            .and_then(|rest| rest.bytes().next())
            .is_some_and(|b| b.is_ascii_digit())
    })
}

/// Find a `YYYYMMDD-HHMMSS` or `YYYYMMDD_HHMMSS` run inside a file stem.
pub fn timestamp_from_name(stem: &str) -> Result<NaiveDateTime, MetadataError> {
    let bytes = stem.as_bytes();
    let mut parse_failure = None;

    let mut i = 0;
    while i + NAME_TIMESTAMP_LENGTH <= bytes.len() {
        let window = &bytes[i..i + NAME_TIMESTAMP_LENGTH];
        let preceded_by_digit = i > 0 && bytes[i - 1].is_ascii_digit();
        let shape_ok = window[..8].iter().all(u8::is_ascii_digit)
            && (window[8] == b'-' || window[8] == b'_')
            && window[9..].iter().all(u8::is_ascii_digit);

        if shape_ok && !preceded_by_digit {
            let candidate = &stem[i..i + NAME_TIMESTAMP_LENGTH];
            let normalized = candidate.replace('_', "-");
            match NaiveDateTime::parse_from_str(&normalized, "%Y%m%d-%H%M%S") {
                Ok(dt) => return Ok(dt),
                Err(_) => {
                    parse_failure = Some(MetadataError::ParseFailure {
                        source_name: stem.to_string(),
                        value: candidate.to_string(),
                    })
                }
            }
        }
        i += 1;
    }

    Err(parse_failure.unwrap_or_else(|| MetadataError::MissingTag(stem.to_string())))
}

fn modified_timestamp(path: &Path) -> Result<NaiveDateTime, MetadataError> {
    let modified = fs::metadata(path)?.modified()?;
    Ok(DateTime::<Local>::from(modified).naive_local())
}
