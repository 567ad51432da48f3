pub mod filesystem;

use chrono::NaiveDateTime;
use std::fmt;
use std::path::Path;
use thiserror::Error;

pub use filesystem::FileMetadataService;

/// Coarse recording-device category, used only as a filename component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceType {
    Video,
    Drone,
    Audio,
    Image,
    Srt,
    Unknown,
}

impl DeviceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Video => "video",
            DeviceType::Drone => "drone",
            DeviceType::Audio => "audio",
            DeviceType::Image => "image",
            DeviceType::Srt => "srt",
            DeviceType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("no timestamp found in {0}")]
    MissingTag(String),

    #[error("could not parse timestamp '{value}' in {source_name}")]
    ParseFailure { source_name: String, value: String },

    #[error("unsupported media format: {0}")]
    UnsupportedFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Source of capture timestamps and device labels for media files.
///
/// Implementations never fail outright: a missing timestamp is `None`, an
/// unrecognised device is [`DeviceType::Unknown`].
pub trait MetadataService: Send + Sync {
    fn resolve_timestamp(&self, path: &Path, extension: &str) -> Option<NaiveDateTime>;
    fn resolve_device_type(&self, path: &Path, extension: &str) -> DeviceType;
}
