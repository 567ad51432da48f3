use crate::error::Error;
use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub ignore_patterns: Vec<String>,
    pub extensions: ExtensionSets,
    pub copy: CopySettings,
}

/// Extension allow-lists, lower-case with a leading dot.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtensionSets {
    pub video: BTreeSet<String>,
    pub audio: BTreeSet<String>,
    pub image: BTreeSet<String>,
    pub raw: BTreeSet<String>,
    pub subtitle: BTreeSet<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CopySettings {
    pub max_attempts: u32,
    pub retry_delay_ms: u64,
}

/// Per-run switches supplied on the command line.
#[derive(Debug, Clone, Default)]
pub struct ArchiveOptions {
    pub skip_raw: bool,
    pub overwrite: bool,
    pub ignore_subtitles: bool,
    pub device_tag: Option<String>,
    /// 0 disables the filter, 1 means "since local midnight today".
    pub recent_days: u32,
}

fn set_of(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for ExtensionSets {
    fn default() -> Self {
        Self {
            video: set_of(&[".mp4", ".mov"]),
            audio: set_of(&[".m4a", ".wav", ".aac", ".mp3"]),
            image: set_of(&[".jpg", ".jpeg", ".png"]),
            raw: set_of(&[".raw", ".dng", ".cr2", ".nef", ".arw", ".gpr"]),
            subtitle: set_of(&[".srt"]),
        }
    }
}

impl Default for CopySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay_ms: 1000,
        }
    }
}

impl CopySettings {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

/// Lower-cases an extension and makes sure it carries a leading dot.
pub fn normalize_extension(ext: &str) -> String {
    let lower = ext.trim().to_lowercase();
    if lower.starts_with('.') {
        lower
    } else {
        format!(".{}", lower)
    }
}

impl ExtensionSets {
    pub fn normalized(self) -> Self {
        let norm = |set: BTreeSet<String>| -> BTreeSet<String> {
            set.iter()
                .filter(|s| !s.trim().is_empty())
                .map(|s| normalize_extension(s))
                .collect()
        };
        Self {
            video: norm(self.video),
            audio: norm(self.audio),
            image: norm(self.image),
            raw: norm(self.raw),
            subtitle: norm(self.subtitle),
        }
    }

    pub fn is_supported(&self, ext: &str) -> bool {
        self.is_video(ext)
            || self.is_audio(ext)
            || self.is_image(ext)
            || self.is_raw(ext)
            || self.is_subtitle(ext)
    }

    pub fn is_video(&self, ext: &str) -> bool {
        self.video.contains(&normalize_extension(ext))
    }

    pub fn is_audio(&self, ext: &str) -> bool {
        self.audio.contains(&normalize_extension(ext))
    }

    pub fn is_image(&self, ext: &str) -> bool {
        self.image.contains(&normalize_extension(ext))
    }

    pub fn is_raw(&self, ext: &str) -> bool {
        self.raw.contains(&normalize_extension(ext))
    }

    pub fn is_subtitle(&self, ext: &str) -> bool {
        self.subtitle.contains(&normalize_extension(ext))
    }
}

/// Loads `Config.toml` from the working directory if present, then applies
/// `ARCHIVER__*` environment overrides.
pub fn load_configuration() -> Result<AppConfig, Error> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name("Config").required(false))
        .add_source(environment())
        .build()?;
    Ok(finish(builder)?)
}

/// Same as [`load_configuration`] but reads an explicit file, which must exist.
pub fn load_configuration_from(path: &Path) -> Result<AppConfig, Error> {
    let builder = Config::builder()
        .add_source(ConfigFile::from(path))
        .add_source(environment())
        .build()?;
    Ok(finish(builder)?)
}

fn environment() -> Environment {
    Environment::with_prefix("ARCHIVER")
        .separator("__")
        .try_parsing(true)
}

fn finish(config: Config) -> Result<AppConfig, ConfigError> {
    let mut app_config = config.try_deserialize::<AppConfig>()?;
    app_config.extensions = app_config.extensions.normalized();
    if app_config.copy.max_attempts == 0 {
        return Err(ConfigError::Message(
            "copy.max_attempts must be at least 1".to_string(),
        ));
    }
    Ok(app_config)
}
