use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "media-archiver")]
#[command(
    about = "Archive and rename media files into a dated YYYY/MM/DD tree",
    long_about = None,
    after_help = concat!(
        "Examples:\n",
        "  media-archiver --source ./media --destination ./archive\n",
        "  media-archiver --source /Volumes/SDCard --destination ~/Videos/Archive --skip-raw",
    )
)]
pub struct Cli {
    /// Source directory containing media files to archive
    #[arg(long)]
    pub source: PathBuf,

    /// Destination directory where renamed files will be copied
    #[arg(long)]
    pub destination: PathBuf,

    /// Skip raw image files (.raw, .dng, .cr2, .nef, .arw, .gpr)
    #[arg(long)]
    pub skip_raw: bool,

    /// Replace destination files whose content differs instead of numbering a new copy
    #[arg(long)]
    pub overwrite: bool,

    /// Skip subtitle/telemetry files (.srt)
    #[arg(long)]
    pub ignore_subtitles: bool,

    /// Extra tag appended to every filename, e.g. a camera name
    #[arg(long, value_name = "TAG")]
    pub tag: Option<String>,

    /// Only include files modified in the last N calendar days (0 = all, 1 = since midnight)
    #[arg(long, value_name = "N", default_value_t = 0)]
    pub recent_days: u32,

    /// Configuration file (defaults to ./Config.toml if present)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}
