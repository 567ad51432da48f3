pub mod config;
pub mod copier;
pub mod engine;
pub mod error;
pub mod hasher;
pub mod metadata;
pub mod naming;
pub mod progress;
pub mod scanner;

pub use crate::config::{AppConfig, ArchiveOptions};
pub use crate::engine::{ArchiveEngine, ArchiveReport, FileOutcome};
pub use crate::error::Error;
pub use crate::metadata::{DeviceType, MetadataService};
pub use crate::progress::{ProgressReporter, SilentReporter};
