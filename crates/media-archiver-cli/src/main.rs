mod commands;
mod logging;
mod progress;

use std::fs;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::Parser;
use colored::*;
use commands::Cli;
use dotenv::dotenv;
use media_archiver_core::config::{load_configuration, load_configuration_from};
use media_archiver_core::{ArchiveEngine, ArchiveOptions};
use progress::CliReporter;
use tracing::{debug, error, info};

fn main() -> ExitCode {
    dotenv().ok();

    let args = Cli::parse();

    let _guard = logging::init_logger(args.verbose);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Cli) -> anyhow::Result<()> {
    let config = match &args.config {
        Some(path) => load_configuration_from(path),
        None => load_configuration(),
    }
    .context("Error loading configuration")?;
    debug!("Configuration: {:?}", config);

    validate_paths(&args.source, &args.destination)?;

    let options = ArchiveOptions {
        skip_raw: args.skip_raw,
        overwrite: args.overwrite,
        ignore_subtitles: args.ignore_subtitles,
        device_tag: args.tag,
        recent_days: args.recent_days,
    };

    let engine = ArchiveEngine::new(&args.source, &args.destination, options, config);
    let reporter = CliReporter::new();
    let report = engine.run(&reporter);

    // Colour goes to the terminal only; the log file gets the engine's plain summary.
    println!();
    println!(
        "{} copied, {} skipped/failed ({} duplicate, {} without timestamp, {} failed) in {}",
        report.copied.to_string().green(),
        report.skipped_or_failed().to_string().yellow(),
        report.duplicates,
        report.no_timestamp,
        report.failed.to_string().red(),
        format!("{:.2}s", report.duration.as_secs_f64()).green(),
    );

    Ok(())
}

/// Source must be an existing directory; destination is created if missing
/// and probed for write access.
fn validate_paths(source: &Path, destination: &Path) -> anyhow::Result<()> {
    if !source.exists() {
        bail!("Source directory does not exist: {}", source.display());
    }
    if !source.is_dir() {
        bail!("Source path is not a directory: {}", source.display());
    }

    if !destination.exists() {
        fs::create_dir_all(destination).with_context(|| {
            format!(
                "Error creating destination directory: {}",
                destination.display()
            )
        })?;
        info!("Created destination directory: {}", destination.display());
    }
    if !destination.is_dir() {
        bail!(
            "Destination path is not a directory: {}",
            destination.display()
        );
    }

    let probe = destination.join(".write_test");
    fs::write(&probe, b"")
        .and_then(|_| fs::remove_file(&probe))
        .with_context(|| {
            format!(
                "No write permission in destination directory: {}",
                destination.display()
            )
        })?;

    Ok(())
}
