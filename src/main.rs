// ABOUTME: Main entry point for the pptx-png program.
// ABOUTME: Provides CLI interface and executes exports from the library.

use anyhow::Context;
use clap::Parser;
use pptx_png::freshness::{self, DirectoryProbe};
use pptx_png::geometry::MAX_DIMENSION;
use pptx_png::{Config, DocumentReader, ExportTarget, FailurePolicy, PptxDocument, RendererKind};
use std::path::{Path, PathBuf};

/// Convert PowerPoint slides to PNG images.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the source PowerPoint (.pptx) file
    source: PathBuf,

    /// Destination folder for PNG files. Defaults to the source location
    #[arg(short, long)]
    destination: Option<PathBuf>,

    /// Fixed width for PNG. Height scales to keep the aspect ratio if --height is not given
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=MAX_DIMENSION as i64))]
    width: Option<u32>,

    /// Fixed height for PNG. Width scales to keep the aspect ratio if --width is not given
    #[arg(
        short = 'H',
        long,
        value_parser = clap::value_parser!(u32).range(1..=MAX_DIMENSION as i64)
    )]
    height: Option<u32>,

    /// Log each file being processed
    #[arg(short, long)]
    log: bool,

    /// Renderer: 'embedded' scales each slide's picture, 'office' uses LibreOffice
    #[arg(long)]
    renderer: Option<RendererKind>,

    /// What to do when one slide fails: 'continue' or 'abort'
    #[arg(long)]
    on_failure: Option<FailurePolicy>,

    /// Timeout in milliseconds for each external office/rasteriser call
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    timeout_ms: Option<u64>,

    /// Remove images of slides that no longer exist in the document
    #[arg(long)]
    prune: bool,

    /// Only report which slide images are missing, stale or current
    #[arg(long)]
    check: bool,
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.log { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let result = if cli.check { check(&cli) } else { export(&cli) };

    // Export errors are reported, not signalled: the process still exits 0.
    // Invalid arguments are rejected by clap with status 2.
    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
    }
}

fn export(cli: &Cli) -> anyhow::Result<()> {
    let config = Config::from_env().get_export_config(
        cli.destination.clone(),
        cli.width,
        cli.height,
        cli.renderer,
        cli.on_failure,
        cli.timeout_ms,
        cli.prune,
    )?;

    let report = pptx_png::export_presentation(&cli.source, &config)
        .with_context(|| format!("Failed to export {:?}", cli.source))?;

    if report.up_to_date {
        println!("All {} slide images are up to date.", report.slide_count);
    } else {
        println!(
            "Exported {} of {} slides.",
            report.written.len(),
            report.slide_count
        );
    }
    for path in &report.pruned {
        println!("Removed {}", path.display());
    }
    for failure in &report.failures {
        eprintln!("Slide {}: {}", failure.ordinal, failure.error);
    }

    if !report.is_success() {
        anyhow::bail!("{} slide(s) failed to export", report.failures.len());
    }
    Ok(())
}

fn check(cli: &Cli) -> anyhow::Result<()> {
    let document = PptxDocument::open(&cli.source)?;
    let destination = cli
        .destination
        .clone()
        .unwrap_or_else(|| pptx_png::utils::default_destination(&cli.source));
    let target = ExportTarget::for_document(&destination, &cli.source)?;
    let source_timestamp = pptx_png::utils::modification_timestamp(&cli.source)?;

    let probe = DirectoryProbe::new(&target);
    let report = freshness::freshness_report(source_timestamp, document.slide_count(), &probe);
    for (ordinal, state) in &report {
        println!("{}: {}", display_name(&target.path_for(*ordinal)), state.label());
    }

    if report.iter().all(|(_, state)| state.is_current()) {
        println!("Up to date.");
    } else {
        println!("Export needed.");
    }
    Ok(())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
