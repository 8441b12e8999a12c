// ABOUTME: Export orchestration for the pptx-png exporter
// ABOUTME: Checks freshness, sizes each slide, renders it and stamps the result

use crate::config::{ExportConfig, FailurePolicy};
use crate::document::{DocumentReader, PptxDocument};
use crate::errors::{ExportError, Result};
use crate::freshness::{self, DirectoryProbe};
use crate::geometry::{self, AspectRatio};
use crate::metadata;
use crate::render::{EmbeddedPictureRenderer, OfficeRenderer, RendererKind, SlideRenderer};
use crate::target::ExportTarget;
use crate::utils;
use log::{debug, error, info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// A slide that could not be exported
#[derive(Debug)]
pub struct SlideFailure {
    pub ordinal: u32,
    pub error: ExportError,
}

/// Outcome of an export run
#[derive(Debug, Default)]
pub struct ExportReport {
    pub slide_count: u32,
    /// Every image was already current; nothing was rendered
    pub up_to_date: bool,
    /// Images written by this run, in slide order
    pub written: Vec<PathBuf>,
    pub failures: Vec<SlideFailure>,
    /// Leftover images removed because their slide no longer exists
    pub pruned: Vec<PathBuf>,
}

impl ExportReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Export every slide of `source` as a PNG, unless all images are current.
pub fn export_presentation(source: &Path, config: &ExportConfig) -> Result<ExportReport> {
    info!("Processing file: {:?}", source);

    let document = PptxDocument::open(source)?;
    let destination = config
        .destination
        .clone()
        .unwrap_or_else(|| utils::default_destination(source));
    utils::ensure_directory_exists(&destination)?;
    info!("Output directory: {:?}", destination);

    let source_timestamp = utils::modification_timestamp(source)?;
    let target = ExportTarget::for_document(&destination, source)?;

    match config.renderer {
        RendererKind::Embedded => run_export(&document, source_timestamp, &target, config, || {
            EmbeddedPictureRenderer::open(&document)
        }),
        RendererKind::Office => run_export(&document, source_timestamp, &target, config, || {
            OfficeRenderer::open(source, &config.office)
        }),
    }
}

/// Run an export against any document and renderer.
///
/// `open_renderer` is only called when at least one image is missing or
/// stale, so an up-to-date run never starts a rendering session. The session
/// is dropped before this returns, whatever the outcome.
pub fn run_export<D, R, F>(
    document: &D,
    source_timestamp: f64,
    target: &ExportTarget,
    config: &ExportConfig,
    open_renderer: F,
) -> Result<ExportReport>
where
    D: DocumentReader + ?Sized,
    R: SlideRenderer,
    F: FnOnce() -> Result<R>,
{
    let slide_count = document.slide_count();
    let mut report = ExportReport {
        slide_count,
        ..ExportReport::default()
    };

    let probe = DirectoryProbe::new(target);
    if !freshness::needs_export(source_timestamp, slide_count, &probe) {
        info!("Nothing to export for {}", target.stem());
        report.up_to_date = true;
    } else {
        let mut renderer = open_renderer()?;
        let started = Instant::now();

        for ordinal in 1..=slide_count {
            match export_slide(&mut renderer, document, target, config, ordinal, source_timestamp) {
                Ok(path) => {
                    info!("Created PNG: {:?}", path);
                    report.written.push(path);
                }
                Err(e) => {
                    error!("Failed to export slide {}: {}", ordinal, e);
                    if config.on_failure == FailurePolicy::Abort {
                        return Err(e);
                    }
                    report.failures.push(SlideFailure { ordinal, error: e });
                }
            }
        }

        info!(
            "Exported {} of {} slides in {:.2} seconds",
            report.written.len(),
            slide_count,
            started.elapsed().as_secs_f64()
        );
    }

    if config.prune {
        report.pruned = prune_orphans(target, slide_count)?;
    }

    Ok(report)
}

/// Render one slide into a staging directory, stamp it, then move it into place.
fn export_slide<D, R>(
    renderer: &mut R,
    document: &D,
    target: &ExportTarget,
    config: &ExportConfig,
    ordinal: u32,
    source_timestamp: f64,
) -> Result<PathBuf>
where
    D: DocumentReader + ?Sized,
    R: SlideRenderer,
{
    let ratio = document
        .aspect_ratio(ordinal)
        .ok_or_else(|| ExportError::MalformedSlide {
            ordinal,
            reason: "slide has no usable width and height".to_string(),
        })
        .and_then(AspectRatio::new)
        .map_err(|e| match e {
            ExportError::InvalidAspectRatio(ratio) => ExportError::MalformedSlide {
                ordinal,
                reason: format!("aspect ratio {} is not positive", ratio),
            },
            other => other,
        })?;
    let dims = geometry::resolve(config.size, ratio).within_limits()?;
    debug!("Slide {} resolves to {}", ordinal, dims);

    let staging = tempfile::Builder::new()
        .prefix(".pptx-png-")
        .tempdir_in(target.dir())?;
    let staged = staging.path().join(target.file_name(ordinal));

    renderer.render(ordinal, &staged, dims)?;
    if !staged.is_file() {
        return Err(ExportError::RenderError {
            message: format!("renderer produced no image for slide {}", ordinal),
            source: None,
        });
    }
    metadata::embed(&staged, source_timestamp)?;

    let output = target.path_for(ordinal);
    fs::rename(&staged, &output)?;
    Ok(output)
}

/// Remove images for ordinals past the end of the document
fn prune_orphans(target: &ExportTarget, slide_count: u32) -> Result<Vec<PathBuf>> {
    let pattern = target.artifact_pattern();
    let entries = glob::glob(&pattern)
        .map_err(|e| ExportError::ConfigError(format!("Invalid glob pattern: {}", e)))?;

    let mut pruned = Vec::new();
    for path in entries.flatten() {
        let ordinal = path
            .file_name()
            .and_then(|name| target.ordinal_of(&name.to_string_lossy()));

        match ordinal {
            Some(ordinal) if ordinal > slide_count => {
                info!("Removing leftover image for slide {}: {:?}", ordinal, path);
                fs::remove_file(&path)?;
                pruned.push(path);
            }
            Some(_) => {}
            None => warn!("Not pruning {:?}: name does not match the export naming", path),
        }
    }

    pruned.sort();
    Ok(pruned)
}
