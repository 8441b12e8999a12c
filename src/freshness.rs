// ABOUTME: Freshness checks for previously exported slide images
// ABOUTME: Decides whether a document's images must be regenerated

use crate::metadata;
use crate::target::ExportTarget;
use crate::utils;
use log::{debug, info};

/// State of one expected output image relative to its source document
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Freshness {
    /// No image exists for the ordinal
    Missing,
    /// The image predates the source (or carries no usable timestamp)
    Stale { embedded: f64 },
    /// The image was produced from the current source or a newer one
    Current { embedded: f64 },
}

impl Freshness {
    pub fn is_current(&self) -> bool {
        matches!(self, Freshness::Current { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Freshness::Missing => "missing",
            Freshness::Stale { .. } => "stale",
            Freshness::Current { .. } => "current",
        }
    }
}

/// Looks up the embedded timestamp of the artifact for an ordinal.
///
/// `None` means no artifact exists. An artifact whose timestamp cannot be
/// read must report `Some(0.0)`.
pub trait ArtifactProbe {
    fn embedded_timestamp(&self, ordinal: u32) -> Option<f64>;
}

impl<F> ArtifactProbe for F
where
    F: Fn(u32) -> Option<f64>,
{
    fn embedded_timestamp(&self, ordinal: u32) -> Option<f64> {
        self(ordinal)
    }
}

/// Probe that reads artifacts from an export directory on disk
pub struct DirectoryProbe<'a> {
    target: &'a ExportTarget,
}

impl<'a> DirectoryProbe<'a> {
    pub fn new(target: &'a ExportTarget) -> Self {
        Self { target }
    }
}

impl ArtifactProbe for DirectoryProbe<'_> {
    fn embedded_timestamp(&self, ordinal: u32) -> Option<f64> {
        let path = self.target.path_for(ordinal);
        if !path.is_file() {
            return None;
        }
        Some(metadata::read_timestamp(&path))
    }
}

/// Classify one artifact given what the probe found
pub fn assess(source_timestamp: f64, embedded: Option<f64>) -> Freshness {
    match embedded {
        None => Freshness::Missing,
        Some(embedded) if embedded < source_timestamp => Freshness::Stale { embedded },
        Some(embedded) => Freshness::Current { embedded },
    }
}

/// Whether the document's images must be regenerated.
///
/// The decision covers the whole batch: the first missing or stale ordinal
/// in `1..=slide_count` answers `true` without probing the rest. Only reads.
pub fn needs_export<P>(source_timestamp: f64, slide_count: u32, probe: &P) -> bool
where
    P: ArtifactProbe + ?Sized,
{
    debug!(
        "Checking {} slide image(s) against source modified at {}",
        slide_count,
        utils::format_timestamp(source_timestamp)
    );

    for ordinal in 1..=slide_count {
        match assess(source_timestamp, probe.embedded_timestamp(ordinal)) {
            Freshness::Missing => {
                info!("Slide {} has no image; exporting all slides", ordinal);
                return true;
            }
            Freshness::Stale { embedded } => {
                info!(
                    "Slide {} image is stale (made from source at {}); exporting all slides",
                    ordinal,
                    utils::format_timestamp(embedded)
                );
                return true;
            }
            Freshness::Current { .. } => {
                debug!("Slide {} image is current", ordinal);
            }
        }
    }

    info!("All {} slide image(s) are up to date", slide_count);
    false
}

/// Per-slide freshness of every expected artifact, without short-circuiting
pub fn freshness_report<P>(
    source_timestamp: f64,
    slide_count: u32,
    probe: &P,
) -> Vec<(u32, Freshness)>
where
    P: ArtifactProbe + ?Sized,
{
    (1..=slide_count)
        .map(|ordinal| {
            (
                ordinal,
                assess(source_timestamp, probe.embedded_timestamp(ordinal)),
            )
        })
        .collect()
}
