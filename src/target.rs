// ABOUTME: Output naming for exported slides
// ABOUTME: Maps a document stem and slide ordinal to a deterministic PNG path

use crate::errors::Result;
use crate::utils;
use std::path::{Path, PathBuf};

/// Where the images of one document go and what they are called.
///
/// Every output is named `{stem}-slide-{NN}.png` with a 1-based, two-digit
/// (at least) zero-padded ordinal, so the stem and ordinal alone locate an
/// artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportTarget {
    dir: PathBuf,
    stem: String,
}

impl ExportTarget {
    pub fn new(dir: impl Into<PathBuf>, stem: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            stem: stem.into(),
        }
    }

    /// Target for a source document, named after the document's file stem
    pub fn for_document(dir: &Path, source: &Path) -> Result<Self> {
        Ok(Self::new(dir, utils::document_stem(source)?))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn stem(&self) -> &str {
        &self.stem
    }

    /// File name of the image for a slide ordinal
    pub fn file_name(&self, ordinal: u32) -> String {
        format!("{}-slide-{:02}.png", self.stem, ordinal)
    }

    /// Full path of the image for a slide ordinal
    pub fn path_for(&self, ordinal: u32) -> PathBuf {
        self.dir.join(self.file_name(ordinal))
    }

    /// Inverse of [`ExportTarget::file_name`]: the ordinal encoded in a file
    /// name produced for this target, if any.
    pub fn ordinal_of(&self, file_name: &str) -> Option<u32> {
        let digits = file_name
            .strip_prefix(self.stem.as_str())?
            .strip_prefix("-slide-")?
            .strip_suffix(".png")?;

        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        // Reject padding file_name would never produce, e.g. "003"
        digits
            .parse::<u32>()
            .ok()
            .filter(|ordinal| *ordinal > 0 && self.file_name(*ordinal) == file_name)
    }

    /// Glob pattern matching every image this target could have produced
    pub fn artifact_pattern(&self) -> String {
        let dir = glob::Pattern::escape(&self.dir.to_string_lossy());
        let stem = glob::Pattern::escape(&self.stem);
        format!("{}/{}-slide-*.png", dir, stem)
    }
}
