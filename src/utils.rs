// ABOUTME: Utility functions for the pptx-png exporter
// ABOUTME: Provides validation of inputs, directory handling and timestamps

use crate::errors::{ExportError, Result};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

/// File extension accepted for source documents (compared case-insensitively)
pub const PRESENTATION_EXTENSION: &str = "pptx";

/// Validate that a file exists
pub fn validate_file_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(ExportError::PathNotFoundError(path.to_path_buf()));
    }
    if !path.is_file() {
        return Err(ExportError::ValidationError(format!(
            "Path is not a file: {:?}",
            path
        )));
    }
    Ok(())
}

/// Validate that a path points at an existing `.pptx` document
pub fn validate_presentation(path: &Path) -> Result<()> {
    validate_file_exists(path)?;

    let has_extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case(PRESENTATION_EXTENSION))
        .unwrap_or(false);

    if !has_extension {
        return Err(ExportError::ValidationError(format!(
            "Source must be a .{} file: {:?}",
            PRESENTATION_EXTENSION, path
        )));
    }
    Ok(())
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_directory_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    } else if !path.is_dir() {
        return Err(ExportError::ValidationError(format!(
            "Path exists but is not a directory: {:?}",
            path
        )));
    }
    Ok(())
}

/// Directory that holds the source document, used when no destination is given
pub fn default_destination(source: &Path) -> PathBuf {
    match source.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// File stem of the source document, used as the prefix of every output
pub fn document_stem(source: &Path) -> Result<String> {
    source
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
        .ok_or_else(|| {
            ExportError::ValidationError(format!("Source has no file name: {:?}", source))
        })
}

/// Modification time of a file as real-valued seconds since the Unix epoch
pub fn modification_timestamp(path: &Path) -> Result<f64> {
    let modified = std::fs::metadata(path)?.modified()?;
    let since_epoch = modified.duration_since(UNIX_EPOCH).map_err(|e| {
        ExportError::ValidationError(format!(
            "Modification time of {:?} predates the Unix epoch: {}",
            path, e
        ))
    })?;
    Ok(since_epoch.as_secs_f64())
}

/// Human-readable UTC rendering of an epoch timestamp for log output
pub fn format_timestamp(timestamp: f64) -> String {
    let secs = timestamp.floor();
    let nanos = ((timestamp - secs) * 1e9) as u32;
    match DateTime::<Utc>::from_timestamp(secs as i64, nanos) {
        Some(datetime) => datetime.format("%Y-%m-%d %H:%M:%S%.3f UTC").to_string(),
        None => format!("{} (epoch seconds)", timestamp),
    }
}
