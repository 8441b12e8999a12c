// ABOUTME: Error types for the pptx-png exporter
// ABOUTME: Provides structured error handling for each stage of the export

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("File operation failed: {0}")]
    FileError(#[from] std::io::Error),

    #[error("Input validation error: {0}")]
    ValidationError(String),

    #[error("Path not found: {0}")]
    PathNotFoundError(PathBuf),

    #[error("Presentation document error: {0}")]
    DocumentError(String),

    #[error("Slide {ordinal} is malformed: {reason}")]
    MalformedSlide { ordinal: u32, reason: String },

    #[error("Invalid aspect ratio {0}: must be a positive, finite number")]
    InvalidAspectRatio(f64),

    #[error("Renderer error: {message}")]
    RenderError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Image error: {0}")]
    ImageError(String),

    #[error("Metadata error: {0}")]
    MetadataError(String),

    #[error("Timeout error: {0}")]
    TimeoutError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Unknown error: {0}")]
    UnknownError(String),
}

// Implement conversion from anyhow::Error to our ExportError
impl From<anyhow::Error> for ExportError {
    fn from(err: anyhow::Error) -> Self {
        ExportError::UnknownError(err.to_string())
    }
}

impl From<zip::result::ZipError> for ExportError {
    fn from(err: zip::result::ZipError) -> Self {
        ExportError::DocumentError(format!("ZIP operation failed: {}", err))
    }
}

impl From<quick_xml::Error> for ExportError {
    fn from(err: quick_xml::Error) -> Self {
        ExportError::DocumentError(format!("XML parsing failed: {}", err))
    }
}

impl From<image::ImageError> for ExportError {
    fn from(err: image::ImageError) -> Self {
        ExportError::ImageError(err.to_string())
    }
}

impl From<png::DecodingError> for ExportError {
    fn from(err: png::DecodingError) -> Self {
        ExportError::MetadataError(format!("PNG decoding failed: {}", err))
    }
}

impl From<png::EncodingError> for ExportError {
    fn from(err: png::EncodingError) -> Self {
        ExportError::MetadataError(format!("PNG encoding failed: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, ExportError>;
