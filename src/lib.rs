// ABOUTME: Library module for the pptx-png exporter.
// ABOUTME: Contains freshness checks, geometry, metadata and the export pipeline.

// Reexport modules
pub mod config;
pub mod document;
pub mod errors;
pub mod export;
pub mod freshness;
pub mod geometry;
pub mod metadata;
pub mod render;
pub mod target;
pub mod utils;

// Reexport common types and functions
pub use config::{Config, ExportConfig, FailurePolicy};
pub use document::{DocumentReader, PptxDocument, Slide};
pub use errors::{ExportError, Result};
pub use export::{export_presentation, run_export, ExportReport, SlideFailure};
pub use freshness::{needs_export, ArtifactProbe, DirectoryProbe, Freshness};
pub use geometry::{resolve, AspectRatio, Dimensions, SizeSpec, DEFAULT_WIDTH};
pub use render::{EmbeddedPictureRenderer, OfficeRenderer, OfficeTools, RendererKind, SlideRenderer};
pub use target::ExportTarget;
