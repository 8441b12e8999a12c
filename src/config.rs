// ABOUTME: Configuration module for the pptx-png exporter
// ABOUTME: Provides configuration settings and environment variable handling

use crate::errors::{ExportError, Result};
use crate::geometry::SizeSpec;
use crate::render::{OfficeTools, RendererKind};
use log::warn;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// What to do when a single slide fails to export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Report the failure and carry on with the next slide
    #[default]
    Continue,
    /// Stop the run at the first failing slide
    Abort,
}

impl FromStr for FailurePolicy {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "continue" => Ok(FailurePolicy::Continue),
            "abort" => Ok(FailurePolicy::Abort),
            other => Err(ExportError::ConfigError(format!(
                "Unknown failure policy: {} (expected 'continue' or 'abort')",
                other
            ))),
        }
    }
}

/// Settings for one export run
#[derive(Debug, Clone, Default)]
pub struct ExportConfig {
    /// Output directory; the source's directory when absent
    pub destination: Option<PathBuf>,
    pub size: SizeSpec,
    pub renderer: RendererKind,
    pub on_failure: FailurePolicy,
    /// Remove images left over from slides that no longer exist
    pub prune: bool,
    pub office: OfficeTools,
}

/// Global configuration for the application
pub struct Config {
    pub converter_path: String,
    pub rasterizer_path: String,
    pub default_timeout_ms: u64,
    pub renderer: RendererKind,
    pub on_failure: FailurePolicy,
}

impl Default for Config {
    fn default() -> Self {
        let tools = OfficeTools::default();
        Self {
            converter_path: tools.converter,
            rasterizer_path: tools.rasterizer,
            default_timeout_ms: tools.timeout_ms,
            renderer: RendererKind::default(),
            on_failure: FailurePolicy::default(),
        }
    }
}

impl Config {
    /// Create a new configuration instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let converter_path = env::var("SOFFICE_PATH")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.converter_path);
        let rasterizer_path = env::var("PDFTOPPM_PATH")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.rasterizer_path);
        let default_timeout_ms = env::var("EXPORT_TIMEOUT_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(defaults.default_timeout_ms);
        let renderer = parse_env_or("EXPORT_RENDERER", defaults.renderer);
        let on_failure = parse_env_or("EXPORT_ON_FAILURE", defaults.on_failure);

        Self {
            converter_path,
            rasterizer_path,
            default_timeout_ms,
            renderer,
            on_failure,
        }
    }

    /// Get an export configuration, filling unset options from this config
    pub fn get_export_config(
        &self,
        destination: Option<PathBuf>,
        width: Option<u32>,
        height: Option<u32>,
        renderer: Option<RendererKind>,
        on_failure: Option<FailurePolicy>,
        timeout_ms: Option<u64>,
        prune: bool,
    ) -> Result<ExportConfig> {
        Ok(ExportConfig {
            destination,
            size: SizeSpec::new(width, height)?,
            renderer: renderer.unwrap_or(self.renderer),
            on_failure: on_failure.unwrap_or(self.on_failure),
            prune,
            office: OfficeTools {
                converter: self.converter_path.clone(),
                rasterizer: self.rasterizer_path.clone(),
                timeout_ms: timeout_ms.unwrap_or(self.default_timeout_ms),
            },
        })
    }
}

fn parse_env_or<T: FromStr<Err = ExportError>>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(value) if !value.is_empty() => value.parse().unwrap_or_else(|e| {
            warn!("Ignoring {}: {}", key, e);
            default
        }),
        _ => default,
    }
}
