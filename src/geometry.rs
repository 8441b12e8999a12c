// ABOUTME: Geometry resolution for exported slides
// ABOUTME: Turns optional width/height constraints and a slide aspect ratio into pixel sizes

use crate::errors::{ExportError, Result};

/// Width used when the caller constrains neither dimension
pub const DEFAULT_WIDTH: u32 = 1280;

/// Largest accepted side of an exported image, in pixels
pub const MAX_DIMENSION: u32 = 16_384;

/// Largest accepted area of an exported image (8192 x 8192)
pub const MAX_PIXELS: u64 = 67_108_864;

/// Requested output size; either dimension may be left open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SizeSpec {
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl SizeSpec {
    /// Build a size request, rejecting zero or more than [`MAX_DIMENSION`]
    /// for any given dimension
    pub fn new(width: Option<u32>, height: Option<u32>) -> Result<Self> {
        check_side("Width", width)?;
        check_side("Height", height)?;
        Ok(Self { width, height })
    }
}

/// Height divided by width of a slide's native canvas.
///
/// This is the only orientation used anywhere in the crate: a missing height
/// is `width * ratio`, a missing width is `height / ratio`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AspectRatio(f64);

impl AspectRatio {
    pub fn new(ratio: f64) -> Result<Self> {
        if ratio.is_finite() && ratio > 0.0 {
            Ok(Self(ratio))
        } else {
            Err(ExportError::InvalidAspectRatio(ratio))
        }
    }

    /// Ratio of a canvas given in any unit (EMUs, pixels)
    pub fn from_canvas(width: i64, height: i64) -> Result<Self> {
        if width <= 0 || height <= 0 {
            return Err(ExportError::InvalidAspectRatio(0.0));
        }
        Self::new(height as f64 / width as f64)
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

/// Final pixel size of one exported image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn pixel_count(self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Refuse sizes too large to render. A valid request can still scale
    /// past the limits on a very tall or very wide slide.
    pub fn within_limits(self) -> Result<Self> {
        if self.width > MAX_DIMENSION || self.height > MAX_DIMENSION {
            return Err(ExportError::ValidationError(format!(
                "Image size {} exceeds the {} pixel limit per side.",
                self, MAX_DIMENSION
            )));
        }
        if self.pixel_count() > MAX_PIXELS {
            return Err(ExportError::ValidationError(format!(
                "Image size {} exceeds the {} pixel area limit.",
                self, MAX_PIXELS
            )));
        }
        Ok(self)
    }
}

impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Resolve the output size of a slide.
///
/// Precedence: both given (used as-is, distortion accepted), only width,
/// only height, then neither (default width). Inputs are assumed validated by
/// [`SizeSpec::new`]; a scaled side never drops below one pixel.
pub fn resolve(size: SizeSpec, ratio: AspectRatio) -> Dimensions {
    let ratio = ratio.value();
    match (size.width, size.height) {
        (Some(width), Some(height)) => Dimensions::new(width, height),
        (Some(width), None) => Dimensions::new(width, scale(width as f64 * ratio)),
        (None, Some(height)) => Dimensions::new(scale(height as f64 / ratio), height),
        (None, None) => Dimensions::new(DEFAULT_WIDTH, scale(DEFAULT_WIDTH as f64 * ratio)),
    }
}

fn check_side(name: &str, value: Option<u32>) -> Result<()> {
    match value {
        Some(0) => Err(ExportError::ValidationError(format!(
            "{} must be a positive integer.",
            name
        ))),
        Some(value) if value > MAX_DIMENSION => Err(ExportError::ValidationError(format!(
            "{} must be at most {} pixels, got {}.",
            name, MAX_DIMENSION, value
        ))),
        _ => Ok(()),
    }
}

fn scale(value: f64) -> u32 {
    value.round().clamp(1.0, u32::MAX as f64) as u32
}
