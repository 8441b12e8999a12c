// ABOUTME: Slide rendering sessions for the pptx-png exporter
// ABOUTME: Produces a PNG of one slide at exact pixel dimensions

use crate::document::{self, PptxDocument};
use crate::errors::{ExportError, Result};
use crate::geometry::Dimensions;
use image::imageops::FilterType;
use image::ImageFormat;
use log::{debug, info, warn};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::str::FromStr;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use zip::ZipArchive;

const IMAGE_RELATIONSHIP_SUFFIX: &str = "/image";

/// Impress PDF export filter that keeps hidden slides, so page N of the
/// converted PDF is always slide N of the document
pub const PDF_CONVERSION_FILTER: &str =
    r#"pdf:impress_pdf_Export:{"ExportHiddenSlides":{"type":"boolean","value":"true"}}"#;

/// A rendering session for one document.
///
/// Slides are rendered one at a time, in order. Whatever the session holds
/// (open archives, scratch files, converted documents) is released when the
/// value is dropped, on success and on error alike.
pub trait SlideRenderer {
    /// Write slide `ordinal` as a PNG of exactly `dims` pixels to `output`
    fn render(&mut self, ordinal: u32, output: &Path, dims: Dimensions) -> Result<()>;
}

impl<R: SlideRenderer + ?Sized> SlideRenderer for Box<R> {
    fn render(&mut self, ordinal: u32, output: &Path, dims: Dimensions) -> Result<()> {
        (**self).render(ordinal, output, dims)
    }
}

/// Which renderer an export run uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RendererKind {
    /// Scale the first picture placed on each slide
    #[default]
    Embedded,
    /// Convert through a headless office suite and rasterise the pages
    Office,
}

impl FromStr for RendererKind {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "embedded" => Ok(RendererKind::Embedded),
            "office" => Ok(RendererKind::Office),
            other => Err(ExportError::ConfigError(format!(
                "Unknown renderer: {} (expected 'embedded' or 'office')",
                other
            ))),
        }
    }
}

/// Renders the picture each slide embeds, without any external program.
///
/// Slides made of a single full-bleed picture (exported decks, scanned
/// handouts) come out exactly; for other slides only the first picture is
/// used.
pub struct EmbeddedPictureRenderer {
    archive: ZipArchive<File>,
    document: PptxDocument,
}

impl EmbeddedPictureRenderer {
    pub fn open(document: &PptxDocument) -> Result<Self> {
        info!("Opening embedded picture renderer for {:?}", document.path());
        let archive = ZipArchive::new(File::open(document.path())?)?;
        Ok(Self {
            archive,
            document: document.clone(),
        })
    }

    /// Package part of the first picture placed on the slide
    fn first_picture(&mut self, ordinal: u32) -> Result<String> {
        let slide = self
            .document
            .slide(ordinal)
            .ok_or_else(|| ExportError::MalformedSlide {
                ordinal,
                reason: "slide is not part of the document".to_string(),
            })?
            .part_name
            .clone();

        let slide_xml = document::read_part_to_string(&mut self.archive, &slide)?;
        let rels_xml =
            document::read_part_to_string(&mut self.archive, &document::rels_part_name(&slide))?;
        let rels = document::parse_relationships(&rels_xml)?;

        let embed_id = first_blip_embed(&slide_xml)?.ok_or_else(|| ExportError::MalformedSlide {
            ordinal,
            reason: "slide contains no picture".to_string(),
        })?;

        match rels.get(&embed_id) {
            Some(rel) if !rel.external && rel.rel_type.ends_with(IMAGE_RELATIONSHIP_SUFFIX) => Ok(
                document::resolve_part_name(document::part_dir(&slide), &rel.target),
            ),
            Some(_) => Err(ExportError::MalformedSlide {
                ordinal,
                reason: format!("picture {} is not an embedded image", embed_id),
            }),
            None => Err(ExportError::MalformedSlide {
                ordinal,
                reason: format!("picture {} has no relationship", embed_id),
            }),
        }
    }
}

impl SlideRenderer for EmbeddedPictureRenderer {
    fn render(&mut self, ordinal: u32, output: &Path, dims: Dimensions) -> Result<()> {
        let picture = self.first_picture(ordinal)?;
        debug!("Slide {} uses picture {}", ordinal, picture);

        let bytes = document::read_part_to_bytes(&mut self.archive, &picture)?;
        let resized = image::load_from_memory(&bytes)?.resize_exact(
            dims.width,
            dims.height,
            FilterType::Lanczos3,
        );
        resized.save_with_format(output, ImageFormat::Png)?;
        Ok(())
    }
}

fn first_blip_embed(slide_xml: &str) -> Result<Option<String>> {
    let mut reader = Reader::from_str(slide_xml);
    reader.trim_text(true);

    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"blip" => {
                for attr in e.attributes().flatten() {
                    if attr.key.local_name().as_ref() == b"embed" {
                        return Ok(Some(attr.unescape_value()?.into_owned()));
                    }
                }
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}

/// External programs used by [`OfficeRenderer`]
#[derive(Debug, Clone)]
pub struct OfficeTools {
    /// Office suite able to run `--headless --convert-to pdf`
    pub converter: String,
    /// Poppler's `pdftoppm`
    pub rasterizer: String,
    /// Upper bound on any single external call
    pub timeout_ms: u64,
}

impl Default for OfficeTools {
    fn default() -> Self {
        Self {
            converter: "soffice".to_string(),
            rasterizer: "pdftoppm".to_string(),
            timeout_ms: 120_000,
        }
    }
}

/// Renders slides through a headless office suite.
///
/// The session converts the whole document to PDF once, into a scratch
/// directory it owns, then rasterises one page per slide. Dropping the
/// session removes the scratch directory.
pub struct OfficeRenderer {
    tools: OfficeTools,
    pdf: PathBuf,
    scratch: TempDir,
}

impl OfficeRenderer {
    pub fn open(source: &Path, tools: &OfficeTools) -> Result<Self> {
        let scratch = tempfile::Builder::new().prefix("pptx-png-").tempdir()?;
        info!("Converting {:?} to PDF with {}", source, tools.converter);

        let mut command = conversion_command(tools, scratch.path(), source);
        run_with_timeout(&mut command, Duration::from_millis(tools.timeout_ms))?;

        let stem = source.file_stem().unwrap_or_default().to_string_lossy();
        let pdf = scratch.path().join(format!("{}.pdf", stem));
        if !pdf.is_file() {
            return Err(ExportError::RenderError {
                message: format!("{} did not produce {:?}", tools.converter, pdf),
                source: None,
            });
        }

        Ok(Self {
            tools: tools.clone(),
            pdf,
            scratch,
        })
    }

    /// Directory holding the converted PDF; removed when the session drops
    pub fn scratch_dir(&self) -> &Path {
        self.scratch.path()
    }
}

/// Build the converter call that writes `source` as PDF into `outdir`,
/// hidden slides included
pub fn conversion_command(tools: &OfficeTools, outdir: &Path, source: &Path) -> Command {
    let mut command = Command::new(&tools.converter);
    command
        .arg("--headless")
        .arg("--convert-to")
        .arg(PDF_CONVERSION_FILTER)
        .arg("--outdir")
        .arg(outdir)
        .arg(source);
    command
}

impl SlideRenderer for OfficeRenderer {
    fn render(&mut self, ordinal: u32, output: &Path, dims: Dimensions) -> Result<()> {
        // pdftoppm appends ".png" to the prefix itself
        let prefix = match output.extension() {
            Some(ext) if ext.eq_ignore_ascii_case("png") => output.with_extension(""),
            _ => {
                return Err(ExportError::ValidationError(format!(
                    "Output must be a .png path: {:?}",
                    output
                )))
            }
        };
        let page = ordinal.to_string();
        let width = dims.width.to_string();
        let height = dims.height.to_string();

        let mut command = Command::new(&self.tools.rasterizer);
        command
            .arg("-png")
            .arg("-singlefile")
            .args(["-f", page.as_str(), "-l", page.as_str()])
            .args(["-scale-to-x", width.as_str(), "-scale-to-y", height.as_str()])
            .arg(&self.pdf)
            .arg(&prefix);
        run_with_timeout(&mut command, Duration::from_millis(self.tools.timeout_ms))?;

        if !output.is_file() {
            return Err(ExportError::RenderError {
                message: format!("{} did not produce slide {}", self.tools.rasterizer, ordinal),
                source: None,
            });
        }
        Ok(())
    }
}

/// Run an external program to completion, killing it once `timeout` passes
pub fn run_with_timeout(command: &mut Command, timeout: Duration) -> Result<()> {
    let program = command.get_program().to_string_lossy().into_owned();
    debug!("Running {:?}", command);

    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| ExportError::RenderError {
            message: format!("Failed to start {}", program),
            source: Some(Box::new(e)),
        })?;

    let started = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            if status.success() {
                return Ok(());
            }
            return Err(ExportError::RenderError {
                message: format!("{} exited with {}", program, status),
                source: None,
            });
        }

        if started.elapsed() >= timeout {
            warn!("{} did not finish within {:?}; killing it", program, timeout);
            if let Err(e) = child.kill() {
                warn!("Failed to kill {}: {}", program, e);
            }
            let _ = child.wait();
            return Err(ExportError::TimeoutError(format!(
                "{} did not finish within {} ms",
                program,
                timeout.as_millis()
            )));
        }

        std::thread::sleep(Duration::from_millis(50));
    }
}
