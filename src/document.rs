// ABOUTME: Presentation document reading for the pptx-png exporter
// ABOUTME: Reads slide order and canvas size from a .pptx package

use crate::errors::{ExportError, Result};
use crate::geometry::AspectRatio;
use crate::utils;
use log::{debug, info, warn};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};
use zip::ZipArchive;

const PRESENTATION_PART: &str = "ppt/presentation.xml";
const PRESENTATION_RELS_PART: &str = "ppt/_rels/presentation.xml.rels";

/// What the exporter needs to know about a source document.
///
/// Lookups never fail: an ordinal outside `1..=slide_count()` or a slide
/// without a usable canvas yields `None`.
pub trait DocumentReader {
    fn slide_count(&self) -> u32;

    /// Height divided by width of the slide's canvas
    fn aspect_ratio(&self, ordinal: u32) -> Option<f64>;
}

/// One slide of a document, in presentation order
#[derive(Debug, Clone, PartialEq)]
pub struct Slide {
    /// 1-based position within the document
    pub ordinal: u32,
    /// Package part holding the slide XML, e.g. `ppt/slides/slide1.xml`
    pub part_name: String,
}

/// A PowerPoint document opened from disk
#[derive(Debug, Clone)]
pub struct PptxDocument {
    path: PathBuf,
    slides: Vec<Slide>,
    canvas: Option<(i64, i64)>,
}

impl PptxDocument {
    /// Open a `.pptx` file and read its slide list and canvas size.
    ///
    /// Fails if the file is missing, has the wrong extension, or is not a
    /// readable presentation package.
    pub fn open(path: &Path) -> Result<Self> {
        utils::validate_presentation(path)?;
        info!("Opening presentation: {:?}", path);

        let mut archive = ZipArchive::new(File::open(path)?)?;
        let presentation_xml = read_part_to_string(&mut archive, PRESENTATION_PART)?;
        let rels = match read_part_to_string(&mut archive, PRESENTATION_RELS_PART) {
            Ok(xml) => parse_relationships(&xml)?,
            Err(e) => {
                warn!("No presentation relationships found: {}", e);
                HashMap::new()
            }
        };

        let (slide_ids, canvas) = parse_presentation(&presentation_xml)?;
        let mut slides = Vec::with_capacity(slide_ids.len());
        for rid in slide_ids {
            match rels.get(&rid) {
                Some(rel) => {
                    let ordinal = slides.len() as u32 + 1;
                    slides.push(Slide {
                        ordinal,
                        part_name: resolve_part_name("ppt", &rel.target),
                    });
                }
                None => warn!("Slide relationship {} has no target; skipping", rid),
            }
        }

        match canvas {
            Some((cx, cy)) => debug!("Slide canvas is {}x{} EMU", cx, cy),
            None => warn!("Presentation does not declare a slide size"),
        }
        info!("Found {} slides", slides.len());

        Ok(Self {
            path: path.to_path_buf(),
            slides,
            canvas,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    pub fn slide(&self, ordinal: u32) -> Option<&Slide> {
        let index = ordinal.checked_sub(1)? as usize;
        self.slides.get(index)
    }

    /// Canvas size in EMUs as declared by `p:sldSz`
    pub fn canvas(&self) -> Option<(i64, i64)> {
        self.canvas
    }
}

impl DocumentReader for PptxDocument {
    fn slide_count(&self) -> u32 {
        self.slides.len() as u32
    }

    fn aspect_ratio(&self, ordinal: u32) -> Option<f64> {
        self.slide(ordinal)?;
        let (cx, cy) = self.canvas?;
        AspectRatio::from_canvas(cx, cy).ok().map(AspectRatio::value)
    }
}

/// A package relationship as read from a `.rels` part
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Relationship {
    pub rel_type: String,
    pub target: String,
    pub external: bool,
}

pub(crate) fn read_part_to_string<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<String> {
    let mut part = archive.by_name(name)?;
    let mut content = String::new();
    part.read_to_string(&mut content)?;
    Ok(content)
}

pub(crate) fn read_part_to_bytes<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<Vec<u8>> {
    let mut part = archive.by_name(name)?;
    let mut content = Vec::with_capacity(part.size() as usize);
    part.read_to_end(&mut content)?;
    Ok(content)
}

/// Relationships part that belongs to `part_name`
pub(crate) fn rels_part_name(part_name: &str) -> String {
    match part_name.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part_name),
    }
}

/// Directory portion of a part name (`ppt/slides` for `ppt/slides/slide1.xml`)
pub(crate) fn part_dir(part_name: &str) -> &str {
    part_name.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

/// Resolve a relationship target against the directory of its source part.
///
/// Absolute targets (`/ppt/media/image1.png`) are taken from the package
/// root; `..` segments climb out of `base_dir`.
pub(crate) fn resolve_part_name(base_dir: &str, target: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    let joined = if let Some(absolute) = target.strip_prefix('/') {
        absolute.to_string()
    } else if base_dir.is_empty() {
        target.to_string()
    } else {
        format!("{}/{}", base_dir, target)
    };

    for segment in joined.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

pub(crate) fn parse_relationships(xml: &str) -> Result<HashMap<String, Relationship>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut rels = HashMap::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                let mut id = None;
                let mut rel_type = String::new();
                let mut target = None;
                let mut external = false;

                for attr in e.attributes().flatten() {
                    let value = attr.unescape_value()?.into_owned();
                    match attr.key.local_name().as_ref() {
                        b"Id" => id = Some(value),
                        b"Type" => rel_type = value,
                        b"Target" => target = Some(value),
                        b"TargetMode" => external = value.eq_ignore_ascii_case("External"),
                        _ => {}
                    }
                }

                if let (Some(id), Some(target)) = (id, target) {
                    rels.insert(
                        id,
                        Relationship {
                            rel_type,
                            target,
                            external,
                        },
                    );
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(rels)
}

/// Slide relationship ids in presentation order, plus the canvas size
fn parse_presentation(xml: &str) -> Result<(Vec<String>, Option<(i64, i64)>)> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut slide_ids = Vec::new();
    let mut canvas = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                b"sldId" => {
                    for attr in e.attributes().flatten() {
                        // r:id, not the numeric id attribute
                        if attr.key.as_ref() != b"id" && attr.key.local_name().as_ref() == b"id" {
                            slide_ids.push(attr.unescape_value()?.into_owned());
                        }
                    }
                }
                b"sldSz" => {
                    let mut cx = None;
                    let mut cy = None;
                    for attr in e.attributes().flatten() {
                        let value = attr.unescape_value()?;
                        match attr.key.as_ref() {
                            b"cx" => cx = value.parse::<i64>().ok(),
                            b"cy" => cy = value.parse::<i64>().ok(),
                            _ => {}
                        }
                    }
                    match (cx, cy) {
                        (Some(cx), Some(cy)) => canvas = Some((cx, cy)),
                        _ => {
                            return Err(ExportError::DocumentError(
                                "Invalid slide size in presentation.xml".to_string(),
                            ))
                        }
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok((slide_ids, canvas))
}
