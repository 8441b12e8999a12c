// ABOUTME: Source timestamp embedding for exported PNG files
// ABOUTME: Stores and reads the source modification time as a PNG text chunk

use crate::errors::{ExportError, Result};
use log::{debug, warn};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;

/// Keyword of the PNG text chunk holding the source modification time
pub const TIMESTAMP_KEY: &str = "SourcePPTXTimestamp";

/// Write `timestamp` into the PNG at `path` as a `tEXt` chunk.
///
/// Pixel data, palette, transparency and physical pixel size are carried
/// over unchanged, as are the colour hints (`gAMA`, `cHRM`, `sRGB`) and every
/// other text chunk (`tEXt`, `zTXt`, `iTXt`), including text that trailed the
/// image data. An embedded ICC profile (`iCCP`) is not carried over. The file
/// is rewritten through a temporary file in the same directory and renamed
/// over the original, so readers only ever see the old or the new file.
pub fn embed(path: &Path, timestamp: f64) -> Result<()> {
    let mut decoder = png::Decoder::new(BufReader::new(File::open(path)?));
    decoder.set_transformations(png::Transformations::IDENTITY);
    decoder.set_ignore_text_chunk(false);
    let mut reader = decoder.read_info()?;
    let mut pixels = vec![0; reader.output_buffer_size()];
    let frame = reader.next_frame(&mut pixels)?;
    pixels.truncate(frame.buffer_size());
    // Chunks after the image data are only collected once the stream ends
    reader.finish()?;

    let info = reader.info();
    if info.icc_profile.is_some() {
        debug!("Dropping ICC profile of {:?}", path);
    }
    let palette = info.palette.as_ref().map(|p| p.to_vec());
    let trns = info.trns.as_ref().map(|t| t.to_vec());
    let pixel_dims = info.pixel_dims;
    let gamma = info.source_gamma;
    let chromaticities = info.source_chromaticities;
    let srgb = info.srgb;
    let latin1_text: Vec<_> = info
        .uncompressed_latin1_text
        .iter()
        .filter(|chunk| chunk.keyword != TIMESTAMP_KEY)
        .cloned()
        .collect();
    let compressed_text: Vec<_> = info
        .compressed_latin1_text
        .iter()
        .filter(|chunk| chunk.keyword != TIMESTAMP_KEY)
        .cloned()
        .collect();
    let utf8_text: Vec<_> = info
        .utf8_text
        .iter()
        .filter(|chunk| chunk.keyword != TIMESTAMP_KEY)
        .cloned()
        .collect();

    let mut encoded = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut encoded, frame.width, frame.height);
        encoder.set_color(frame.color_type);
        encoder.set_depth(frame.bit_depth);
        encoder.set_pixel_dims(pixel_dims);
        if let Some(palette) = palette {
            encoder.set_palette(palette);
        }
        if let Some(trns) = trns {
            encoder.set_trns(trns);
        }
        if let Some(gamma) = gamma {
            encoder.set_source_gamma(gamma);
        }
        if let Some(chromaticities) = chromaticities {
            encoder.set_source_chromaticities(chromaticities);
        }
        if let Some(srgb) = srgb {
            encoder.set_srgb(srgb);
        }
        encoder.add_text_chunk(TIMESTAMP_KEY.to_string(), timestamp.to_string())?;

        let mut writer = encoder.write_header()?;
        for chunk in &latin1_text {
            writer.write_text_chunk(chunk)?;
        }
        for chunk in &compressed_text {
            writer.write_text_chunk(chunk)?;
        }
        for chunk in &utf8_text {
            writer.write_text_chunk(chunk)?;
        }
        writer.write_image_data(&pixels)?;
        writer.finish()?;
    }

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let mut staged = tempfile::Builder::new()
        .prefix(".metadata-")
        .suffix(".png")
        .tempfile_in(dir)?;
    staged.write_all(&encoded)?;
    staged.as_file().sync_all()?;

    staged.persist(path).map_err(|e| {
        ExportError::MetadataError(format!("Failed to replace {:?}: {}", path, e.error))
    })?;

    debug!("Embedded {}={} into {:?}", TIMESTAMP_KEY, timestamp, path);
    Ok(())
}

/// Read the embedded source timestamp of the PNG at `path`.
///
/// Never fails: a missing or unreadable file, a missing chunk, or a value
/// that is not a finite number all read as `0.0`, which is older than any
/// real source.
pub fn read_timestamp(path: &Path) -> f64 {
    match try_read_timestamp(path) {
        Ok(Some(timestamp)) => timestamp,
        Ok(None) => {
            debug!("No {} chunk in {:?}", TIMESTAMP_KEY, path);
            0.0
        }
        Err(e) => {
            warn!("Could not read embedded timestamp from {:?}: {}", path, e);
            0.0
        }
    }
}

fn try_read_timestamp(path: &Path) -> Result<Option<f64>> {
    let mut decoder = png::Decoder::new(BufReader::new(File::open(path)?));
    decoder.set_ignore_text_chunk(false);
    let mut reader = decoder.read_info()?;
    if let Some(raw) = find_timestamp_text(reader.info()) {
        return Ok(parse_timestamp(&raw));
    }

    // Text chunks may also trail the image data; those are only seen once
    // the whole stream has been consumed.
    let mut pixels = vec![0; reader.output_buffer_size()];
    reader.next_frame(&mut pixels)?;
    reader.finish()?;
    Ok(find_timestamp_text(reader.info()).and_then(|raw| parse_timestamp(&raw)))
}

fn find_timestamp_text(info: &png::Info) -> Option<String> {
    info.uncompressed_latin1_text
        .iter()
        .find(|chunk| chunk.keyword == TIMESTAMP_KEY)
        .map(|chunk| chunk.text.clone())
        .or_else(|| {
            info.utf8_text
                .iter()
                .find(|chunk| chunk.keyword == TIMESTAMP_KEY)
                .and_then(|chunk| chunk.get_text().ok())
        })
}

fn parse_timestamp(text: &str) -> Option<f64> {
    match text.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Some(value),
        _ => {
            debug!("Ignoring non-numeric {} value {:?}", TIMESTAMP_KEY, text);
            None
        }
    }
}
