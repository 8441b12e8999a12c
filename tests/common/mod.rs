// Shared fixtures: builds small .pptx packages whose slides are single pictures.

#![allow(dead_code)]

use image::{ImageBuffer, Rgb};
use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;
use zip::{write::FileOptions, ZipWriter};

/// 16:9 canvas in EMUs
pub const WIDE_CANVAS: (i64, i64) = (9144000, 5143500);

/// Colors of the pictures placed on each slide, one slide per color
pub const SLIDE_COLORS: [[u8; 3]; 3] = [[255, 0, 0], [0, 255, 0], [0, 0, 255]];

fn png_bytes(color: [u8; 3], width: u32, height: u32) -> Vec<u8> {
    let img = ImageBuffer::from_fn(width, height, |_, _| Rgb(color));
    let mut bytes = Cursor::new(Vec::new());
    img.write_to(&mut bytes, image::ImageOutputFormat::Png)
        .expect("Failed to encode fixture image");
    bytes.into_inner()
}

/// Write a presentation with one picture slide per color
pub fn write_pptx(path: &Path, colors: &[[u8; 3]], canvas: (i64, i64)) {
    write_pptx_with_hidden(path, colors, canvas, &[]);
}

/// Like [`write_pptx`], marking the slides at the given 1-based ordinals as
/// hidden (`show="0"`)
pub fn write_pptx_with_hidden(
    path: &Path,
    colors: &[[u8; 3]],
    canvas: (i64, i64),
    hidden: &[u32],
) {
    let file = fs::File::create(path).expect("Failed to create pptx");
    let mut zip = ZipWriter::new(file);
    let (cx, cy) = canvas;

    zip.start_file("[Content_Types].xml", FileOptions::default()).unwrap();
    let overrides: Vec<String> = (1..=colors.len())
        .map(|i| format!(r#"<Override PartName="/ppt/slides/slide{}.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>"#, i))
        .collect();
    write!(
        zip,
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
    <Default Extension="xml" ContentType="application/xml"/>
    <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
    <Default Extension="png" ContentType="image/png"/>
    <Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/>
    {}
</Types>"#,
        overrides.join("\n    ")
    )
    .unwrap();

    zip.start_file("_rels/.rels", FileOptions::default()).unwrap();
    zip.write_all(br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="ppt/presentation.xml"/>
</Relationships>"#)
        .unwrap();

    zip.start_file("ppt/_rels/presentation.xml.rels", FileOptions::default())
        .unwrap();
    let rels: Vec<String> = (1..=colors.len())
        .map(|i| format!(r#"    <Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide{}.xml"/>"#, i, i))
        .collect();
    write!(
        zip,
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
{}
</Relationships>"#,
        rels.join("\n")
    )
    .unwrap();

    zip.start_file("ppt/presentation.xml", FileOptions::default()).unwrap();
    let ids: Vec<String> = (1..=colors.len())
        .map(|i| format!(r#"        <p:sldId id="{}" r:id="rId{}"/>"#, 255 + i, i))
        .collect();
    write!(
        zip,
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:presentation xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">
    <p:sldIdLst>
{}
    </p:sldIdLst>
    <p:sldSz cx="{}" cy="{}"/>
    <p:notesSz cx="6858000" cy="9144000"/>
</p:presentation>"#,
        ids.join("\n"),
        cx,
        cy
    )
    .unwrap();

    for (i, color) in colors.iter().enumerate() {
        let n = i + 1;
        let show = if hidden.contains(&(n as u32)) {
            r#" show="0""#
        } else {
            ""
        };

        zip.start_file(format!("ppt/media/image{}.png", n), FileOptions::default())
            .unwrap();
        zip.write_all(&png_bytes(*color, 64, 36)).unwrap();

        zip.start_file(
            format!("ppt/slides/_rels/slide{}.xml.rels", n),
            FileOptions::default(),
        )
        .unwrap();
        write!(
            zip,
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="../media/image{}.png"/>
</Relationships>"#,
            n
        )
        .unwrap();

        zip.start_file(format!("ppt/slides/slide{}.xml", n), FileOptions::default())
            .unwrap();
        write!(
            zip,
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"{}>
    <p:cSld>
        <p:spTree>
            <p:pic>
                <p:nvPicPr>
                    <p:cNvPr id="2" name="Image"/>
                    <p:cNvPicPr/>
                    <p:nvPr/>
                </p:nvPicPr>
                <p:blipFill>
                    <a:blip r:embed="rId1"/>
                    <a:stretch><a:fillRect/></a:stretch>
                </p:blipFill>
                <p:spPr>
                    <a:xfrm><a:off x="0" y="0"/><a:ext cx="{}" cy="{}"/></a:xfrm>
                </p:spPr>
            </p:pic>
        </p:spTree>
    </p:cSld>
</p:sld>"#,
            show, cx, cy
        )
        .unwrap();
    }

    zip.finish().expect("Failed to finish pptx");
}

/// Push a file's modification time forward so it is newer than any export
pub fn touch_later(path: &Path, seconds: u64) {
    let file = fs::File::options()
        .write(true)
        .open(path)
        .expect("Failed to open file");
    let modified = fs::metadata(path).unwrap().modified().unwrap();
    file.set_modified(modified + std::time::Duration::from_secs(seconds))
        .expect("Failed to set modification time");
}
