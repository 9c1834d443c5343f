//! Shared fixtures: in-memory decks and images.

#![allow(dead_code)]

use image::{ImageFormat, Rgba, RgbaImage};
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const NS: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;
const REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const REL_SLIDE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
const REL_IMAGE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

/// One point in EMU.
pub const PT: i64 = 12_700;

/// A slide of a fixture deck.
#[derive(Debug, Clone, Default)]
pub struct FixtureSlide {
    /// Background colour as `RRGGBB`
    pub background: Option<String>,
    /// Solid rectangles: (x, y, w, h) in points, `RRGGBB`
    pub boxes: Vec<((i64, i64, i64, i64), String)>,
    /// A picture covering (x, y, w, h) in points
    pub picture: Option<((i64, i64, i64, i64), Vec<u8>)>,
}

impl FixtureSlide {
    pub fn colored(hex: &str) -> Self {
        Self {
            background: Some(hex.to_string()),
            ..Default::default()
        }
    }

    pub fn with_box(mut self, rect: (i64, i64, i64, i64), hex: &str) -> Self {
        self.boxes.push((rect, hex.to_string()));
        self
    }

    pub fn with_picture(mut self, rect: (i64, i64, i64, i64), png: Vec<u8>) -> Self {
        self.picture = Some((rect, png));
        self
    }
}

/// Build a `.pptx` with a page of `width` x `height` points.
pub fn build_pptx(width: i64, height: i64, slides: &[FixtureSlide]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();

    let put = |zip: &mut ZipWriter<Cursor<Vec<u8>>>, name: &str, data: &[u8]| {
        zip.start_file(name, options).unwrap();
        zip.write_all(data).unwrap();
    };

    put(
        &mut zip,
        "[Content_Types].xml",
        br#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/><Default Extension="png" ContentType="image/png"/></Types>"#,
    );

    let ids: String = (0..slides.len())
        .map(|i| format!(r#"<p:sldId id="{}" r:id="rId{}"/>"#, 256 + i, i + 1))
        .collect();
    let presentation = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><p:presentation {NS}><p:sldIdLst>{ids}</p:sldIdLst><p:sldSz cx="{}" cy="{}"/></p:presentation>"#,
        width * PT,
        height * PT
    );
    put(&mut zip, "ppt/presentation.xml", presentation.as_bytes());

    let rels: String = (0..slides.len())
        .map(|i| {
            format!(
                r#"<Relationship Id="rId{}" Type="{REL_SLIDE}" Target="slides/slide{}.xml"/>"#,
                i + 1,
                i + 1
            )
        })
        .collect();
    put(
        &mut zip,
        "ppt/_rels/presentation.xml.rels",
        format!(r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="{REL_NS}">{rels}</Relationships>"#)
            .as_bytes(),
    );

    for (i, slide) in slides.iter().enumerate() {
        let n = i + 1;
        let background = slide
            .background
            .as_ref()
            .map(|hex| {
                format!(
                    r#"<p:bg><p:bgPr><a:solidFill><a:srgbClr val="{hex}"/></a:solidFill></p:bgPr></p:bg>"#
                )
            })
            .unwrap_or_default();

        let mut shapes = String::new();
        for (id, ((x, y, w, h), hex)) in slide.boxes.iter().enumerate() {
            shapes.push_str(&format!(
                r#"<p:sp><p:nvSpPr><p:cNvPr id="{}" name="Box"/></p:nvSpPr><p:spPr><a:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></a:xfrm><a:solidFill><a:srgbClr val="{hex}"/></a:solidFill></p:spPr></p:sp>"#,
                id + 2,
                x * PT,
                y * PT,
                w * PT,
                h * PT
            ));
        }
        if let Some(((x, y, w, h), png)) = &slide.picture {
            shapes.push_str(&format!(
                r#"<p:pic><p:nvPicPr><p:cNvPr id="99" name="Picture"/></p:nvPicPr><p:blipFill><a:blip r:embed="rId1"/></p:blipFill><p:spPr><a:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></a:xfrm></p:spPr></p:pic>"#,
                x * PT,
                y * PT,
                w * PT,
                h * PT
            ));
            put(&mut zip, &format!("ppt/media/image{n}.png"), png);
            put(
                &mut zip,
                &format!("ppt/slides/_rels/slide{n}.xml.rels"),
                format!(r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="{REL_NS}"><Relationship Id="rId1" Type="{REL_IMAGE}" Target="../media/image{n}.png"/></Relationships>"#)
                    .as_bytes(),
            );
        }

        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><p:sld {NS}><p:cSld>{background}<p:spTree>{shapes}</p:spTree></p:cSld></p:sld>"#
        );
        put(&mut zip, &format!("ppt/slides/slide{n}.xml"), xml.as_bytes());
    }

    zip.finish().unwrap().into_inner()
}

/// A deck of `count` slides with distinct background colours.
pub fn simple_deck(count: usize) -> Vec<u8> {
    let slides: Vec<FixtureSlide> = (0..count)
        .map(|i| FixtureSlide::colored(&format!("{:02X}4080", (i * 40) % 256)))
        .collect();
    build_pptx(40, 30, &slides)
}

/// Encode a solid `w` x `h` PNG.
pub fn png(w: u32, h: u32, rgba: [u8; 4]) -> Vec<u8> {
    let image = RgbaImage::from_pixel(w, h, Rgba(rgba));
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

/// Magic bytes of a legacy OLE compound file.
pub fn legacy_ppt() -> Vec<u8> {
    let mut data = vec![0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
    data.resize(512, 0);
    data
}
