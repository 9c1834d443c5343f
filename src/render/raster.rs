//! Slide rasterizers.

use super::options::{RasterOptions, MAX_RASTER_DIMENSION};
use crate::deck::{Color, DeckParser, EmuRect, Fill, Slide, SlideSize, EMU_PER_POINT};
use crate::detect::{detect_presentation_format, PresentationFormat};
use crate::error::{Error, Result};
use image::imageops::{self, FilterType};
use image::{ImageFormat, Rgba, RgbaImage};
use log::{debug, warn};
use std::io::Cursor;

/// Turns a presentation file into one raster per slide.
///
/// Implementations hand slides to `sink` in deck order and return how
/// many were produced. An error from `sink` aborts rasterization.
pub trait SlideRasterizer: Send + Sync {
    fn rasterize(
        &self,
        data: &[u8],
        sink: &mut dyn FnMut(RgbaImage) -> Result<()>,
    ) -> Result<usize>;
}

/// Built-in rasterizer for `.pptx` decks.
///
/// Paints slide backgrounds (inherited from the layout or master when the
/// slide has none), solid shape fills and embedded pictures. Text and the
/// shapes of layouts and masters are not painted.
#[derive(Debug, Clone, Default)]
pub struct OoxmlRasterizer {
    options: RasterOptions,
}

impl OoxmlRasterizer {
    pub fn new(options: RasterOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &RasterOptions {
        &self.options
    }

    /// Paint a single slide onto a fresh canvas of the deck's page size.
    pub fn paint_slide(&self, size: SlideSize, slide: &Slide) -> Result<RgbaImage> {
        let (width, height) = self.canvas_size(size)?;
        let mut canvas = RgbaImage::from_pixel(width, height, to_pixel(self.options.background));
        let page = EmuRect {
            x: 0,
            y: 0,
            cx: size.cx,
            cy: size.cy,
        };

        if let Some(fill) = &slide.background {
            self.paint_fill(&mut canvas, page, fill, &slide.part);
        }
        for shape in &slide.shapes {
            if let Some(fill) = &shape.fill {
                self.paint_fill(&mut canvas, shape.bounds, fill, &slide.part);
            }
        }

        Ok(canvas)
    }

    fn canvas_size(&self, size: SlideSize) -> Result<(u32, u32)> {
        let (width, height) = (self.to_px(size.cx), self.to_px(size.cy));
        if width <= 0 || height <= 0 {
            return Err(Error::InvalidData(format!(
                "slide size {}x{} EMU is empty",
                size.cx, size.cy
            )));
        }
        if width > MAX_RASTER_DIMENSION as i64 || height > MAX_RASTER_DIMENSION as i64 {
            return Err(Error::InvalidData(format!(
                "slide raster {}x{} exceeds {} pixels",
                width, height, MAX_RASTER_DIMENSION
            )));
        }
        Ok((width as u32, height as u32))
    }

    fn to_px(&self, emu: i64) -> i64 {
        (emu as f64 * self.options.scale as f64 / EMU_PER_POINT as f64).round() as i64
    }

    fn paint_fill(&self, canvas: &mut RgbaImage, bounds: EmuRect, fill: &Fill, part: &str) {
        let (x, y) = (self.to_px(bounds.x), self.to_px(bounds.y));
        let (w, h) = (self.to_px(bounds.cx), self.to_px(bounds.cy));
        if w <= 0 || h <= 0 {
            return;
        }

        match fill {
            Fill::Solid(color) => fill_rect(canvas, x, y, w, h, *color),
            Fill::Picture(_) if !self.options.draw_pictures => {}
            Fill::Picture(bytes) => {
                let limit = MAX_RASTER_DIMENSION as i64;
                let (w, h) = (w.min(limit) as u32, h.min(limit) as u32);
                match image::load_from_memory(bytes) {
                    Ok(picture) => {
                        let scaled = picture.resize_exact(w, h, FilterType::Triangle).to_rgba8();
                        imageops::overlay(canvas, &scaled, x, y);
                    }
                    Err(e) => warn!("{}: cannot decode picture: {}", part, e),
                }
            }
        }
    }
}

impl SlideRasterizer for OoxmlRasterizer {
    fn rasterize(
        &self,
        data: &[u8],
        sink: &mut dyn FnMut(RgbaImage) -> Result<()>,
    ) -> Result<usize> {
        match detect_presentation_format(data)? {
            PresentationFormat::Pptx => {}
            PresentationFormat::Ppt => {
                return Err(Error::UnsupportedFormat(
                    "legacy binary .ppt decks cannot be rasterized; save as .pptx".to_string(),
                ))
            }
        }

        let deck = DeckParser::from_bytes(data.to_vec())?.parse()?;
        for slide in &deck.slides {
            debug!("painting slide {} ({})", slide.index, slide.part);
            sink(self.paint_slide(deck.size, slide)?)?;
        }
        Ok(deck.slide_count())
    }
}

fn to_pixel(color: Color) -> Rgba<u8> {
    Rgba([color.r, color.g, color.b, color.a])
}

/// Source-over fill of a rectangle, clipped to the canvas.
fn fill_rect(canvas: &mut RgbaImage, x: i64, y: i64, w: i64, h: i64, color: Color) {
    let x0 = x.clamp(0, canvas.width() as i64) as u32;
    let y0 = y.clamp(0, canvas.height() as i64) as u32;
    let x1 = (x + w).clamp(0, canvas.width() as i64) as u32;
    let y1 = (y + h).clamp(0, canvas.height() as i64) as u32;

    for py in y0..y1 {
        for px in x0..x1 {
            let dst = canvas.get_pixel_mut(px, py);
            *dst = blend(*dst, color);
        }
    }
}

fn blend(dst: Rgba<u8>, src: Color) -> Rgba<u8> {
    match src.a {
        255 => to_pixel(src),
        0 => dst,
        a => {
            let a = a as u32;
            let mix = |s: u8, d: u8| ((s as u32 * a + d as u32 * (255 - a) + 127) / 255) as u8;
            let out_a = a + dst[3] as u32 * (255 - a) / 255;
            Rgba([
                mix(src.r, dst[0]),
                mix(src.g, dst[1]),
                mix(src.b, dst[2]),
                out_a.min(255) as u8,
            ])
        }
    }
}

/// Encode a raster as PNG.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::{Shape, ShapeKind};

    fn slide(background: Option<Fill>, shapes: Vec<Shape>) -> Slide {
        Slide {
            index: 0,
            part: "ppt/slides/slide1.xml".to_string(),
            background,
            shapes,
        }
    }

    fn points(x: i64, y: i64, cx: i64, cy: i64) -> EmuRect {
        EmuRect {
            x: x * EMU_PER_POINT,
            y: y * EMU_PER_POINT,
            cx: cx * EMU_PER_POINT,
            cy: cy * EMU_PER_POINT,
        }
    }

    fn small_page() -> SlideSize {
        SlideSize {
            cx: 40 * EMU_PER_POINT,
            cy: 30 * EMU_PER_POINT,
        }
    }

    #[test]
    fn test_blank_slide_is_white() {
        let rasterizer = OoxmlRasterizer::default();
        let canvas = rasterizer
            .paint_slide(small_page(), &slide(None, Vec::new()))
            .unwrap();
        assert_eq!(canvas.dimensions(), (40, 30));
        assert!(canvas.pixels().all(|p| *p == Rgba([255, 255, 255, 255])));
    }

    #[test]
    fn test_background_then_shape() {
        let red = Shape {
            kind: ShapeKind::Shape,
            bounds: points(10, 5, 10, 10),
            fill: Some(Fill::Solid(Color::rgb(255, 0, 0))),
        };
        let rasterizer = OoxmlRasterizer::default();
        let canvas = rasterizer
            .paint_slide(
                small_page(),
                &slide(Some(Fill::Solid(Color::rgb(0, 0, 255))), vec![red]),
            )
            .unwrap();

        assert_eq!(*canvas.get_pixel(0, 0), Rgba([0, 0, 255, 255]));
        assert_eq!(*canvas.get_pixel(12, 7), Rgba([255, 0, 0, 255]));
        assert_eq!(*canvas.get_pixel(20, 15), Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn test_shape_is_clipped_to_canvas() {
        let overflow = Shape {
            kind: ShapeKind::Shape,
            bounds: points(-10, 20, 100, 100),
            fill: Some(Fill::Solid(Color::rgb(0, 0, 0))),
        };
        let canvas = OoxmlRasterizer::default()
            .paint_slide(small_page(), &slide(None, vec![overflow]))
            .unwrap();
        assert_eq!(*canvas.get_pixel(0, 29), Rgba([0, 0, 0, 255]));
        assert_eq!(*canvas.get_pixel(39, 19), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_scale_doubles_canvas() {
        let rasterizer = OoxmlRasterizer::new(RasterOptions::new().with_scale(2.0));
        assert_eq!(rasterizer.options().scale, 2.0);
        let canvas = rasterizer
            .paint_slide(small_page(), &slide(None, Vec::new()))
            .unwrap();
        assert_eq!(canvas.dimensions(), (80, 60));
    }

    #[test]
    fn test_picture_fill_is_drawn() {
        let mut picture = RgbaImage::from_pixel(2, 2, Rgba([0, 255, 0, 255]));
        picture.put_pixel(0, 0, Rgba([0, 255, 0, 255]));
        let bytes = encode_png(&picture).unwrap();

        let pic = Shape {
            kind: ShapeKind::Picture,
            bounds: points(0, 0, 20, 10),
            fill: Some(Fill::Picture(bytes)),
        };
        let canvas = OoxmlRasterizer::default()
            .paint_slide(small_page(), &slide(None, vec![pic]))
            .unwrap();
        assert_eq!(*canvas.get_pixel(5, 5), Rgba([0, 255, 0, 255]));
        assert_eq!(*canvas.get_pixel(25, 5), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_undecodable_picture_is_skipped() {
        let pic = Shape {
            kind: ShapeKind::Picture,
            bounds: points(0, 0, 20, 10),
            fill: Some(Fill::Picture(b"not an image".to_vec())),
        };
        let canvas = OoxmlRasterizer::default()
            .paint_slide(small_page(), &slide(None, vec![pic]))
            .unwrap();
        assert_eq!(*canvas.get_pixel(5, 5), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_half_alpha_blends() {
        let out = blend(
            Rgba([255, 255, 255, 255]),
            Color::rgb(0, 0, 0).with_alpha(50_000),
        );
        assert_eq!(out, Rgba([127, 127, 127, 255]));
    }

    #[test]
    fn test_oversized_page_is_rejected() {
        let huge = SlideSize {
            cx: 100_000 * EMU_PER_POINT,
            cy: 10 * EMU_PER_POINT,
        };
        let result = OoxmlRasterizer::default().paint_slide(huge, &slide(None, Vec::new()));
        assert!(matches!(result, Err(Error::InvalidData(_))));
    }

    #[test]
    fn test_legacy_ppt_is_unsupported() {
        let ole = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1, 0, 0];
        let result = OoxmlRasterizer::default().rasterize(&ole, &mut |_| Ok(()));
        assert!(matches!(result, Err(Error::UnsupportedFormat(_))));
    }

    #[test]
    fn test_garbage_is_unknown_format() {
        let result = OoxmlRasterizer::default().rasterize(b"hello", &mut |_| Ok(()));
        assert!(matches!(result, Err(Error::UnknownFormat)));
    }

    #[test]
    fn test_encode_png_signature() {
        let png = encode_png(&RgbaImage::new(1, 1)).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }
}
