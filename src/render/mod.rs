//! Presentation rendering.
//!
//! Converts a deck into numbered PNG files, one per slide. The painting
//! itself sits behind [`SlideRasterizer`] so a different backend can be
//! plugged in without touching naming or storage.
//!
//! # Example
//!
//! ```no_run
//! use slidecast::render::{render_presentation, OoxmlRasterizer, RasterOptions};
//!
//! let deck = std::fs::read("talk.pptx")?;
//! let rasterizer = OoxmlRasterizer::new(RasterOptions::new().with_scale(2.0));
//! let names = render_presentation(&rasterizer, &deck, 0, "out".as_ref())?;
//! assert_eq!(names.first().map(String::as_str), Some("slide_000.png"));
//! # Ok::<(), slidecast::Error>(())
//! ```

mod options;
mod raster;

pub use options::{RasterOptions, MAX_RASTER_DIMENSION};
pub use raster::{encode_png, OoxmlRasterizer, SlideRasterizer};

use crate::error::Result;
use log::debug;
use std::fs;
use std::path::Path;

/// File name of the slide numbered `n`: `slide_000.png`, `slide_001.png`, ...
pub fn slide_file_name(n: usize) -> String {
    format!("slide_{:03}.png", n)
}

/// Rasterize `data` and write one PNG per slide into `dir`.
///
/// Slides are numbered from `offset` in deck order. Existing files with the
/// same names are overwritten. Returns the written names in order.
pub fn render_presentation(
    rasterizer: &dyn SlideRasterizer,
    data: &[u8],
    offset: usize,
    dir: &Path,
) -> Result<Vec<String>> {
    let mut names = Vec::new();
    let count = rasterizer.rasterize(data, &mut |slide| {
        let name = slide_file_name(offset + names.len());
        fs::write(dir.join(&name), encode_png(&slide)?)?;
        debug!("wrote {} ({}x{})", name, slide.width(), slide.height());
        names.push(name);
        Ok(())
    })?;
    debug_assert_eq!(count, names.len());
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use image::{Rgba, RgbaImage};

    struct Solid(usize);

    impl SlideRasterizer for Solid {
        fn rasterize(
            &self,
            _data: &[u8],
            sink: &mut dyn FnMut(RgbaImage) -> Result<()>,
        ) -> Result<usize> {
            for _ in 0..self.0 {
                sink(RgbaImage::from_pixel(4, 3, Rgba([255, 255, 255, 255])))?;
            }
            Ok(self.0)
        }
    }

    struct Broken;

    impl SlideRasterizer for Broken {
        fn rasterize(
            &self,
            _data: &[u8],
            _sink: &mut dyn FnMut(RgbaImage) -> Result<()>,
        ) -> Result<usize> {
            Err(Error::InvalidData("corrupt deck".to_string()))
        }
    }

    #[test]
    fn test_slide_file_name() {
        assert_eq!(slide_file_name(0), "slide_000.png");
        assert_eq!(slide_file_name(42), "slide_042.png");
        assert_eq!(slide_file_name(1234), "slide_1234.png");
    }

    #[test]
    fn test_render_numbers_from_offset() {
        let dir = tempfile::tempdir().unwrap();
        let names = render_presentation(&Solid(2), b"", 3, dir.path()).unwrap();

        assert_eq!(names, vec!["slide_003.png", "slide_004.png"]);
        let png = fs::read(dir.path().join("slide_004.png")).unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (4, 3));
    }

    #[test]
    fn test_render_error_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let result = render_presentation(&Broken, b"", 0, dir.path());
        assert!(matches!(result, Err(Error::InvalidData(_))));
    }
}
