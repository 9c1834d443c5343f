//! Rasterization options.

use crate::deck::Color;

/// Largest width or height, in pixels, a slide raster may have.
pub const MAX_RASTER_DIMENSION: u32 = 8192;

/// Options for rasterizing slides.
#[derive(Debug, Clone)]
pub struct RasterOptions {
    /// Pixels per point; 1.0 renders one pixel per typographic point
    pub scale: f32,

    /// Colour the canvas is cleared to before a slide paints itself
    pub background: Color,

    /// Paint embedded pictures (disable for fast layout previews)
    pub draw_pictures: bool,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            scale: 1.0,
            background: Color::WHITE,
            draw_pictures: true,
        }
    }
}

impl RasterOptions {
    /// Create new raster options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the pixels-per-point scale, clamped to 0.1..=8.0.
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = if scale.is_finite() {
            scale.clamp(0.1, 8.0)
        } else {
            1.0
        };
        self
    }

    /// Set the canvas clear colour.
    pub fn with_background(mut self, background: Color) -> Self {
        self.background = background;
        self
    }

    /// Enable or disable picture painting.
    pub fn with_pictures(mut self, draw: bool) -> Self {
        self.draw_pictures = draw;
        self
    }
}
