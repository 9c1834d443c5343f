//! Paintable slide model.

/// EMUs per typographic point.
pub const EMU_PER_POINT: i64 = 12_700;

/// Page size of a deck in EMU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlideSize {
    pub cx: i64,
    pub cy: i64,
}

impl Default for SlideSize {
    /// 10in x 7.5in, the 4:3 default PowerPoint writes when `p:sldSz` is absent.
    fn default() -> Self {
        Self {
            cx: 9_144_000,
            cy: 6_858_000,
        }
    }
}

impl SlideSize {
    /// Page size in whole points.
    pub fn to_points(&self) -> (u32, u32) {
        (emu_to_points(self.cx), emu_to_points(self.cy))
    }
}

fn emu_to_points(emu: i64) -> u32 {
    (emu.max(0) / EMU_PER_POINT).min(u32::MAX as i64) as u32
}

/// Axis-aligned rectangle in EMU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EmuRect {
    pub x: i64,
    pub y: i64,
    pub cx: i64,
    pub cy: i64,
}

/// Straight RGBA colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parse `RRGGBB` as written in `a:srgbClr/@val`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Apply a DrawingML alpha value (100000 = opaque).
    pub fn with_alpha(self, alpha: i64) -> Self {
        let a = (alpha.clamp(0, 100_000) * 255 + 50_000) / 100_000;
        Self { a: a as u8, ..self }
    }
}

/// How an area is filled.
#[derive(Debug, Clone, PartialEq)]
pub enum Fill {
    Solid(Color),
    /// Encoded picture bytes (PNG, JPEG, ...), stretched to the area.
    Picture(Vec<u8>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    /// `p:sp`
    Shape,
    /// `p:pic`
    Picture,
    /// `p:cxnSp`
    Connector,
}

/// A visible shape, bounds already mapped through enclosing groups.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub kind: ShapeKind,
    pub bounds: EmuRect,
    pub fill: Option<Fill>,
}

/// One slide in deck order.
#[derive(Debug, Clone, PartialEq)]
pub struct Slide {
    /// Zero-based position in the deck.
    pub index: usize,
    /// Package part the slide was read from.
    pub part: String,
    pub background: Option<Fill>,
    pub shapes: Vec<Shape>,
}

/// A parsed presentation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Deck {
    pub size: SlideSize,
    pub slides: Vec<Slide>,
}

impl Deck {
    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }
}
