//! PPTX deck parsing.
//!
//! This module reads just enough of a PowerPoint package to paint its
//! slides: the page size, the slide order, and each slide's background,
//! shape fills and embedded pictures.

mod model;
mod parser;

pub use model::{Color, Deck, EmuRect, Fill, Shape, ShapeKind, Slide, SlideSize, EMU_PER_POINT};
pub use parser::DeckParser;
