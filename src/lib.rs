//! # slidecast
//!
//! Slide deck upload service: accepts slide images or PowerPoint decks,
//! rasterizes decks into one PNG per slide, keeps the active set in a
//! directory on disk and reports it to clients.
//!
//! ## Quick Start
//!
//! ```no_run
//! use slidecast::{convert_file, render::RasterOptions};
//!
//! // Rasterize a deck into out/slide_000.png, out/slide_001.png, ...
//! let slides = convert_file("talk.pptx", "out", 0, &RasterOptions::default())?;
//! println!("{} slides", slides.len());
//! # Ok::<(), slidecast::Error>(())
//! ```
//!
//! ## Running the server
//!
//! ```no_run
//! use slidecast::{server, ServerConfig};
//!
//! let config = ServerConfig::default()
//!     .with_bind("127.0.0.1:8080")
//!     .with_slides_dir("slides");
//! server::serve_blocking(config)?;
//! # Ok::<(), slidecast::Error>(())
//! ```
//!
//! ## Features
//!
//! - `server` (default): actix-web HTTP front end

pub mod auth;
pub mod config;
pub mod container;
pub mod deck;
pub mod detect;
pub mod error;
pub mod render;
pub mod state;
pub mod store;
pub mod upload;

#[cfg(feature = "server")]
pub mod server;

// Re-exports
pub use config::ServerConfig;
pub use container::{OoxmlContainer, Relationship, Relationships};
pub use deck::{Deck, DeckParser, Slide, SlideSize};
pub use detect::{classify, detect_presentation_format, PresentationFormat, SourceKind};
pub use error::{Error, Result};
pub use render::{OoxmlRasterizer, RasterOptions, SlideRasterizer};
pub use state::{current_state, SlideState};
pub use store::SlideStore;
pub use upload::{process_upload, UploadOutcome, UploadedFile};

use std::fs;
use std::path::Path;

/// Parse a `.pptx` file into a [`Deck`].
///
/// # Example
///
/// ```no_run
/// let deck = slidecast::parse_deck("talk.pptx")?;
/// println!("{} slides", deck.slide_count());
/// # Ok::<(), slidecast::Error>(())
/// ```
pub fn parse_deck(path: impl AsRef<Path>) -> Result<Deck> {
    parse_deck_bytes(fs::read(path)?)
}

/// Parse a `.pptx` package held in memory.
pub fn parse_deck_bytes(data: Vec<u8>) -> Result<Deck> {
    match detect_presentation_format(&data)? {
        PresentationFormat::Pptx => DeckParser::from_bytes(data)?.parse(),
        format => Err(Error::UnsupportedFormat(format!(
            "legacy .{} presentations",
            format.extension()
        ))),
    }
}

/// Rasterize the deck at `path` into `out_dir`, numbering slides from `offset`.
///
/// `out_dir` is created if needed. Returns the written file names.
pub fn convert_file(
    path: impl AsRef<Path>,
    out_dir: impl AsRef<Path>,
    offset: usize,
    options: &RasterOptions,
) -> Result<Vec<String>> {
    let data = fs::read(path)?;
    let out_dir = out_dir.as_ref();
    fs::create_dir_all(out_dir)?;
    let rasterizer = OoxmlRasterizer::new(options.clone());
    render::render_presentation(&rasterizer, &data, offset, out_dir)
}
