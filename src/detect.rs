//! Classification of uploaded files.
//!
//! Uploads are routed by filename suffix; presentation bytes are then
//! checked against the container magic to tell `.pptx` packages from
//! legacy binary `.ppt` files.

use crate::error::{Error, Result};

/// ZIP file magic bytes: PK\x03\x04
const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

/// OLE2 compound file magic, used by legacy `.ppt`.
const OLE_MAGIC: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Filename suffixes routed to the presentation renderer.
const PRESENTATION_SUFFIXES: [&str; 2] = [".ppt", ".pptx"];

/// Filename suffixes reported as slide images.
const SLIDE_IMAGE_SUFFIXES: [&str; 3] = [".png", ".jpg", ".jpeg"];

/// How an uploaded file becomes slides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// A deck to rasterize, one PNG per slide.
    Presentation,
    /// A ready-to-use image, stored as-is.
    Image,
}

/// Container format of a presentation file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentationFormat {
    /// Office Open XML package (.pptx)
    Pptx,
    /// Legacy binary PowerPoint (.ppt)
    Ppt,
}

impl PresentationFormat {
    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            PresentationFormat::Pptx => "pptx",
            PresentationFormat::Ppt => "ppt",
        }
    }
}

impl std::fmt::Display for PresentationFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PresentationFormat::Pptx => write!(f, "PowerPoint Presentation"),
            PresentationFormat::Ppt => write!(f, "PowerPoint 97-2003 Presentation"),
        }
    }
}

/// Classify an upload by its filename, ignoring case.
pub fn classify(file_name: &str) -> SourceKind {
    if has_suffix_ignore_case(file_name, &PRESENTATION_SUFFIXES) {
        SourceKind::Presentation
    } else {
        SourceKind::Image
    }
}

/// Whether a stored filename counts as a slide image, ignoring case.
pub fn is_slide_image(file_name: &str) -> bool {
    has_suffix_ignore_case(file_name, &SLIDE_IMAGE_SUFFIXES)
}

fn has_suffix_ignore_case(file_name: &str, suffixes: &[&str]) -> bool {
    let lower = file_name.to_lowercase();
    suffixes.iter().any(|suffix| lower.ends_with(suffix))
}

/// Detect the container format of presentation bytes.
pub fn detect_presentation_format(data: &[u8]) -> Result<PresentationFormat> {
    if data.starts_with(&ZIP_MAGIC) {
        Ok(PresentationFormat::Pptx)
    } else if data.starts_with(&OLE_MAGIC) {
        Ok(PresentationFormat::Ppt)
    } else {
        Err(Error::UnknownFormat)
    }
}
