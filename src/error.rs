//! Error types for the slidecast library.

use std::io;
use thiserror::Error;

/// Result type alias for slidecast operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while storing, converting or serving slides.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file format could not be determined.
    #[error("Unknown file format")]
    UnknownFormat,

    /// The file format is recognized but not supported.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Error reading ZIP archive.
    #[error("ZIP archive error: {0}")]
    ZipArchive(String),

    /// Error parsing XML content.
    #[error("XML parse error: {0}")]
    XmlParse(String),

    /// Invalid or malformed data in the presentation.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// A required package part is missing.
    #[error("Missing component: {0}")]
    MissingComponent(String),

    /// Error decoding or encoding a raster image.
    #[error("Image error: {0}")]
    Image(String),

    /// An upload request carried no files.
    #[error("No files provided")]
    NoFiles,

    /// A request field failed validation.
    #[error("{0}")]
    InvalidInput(String),

    /// Signup with a username that already exists.
    #[error("Username taken")]
    UsernameTaken,

    /// Login with an unknown username or wrong password.
    #[error("Bad credentials")]
    InvalidCredentials,

    /// A protected endpoint was called without a bearer token.
    #[error("Missing bearer token")]
    MissingToken,

    /// A bearer token failed verification.
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// User store failure.
    #[error("Database error: {0}")]
    Database(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Unexpected internal failure.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::ZipArchive(err.to_string())
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::XmlParse(err.to_string())
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::Image(err.to_string())
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(err.to_string())
    }
}
