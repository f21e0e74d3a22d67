//! Error types for reading slide decks.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while opening or parsing a slide deck.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to open or read the input file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// Not a PPTX package, or a legacy binary deck.
    #[error("Unsupported or unrecognized file format: {0}")]
    UnsupportedFormat(String),

    /// A relationship points at a part the package does not contain.
    #[error("Missing package part: {0}")]
    MissingPart(String),

    /// The container is not a readable ZIP archive.
    #[error("ZIP error: {0}")]
    Archive(String),

    /// A slide, chart or relationship part is not well-formed XML.
    #[error("XML parsing error: {0}")]
    Xml(String),
}
