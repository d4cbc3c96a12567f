//! Error types for résumé deck rendering.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while planning, assembling, or filling a deck.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to open or read an input file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// The caller handed in something we cannot render (e.g. no subjects).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Subject or layout JSON could not be parsed.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The layout configuration is inconsistent.
    #[error("Invalid layout: {0}")]
    InvalidLayout(String),

    /// The template's structure does not match the layout it is used with.
    #[error("Template does not match layout: {0}")]
    TemplateMismatch(String),

    /// A slide index points past the end of the deck.
    #[error("Slide index {index} out of range (deck has {len} slides)")]
    SlideIndexOutOfRange { index: usize, len: usize },

    /// The deck's slide count no longer agrees with the slide index map.
    #[error("Deck out of sync with slide index map: deck has {actual} slides, map expects {expected}")]
    DeckOutOfSync { expected: usize, actual: usize },

    /// Failed to parse the PPTX package structure.
    #[error("PPTX parsing error: {0}")]
    PptxParseError(String),

    /// ZIP archive error (for PPTX).
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML parsing or writing error (for PPTX).
    #[error("XML error: {0}")]
    XmlError(String),
}
