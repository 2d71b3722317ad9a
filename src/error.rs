//! Error types for the PDF merger library

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Why a document could not be opened
#[derive(Error, Debug)]
pub enum OpenFailure {
    /// Nothing exists at the path
    #[error("file not found")]
    NotFound,

    /// lopdf could not read or parse the file
    #[error(transparent)]
    Parse(#[from] lopdf::Error),

    /// The page tree is empty
    #[error("document has no pages")]
    NoPages,

    /// The rasterizer refused the document
    #[error("{0}")]
    Backend(String),
}

/// Main error type for the PDF merger library
#[derive(Error, Debug)]
pub enum Error {
    /// A path could not be opened as a PDF
    #[error("Cannot open {}: {source}", .path.display())]
    DocumentOpen {
        path: PathBuf,
        #[source]
        source: OpenFailure,
    },

    /// Requested page does not exist
    #[error("Page index {index} out of range for {} ({page_count} pages)", .path.display())]
    PageIndex {
        path: PathBuf,
        index: usize,
        page_count: usize,
    },

    /// Destination could not be written
    #[error("Cannot write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Merge called with an empty input list
    #[error("No input files provided")]
    NoInputs,

    /// Output name is empty or contains a path separator
    #[error("Invalid output name: {0:?}")]
    InvalidOutputName(String),

    /// The PDFium library could not be bound
    #[error("PDF rasterizer unavailable: {0}")]
    RasterizerUnavailable(String),

    /// Page rasterization failed after the document opened
    #[error("Rasterization failed: {0}")]
    Rasterize(String),

    /// PNG encoding failed
    #[error("Image encoding failed: {0}")]
    Encode(String),
}

impl Error {
    pub(crate) fn open(path: impl Into<PathBuf>, source: impl Into<OpenFailure>) -> Self {
        Error::DocumentOpen {
            path: path.into(),
            source: source.into(),
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Write {
            path: path.into(),
            source,
        }
    }
}
