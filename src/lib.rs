//! PDF Merger Library
//!
//! Lets a caller pick PDF files, preview them and merge them in order.
//! This library provides functionality to:
//! - Merge PDF files left to right into one document
//! - Render a page as a rounded 300x400 thumbnail
//! - Keep an ordered selection of files (add on the left or the right)
//! - Extract metadata (page counts, etc.)
//!
//! # Example
//!
//! ```no_run
//! use pdf_merger::selection::Selection;
//!
//! let mut selection = Selection::new();
//! selection.push_right("scans/2. body.pdf");
//! selection.push_left("scans/1. cover.pdf");
//!
//! // Writes scans/merged.pdf
//! selection.merge("merged").expect("Failed to merge PDFs");
//! ```

pub mod error;
pub mod pdf;
pub mod render;
pub mod selection;

// Re-export commonly used items
pub use error::{Error, OpenFailure, Result};
pub use pdf::merge;
pub use render::{RenderOptions, Thumbnail, Thumbnailer};
pub use selection::{Selection, Side};
