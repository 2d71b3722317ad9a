//! PDF manipulation module

pub mod document;
pub mod merge;
pub mod metadata;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used items
pub use document::PdfDocument;
pub use merge::{merge, merge_pdfs, merged_output_path, MergeOptions};
pub use metadata::{count_pages, extract_metadata, PdfMetadata};
