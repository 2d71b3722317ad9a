//! Scoped PDF document handle

use std::path::{Path, PathBuf};
use lopdf::Document;
use tracing::debug;
use crate::error::{Error, OpenFailure, Result};

/// An opened PDF file.
///
/// The file is fully read on [`PdfDocument::open`] and released when the
/// handle is dropped, so a handle never outlives the operation that opened it.
#[derive(Debug)]
pub struct PdfDocument {
    path: PathBuf,
    inner: Document,
}

impl PdfDocument {
    /// Open and parse the PDF at `path`.
    ///
    /// Fails with [`Error::DocumentOpen`] when the file is missing, cannot be
    /// parsed, or has an empty page tree.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::open(path, OpenFailure::NotFound));
        }

        let inner = Document::load(path).map_err(|e| Error::open(path, e))?;
        let page_count = inner.get_pages().len();
        if page_count == 0 {
            return Err(Error::open(path, OpenFailure::NoPages));
        }

        debug!(path = %path.display(), page_count, "opened document");

        Ok(Self {
            path: path.to_path_buf(),
            inner,
        })
    }

    /// Path the document was opened from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of pages in the page tree
    pub fn page_count(&self) -> usize {
        self.inner.get_pages().len()
    }

    /// Fail with [`Error::PageIndex`] unless `index` names an existing page
    pub fn check_page_index(&self, index: usize) -> Result<()> {
        let page_count = self.page_count();
        if index >= page_count {
            return Err(Error::PageIndex {
                path: self.path.clone(),
                index,
                page_count,
            });
        }
        Ok(())
    }

    /// Borrow the underlying lopdf document
    pub fn as_lopdf(&self) -> &Document {
        &self.inner
    }

    /// Give up the handle and take the lopdf document
    pub fn into_inner(self) -> Document {
        self.inner
    }
}
