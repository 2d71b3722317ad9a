//! Ordered list of PDFs picked by the user

use std::path::{Path, PathBuf};
use crate::error::Result;
use crate::pdf::merge;

/// Which end of the selection a new file goes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// PDFs in the left-to-right order they will be merged.
///
/// Adding on the left prepends, adding on the right appends. The selection
/// is a plain value: [`Selection::merge`] borrows it and leaves it as is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    paths: Vec<PathBuf>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_left(&mut self, path: impl Into<PathBuf>) {
        self.paths.insert(0, path.into());
    }

    pub fn push_right(&mut self, path: impl Into<PathBuf>) {
        self.paths.push(path.into());
    }

    pub fn push(&mut self, side: Side, path: impl Into<PathBuf>) {
        match side {
            Side::Left => self.push_left(path),
            Side::Right => self.push_right(path),
        }
    }

    /// Forget every selected file
    pub fn clear(&mut self) {
        self.paths.clear();
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Merge the selection into `<dir of leftmost file>/<output_name>.pdf`
    pub fn merge(&self, output_name: &str) -> Result<PathBuf> {
        merge(output_name, self.paths.as_slice())
    }
}

impl<P: AsRef<Path>> FromIterator<P> for Selection {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        Self {
            paths: iter.into_iter().map(|p| p.as_ref().to_path_buf()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_left_prepends_right_appends() {
        let mut selection = Selection::new();
        selection.push_right("b.pdf");
        selection.push_left("a.pdf");
        selection.push(Side::Right, "c.pdf");
        selection.push(Side::Left, "z.pdf");

        let names: Vec<_> = selection.paths().iter().map(|p| p.to_str().unwrap()).collect();
        assert_eq!(names, ["z.pdf", "a.pdf", "b.pdf", "c.pdf"]);
    }

    #[test]
    fn test_clear() {
        let mut selection: Selection = ["a.pdf", "b.pdf"].into_iter().collect();
        assert_eq!(selection.len(), 2);
        selection.clear();
        assert!(selection.is_empty());
    }

    #[test]
    fn test_empty_selection_refuses_to_merge() {
        assert!(matches!(Selection::new().merge("merged"), Err(Error::NoInputs)));
    }
}
