//! PDF merging functionality using lopdf

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use lopdf::{Dictionary, Document, Object, ObjectId};
use tempfile::Builder;
use tracing::{debug, info};
use crate::error::{Error, Result};
use crate::pdf::document::PdfDocument;

/// Attributes a page may inherit from its ancestors in the page tree
const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Options for merging PDFs
#[derive(Debug, Clone)]
pub struct MergeOptions {
    /// Input PDF file paths in the order they should be merged
    pub input_paths: Vec<PathBuf>,
    /// Output PDF file path
    pub output_path: PathBuf,
}

/// Merge `input_paths` into `<dir of first input>/<output_name>.pdf`.
///
/// Pages appear in the output in exactly the order of `input_paths`. An
/// existing file with the same name is replaced. Returns the path written.
///
/// # Example
///
/// ```no_run
/// use pdf_merger::pdf::merge;
///
/// let written = merge("merged", &["scans/a.pdf", "scans/b.pdf"])
///     .expect("Failed to merge");
/// assert!(written.ends_with("scans/merged.pdf"));
/// ```
pub fn merge<P: AsRef<Path>>(output_name: &str, input_paths: &[P]) -> Result<PathBuf> {
    let first = input_paths.first().ok_or(Error::NoInputs)?;
    let output_path = merged_output_path(first.as_ref(), output_name)?;

    let options = MergeOptions {
        input_paths: input_paths.iter().map(|p| p.as_ref().to_path_buf()).collect(),
        output_path,
    };
    merge_pdfs(&options)?;

    Ok(options.output_path)
}

/// Where [`merge`] writes its output for a given first input and name.
pub fn merged_output_path(first_input: &Path, output_name: &str) -> Result<PathBuf> {
    if output_name.is_empty()
        || output_name.contains(['/', '\\'])
        || output_name == "."
        || output_name == ".."
    {
        return Err(Error::InvalidOutputName(output_name.to_string()));
    }

    let dir = match first_input.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    Ok(dir.join(format!("{}.pdf", output_name)))
}

/// Merge multiple PDF files into a single PDF at an explicit output path
///
/// Every input is opened before anything is written; if any of them fails
/// to open, the output path is left untouched. The merged document is
/// written to a temporary file beside the destination and renamed into
/// place, so a failed write never leaves a truncated file behind.
///
/// Based on the lopdf merge example:
/// https://github.com/J-F-Liu/lopdf/blob/main/examples/merge.rs
pub fn merge_pdfs(options: &MergeOptions) -> Result<()> {
    if options.input_paths.is_empty() {
        return Err(Error::NoInputs);
    }

    // Load all documents
    let mut documents: Vec<PdfDocument> = Vec::with_capacity(options.input_paths.len());
    for path in &options.input_paths {
        documents.push(PdfDocument::open(path)?);
    }

    let input_count = documents.len();
    let mut merged_doc = concatenate(documents);
    let page_count = merged_doc.get_pages().len();

    merged_doc.compress();
    write_atomically(&mut merged_doc, &options.output_path)?;

    info!(
        inputs = input_count,
        pages = page_count,
        output = %options.output_path.display(),
        "merged documents"
    );

    Ok(())
}

/// Build one document whose page tree lists every input page in order.
///
/// Consumes the handles; all source documents are released on return.
fn concatenate(documents: Vec<PdfDocument>) -> Document {
    // Define a starting max_id for merged document
    let mut max_id = 1;
    let mut page_ids: Vec<ObjectId> = Vec::new();
    let mut objects: BTreeMap<ObjectId, Object> = BTreeMap::new();

    for handle in documents {
        debug!(path = %handle.path().display(), "appending pages");
        let mut doc = handle.into_inner();

        // Renumber objects in this document to avoid conflicts
        doc.renumber_objects_with(max_id);
        max_id = doc.max_id + 1;

        // get_pages is keyed by page number, so this keeps document order
        let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
        for &page_id in &pages {
            let inherited = inherited_attributes(&doc, page_id);
            if let Ok(Object::Dictionary(page)) = doc.get_object_mut(page_id) {
                for (key, value) in inherited {
                    page.set(key, value);
                }
            }
        }
        page_ids.extend(pages);

        objects.extend(doc.objects);
    }

    let mut merged_doc = Document::with_version("1.5");
    merged_doc.objects.extend(objects);

    // new_object_id() must hand out IDs above everything just added
    merged_doc.max_id = max_id - 1;

    let pages_id = merged_doc.new_object_id();
    let kids: Vec<Object> = page_ids.iter().map(|&id| Object::Reference(id)).collect();

    let mut pages_object = Dictionary::new();
    pages_object.set("Type", Object::Name(b"Pages".to_vec()));
    pages_object.set("Count", Object::Integer(page_ids.len() as i64));
    pages_object.set("Kids", Object::Array(kids));

    let catalog_id = merged_doc.new_object_id();
    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", Object::Reference(pages_id));

    merged_doc.objects.insert(catalog_id, Object::Dictionary(catalog));
    merged_doc.objects.insert(pages_id, Object::Dictionary(pages_object));
    merged_doc.trailer.set("Root", Object::Reference(catalog_id));

    for &page_id in &page_ids {
        if let Ok(Object::Dictionary(dict)) = merged_doc.get_object_mut(page_id) {
            dict.set("Parent", Object::Reference(pages_id));
        }
    }

    // Source catalogs and page tree nodes are unreachable once pages are re-parented
    let pruned = merged_doc.prune_objects();
    debug!(pruned = pruned.len(), "dropped unreferenced objects");

    merged_doc
}

/// Collect inheritable attributes the page does not set itself.
///
/// The nearest ancestor wins. Re-parenting a page under the merged page
/// tree would otherwise drop them.
fn inherited_attributes(doc: &Document, page_id: ObjectId) -> Vec<(Vec<u8>, Object)> {
    let Ok(Object::Dictionary(page)) = doc.get_object(page_id) else {
        return Vec::new();
    };

    let mut missing: Vec<&[u8]> = INHERITABLE_KEYS
        .iter()
        .copied()
        .filter(|key| !page.has(key))
        .collect();
    let mut found = Vec::new();

    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
    // Bounded walk in case of a cyclic Parent chain
    let mut depth = 0;
    while let Some(parent_id) = parent {
        if missing.is_empty() || depth > 64 {
            break;
        }
        let Ok(Object::Dictionary(node)) = doc.get_object(parent_id) else {
            break;
        };
        missing.retain(|key| match node.get(key) {
            Ok(value) => {
                found.push((key.to_vec(), value.clone()));
                false
            }
            Err(_) => true,
        });
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
        depth += 1;
    }

    found
}

/// Save `doc` to a sibling temp file, then rename it over `output_path`.
fn write_atomically(doc: &mut Document, output_path: &Path) -> Result<()> {
    let dir = match output_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut builder = Builder::new();
    builder.prefix(".pdf-merger-").suffix(".tmp");
    // Created like an ordinary file: 0666 less the umask
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }

    let mut staged = builder
        .tempfile_in(dir)
        .map_err(|e| Error::write(output_path, e))?;

    // An overwritten file keeps its mode
    if let Ok(existing) = std::fs::metadata(output_path) {
        staged
            .as_file()
            .set_permissions(existing.permissions())
            .map_err(|e| Error::write(output_path, e))?;
    }

    doc.save_to(staged.as_file_mut())
        .map_err(|e| Error::write(output_path, std::io::Error::other(e.to_string())))?;
    staged
        .as_file_mut()
        .flush()
        .map_err(|e| Error::write(output_path, e))?;
    staged
        .persist(output_path)
        .map_err(|e| Error::write(output_path, e.error))?;

    Ok(())
}
