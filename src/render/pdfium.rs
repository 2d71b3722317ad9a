//! PDFium-backed rasterizer

use std::path::Path;
use pdfium_render::prelude::{PdfBitmapFormat, PdfRenderConfig, Pdfium};
use tracing::debug;
use crate::error::{Error, OpenFailure, Result};
use crate::render::raster::{RasterImage, Rasterizer};

/// Renders pages with the PDFium shared library.
///
/// Binding the library is process-wide, so construct one of these up front
/// and reuse it for every thumbnail.
pub struct PdfiumRasterizer {
    pdfium: Pdfium,
}

impl PdfiumRasterizer {
    /// Bind PDFium from `library_dir`, or when `None`, from the working
    /// directory and then the system library path.
    pub fn bind(library_dir: Option<&Path>) -> Result<Self> {
        let bindings = match library_dir {
            Some(dir) => {
                let library = Pdfium::pdfium_platform_library_name_at_path(dir);
                Pdfium::bind_to_library(&library)
            }
            None => {
                let local = Pdfium::pdfium_platform_library_name_at_path(Path::new("./"));
                Pdfium::bind_to_library(&local).or_else(|_| Pdfium::bind_to_system_library())
            }
        }
        .map_err(|e| Error::RasterizerUnavailable(e.to_string()))?;

        Ok(Self {
            pdfium: Pdfium::new(bindings),
        })
    }
}

impl Rasterizer for PdfiumRasterizer {
    fn rasterize(&self, path: &Path, page_index: usize, scale: f32) -> Result<RasterImage> {
        let document = self
            .pdfium
            .load_pdf_from_file(path, None)
            .map_err(|e| Error::open(path, OpenFailure::Backend(e.to_string())))?;

        let pages = document.pages();
        let page_count = pages.len() as usize;
        let index = u16::try_from(page_index)
            .ok()
            .filter(|&i| (i as usize) < page_count)
            .ok_or_else(|| Error::PageIndex {
                path: path.to_path_buf(),
                index: page_index,
                page_count,
            })?;

        let page = pages
            .get(index)
            .map_err(|e| Error::Rasterize(e.to_string()))?;

        let config = PdfRenderConfig::new()
            .scale_page_by_factor(scale)
            .set_format(PdfBitmapFormat::BGRA)
            .set_reverse_byte_order(false);

        let bitmap = page
            .render_with_config(&config)
            .map_err(|e| Error::Rasterize(e.to_string()))?;

        let width = u32::try_from(bitmap.width()).unwrap_or(0);
        let height = u32::try_from(bitmap.height()).unwrap_or(0);
        debug!(path = %path.display(), page_index, width, height, "rasterized page");

        let bgra = bitmap.as_raw_bytes();
        let image = bgra_to_raster(width, height, &bgra)?;
        Ok(image)
    }
}

/// Repack a BGRA bitmap of any row stride into tightly packed RGB8.
fn bgra_to_raster(width: u32, height: u32, bgra: &[u8]) -> Result<RasterImage> {
    if width == 0 || height == 0 {
        return Err(Error::Rasterize(format!("empty bitmap {}x{}", width, height)));
    }

    let src_stride = bgra.len() / height as usize;
    if src_stride < width as usize * 4 {
        return Err(Error::Rasterize(format!(
            "bitmap of {} bytes too small for {}x{} BGRA",
            bgra.len(),
            width,
            height
        )));
    }

    let mut rgb = Vec::with_capacity(width as usize * height as usize * 3);
    for row in bgra.chunks_exact(src_stride).take(height as usize) {
        for px in row[..width as usize * 4].chunks_exact(4) {
            rgb.extend_from_slice(&[px[2], px[1], px[0]]);
        }
    }

    RasterImage::new(width, height, width as usize * 3, rgb)
}
