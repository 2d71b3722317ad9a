//! Rounded, fixed-size page thumbnails

use std::path::Path;
use tiny_skia::{
    FillRule, FilterQuality, IntSize, Mask, Path as SkPath, PathBuilder, Pixmap, PixmapPaint,
    Rect, Transform,
};
use tracing::{debug, info};
use crate::error::{Error, OpenFailure, Result};
use crate::pdf::document::PdfDocument;
use crate::render::raster::{RasterImage, Rasterizer};

/// Thumbnail width in pixels
pub const THUMBNAIL_WIDTH: u32 = 300;
/// Thumbnail height in pixels
pub const THUMBNAIL_HEIGHT: u32 = 400;

/// Control-point distance for a quarter circle drawn with one cubic
const KAPPA: f32 = 0.552_284_8;

/// Options for rendering a thumbnail
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    /// Zero-based page to render
    pub page_index: usize,
    /// Render scale relative to the page size in points
    pub scale: f32,
    /// Corner radius in thumbnail pixels
    pub corner_radius: u32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            page_index: 0,
            scale: 0.3,
            corner_radius: 12,
        }
    }
}

/// A 300x400 RGBA image with transparent rounded corners
#[derive(Debug, Clone)]
pub struct Thumbnail {
    pixmap: Pixmap,
}

impl Thumbnail {
    /// Fit `raster` into the thumbnail box and clip its corners.
    ///
    /// The page is scaled to cover the whole box with its aspect ratio kept,
    /// centred, and whatever overflows is cropped.
    pub fn from_raster(raster: &RasterImage, corner_radius: f32) -> Result<Self> {
        let source = to_pixmap(raster)?;

        let mut pixmap = Pixmap::new(THUMBNAIL_WIDTH, THUMBNAIL_HEIGHT)
            .ok_or_else(|| Error::Rasterize("cannot allocate thumbnail".to_string()))?;
        let mask = corner_mask(THUMBNAIL_WIDTH, THUMBNAIL_HEIGHT, corner_radius)?;

        let (box_w, box_h) = (THUMBNAIL_WIDTH as f32, THUMBNAIL_HEIGHT as f32);
        let (src_w, src_h) = (raster.width() as f32, raster.height() as f32);
        let scale = (box_w / src_w).max(box_h / src_h);
        let dx = (box_w - src_w * scale) / 2.0;
        let dy = (box_h - src_h * scale) / 2.0;

        let paint = PixmapPaint {
            quality: FilterQuality::Bicubic,
            ..PixmapPaint::default()
        };
        pixmap.draw_pixmap(
            0,
            0,
            source.as_ref(),
            &paint,
            Transform::from_row(scale, 0.0, 0.0, scale, dx, dy),
            Some(&mask),
        );

        Ok(Self { pixmap })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Straight (non-premultiplied) RGBA at `(x, y)`
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let color = self.pixmap.pixel(x, y)?.demultiply();
        Some([color.red(), color.green(), color.blue(), color.alpha()])
    }

    /// Premultiplied RGBA bytes, row-major
    pub fn data(&self) -> &[u8] {
        self.pixmap.data()
    }

    pub fn encode_png(&self) -> Result<Vec<u8>> {
        self.pixmap
            .encode_png()
            .map_err(|e| Error::Encode(e.to_string()))
    }

    pub fn save_png(&self, path: &Path) -> Result<()> {
        let png = self.encode_png()?;
        std::fs::write(path, png).map_err(|e| Error::write(path, e))
    }
}

/// Renders thumbnails of PDF pages through a [`Rasterizer`].
///
/// Every call re-reads the file; nothing is cached between calls.
pub struct Thumbnailer<R> {
    rasterizer: R,
}

impl<R: Rasterizer> Thumbnailer<R> {
    pub fn new(rasterizer: R) -> Self {
        Self { rasterizer }
    }

    pub fn rasterizer(&self) -> &R {
        &self.rasterizer
    }

    /// Render one page of `path` as a [`Thumbnail`].
    ///
    /// Fails with [`Error::DocumentOpen`] when the file is not a readable
    /// PDF and with [`Error::PageIndex`] when the page does not exist.
    pub fn render_page(&self, path: impl AsRef<Path>, options: &RenderOptions) -> Result<Thumbnail> {
        let path = path.as_ref();
        if !(options.scale.is_finite() && options.scale > 0.0) {
            return Err(Error::Rasterize(format!("invalid render scale {}", options.scale)));
        }

        // Released before the rasterizer opens the file again. Files lopdf
        // cannot parse are left to the rasterizer, which reports the same
        // error kinds.
        match PdfDocument::open(path) {
            Ok(doc) => doc.check_page_index(options.page_index)?,
            Err(Error::DocumentOpen {
                source: OpenFailure::Parse(e),
                ..
            }) => debug!(path = %path.display(), error = %e, "lopdf could not parse, deferring to rasterizer"),
            Err(e) => return Err(e),
        }

        let raster = self
            .rasterizer
            .rasterize(path, options.page_index, options.scale)?;
        let thumbnail = Thumbnail::from_raster(&raster, options.corner_radius as f32)?;

        info!(
            path = %path.display(),
            page = options.page_index,
            source_width = raster.width(),
            source_height = raster.height(),
            "rendered thumbnail"
        );

        Ok(thumbnail)
    }
}

fn to_pixmap(raster: &RasterImage) -> Result<Pixmap> {
    let size = IntSize::from_wh(raster.width(), raster.height())
        .ok_or_else(|| Error::Rasterize("empty page bitmap".to_string()))?;

    // Opaque RGB is already premultiplied once alpha is 255
    let mut rgba = Vec::with_capacity(raster.width() as usize * raster.height() as usize * 4);
    for row in raster.rows() {
        for px in row.chunks_exact(3) {
            rgba.extend_from_slice(&[px[0], px[1], px[2], u8::MAX]);
        }
    }

    Pixmap::from_vec(rgba, size)
        .ok_or_else(|| Error::Rasterize("page bitmap does not fit its size".to_string()))
}

fn corner_mask(width: u32, height: u32, radius: f32) -> Result<Mask> {
    let mut mask = Mask::new(width, height)
        .ok_or_else(|| Error::Rasterize("cannot allocate clip mask".to_string()))?;
    let path = rounded_rect(width as f32, height as f32, radius)
        .ok_or_else(|| Error::Rasterize("degenerate clip path".to_string()))?;
    mask.fill_path(&path, FillRule::Winding, true, Transform::identity());
    Ok(mask)
}

/// Outline of a `width` x `height` rectangle at the origin with circular
/// corners. The radius is clamped to half the shorter side.
fn rounded_rect(width: f32, height: f32, radius: f32) -> Option<SkPath> {
    let r = radius.min(width.min(height) / 2.0);
    if !(r > 0.0) {
        return Some(PathBuilder::from_rect(Rect::from_xywh(0.0, 0.0, width, height)?));
    }
    let k = r * KAPPA;

    let mut pb = PathBuilder::new();
    pb.move_to(r, 0.0);
    pb.line_to(width - r, 0.0);
    pb.cubic_to(width - r + k, 0.0, width, r - k, width, r);
    pb.line_to(width, height - r);
    pb.cubic_to(width, height - r + k, width - r + k, height, width - r, height);
    pb.line_to(r, height);
    pb.cubic_to(r - k, height, 0.0, height - r + k, 0.0, height - r);
    pb.line_to(0.0, r);
    pb.cubic_to(0.0, r - k, r - k, 0.0, r, 0.0);
    pb.close();
    pb.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::path::PathBuf;
    use crate::pdf::test_support::write_labelled_pdf;
    use tempfile::TempDir;

    /// Hands back a solid bitmap and counts how often it was asked
    struct SolidRasterizer {
        calls: Cell<usize>,
    }

    impl SolidRasterizer {
        fn new() -> Self {
            Self { calls: Cell::new(0) }
        }
    }

    impl Rasterizer for SolidRasterizer {
        fn rasterize(&self, _path: &Path, _page_index: usize, scale: f32) -> Result<RasterImage> {
            self.calls.set(self.calls.get() + 1);
            let w = (612.0 * scale).round() as u32;
            let h = (792.0 * scale).round() as u32;
            RasterImage::filled(w, h, [200, 40, 40])
        }
    }

    fn one_page_pdf(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("page.pdf");
        write_labelled_pdf(&path, &["cover"]);
        path
    }

    #[test]
    fn test_default_options() {
        let options = RenderOptions::default();
        assert_eq!(options.page_index, 0);
        assert_eq!(options.scale, 0.3);
        assert_eq!(options.corner_radius, 12);
    }

    #[test]
    fn test_thumbnail_size_and_rounded_corners() {
        let raster = RasterImage::filled(60, 80, [255, 0, 0]).unwrap();
        let thumb = Thumbnail::from_raster(&raster, 12.0).unwrap();

        assert_eq!((thumb.width(), thumb.height()), (300, 400));
        for (x, y) in [(0, 0), (299, 0), (0, 399), (299, 399), (1, 1)] {
            assert_eq!(thumb.pixel(x, y).unwrap()[3], 0, "corner ({}, {})", x, y);
        }

        let centre = thumb.pixel(150, 200).unwrap();
        assert!(centre[3] >= 250);
        assert!(centre[0] > 200 && centre[1] < 30);
    }

    #[test]
    fn test_zero_radius_keeps_square_corners() {
        let raster = RasterImage::filled(30, 40, [0, 0, 255]).unwrap();
        let thumb = Thumbnail::from_raster(&raster, 0.0).unwrap();
        assert!(thumb.pixel(0, 0).unwrap()[3] >= 250);
        assert!(thumb.pixel(299, 399).unwrap()[3] >= 250);
    }

    #[test]
    fn test_wide_page_is_centre_cropped() {
        // Square page: left half red, right half blue
        let mut samples: Vec<u8> = Vec::new();
        for _y in 0..100 {
            for x in 0..100 {
                samples.extend_from_slice(if x < 50 { &[255, 0, 0] } else { &[0, 0, 255] });
            }
        }
        let raster = RasterImage::new(100, 100, 300, samples).unwrap();
        let thumb = Thumbnail::from_raster(&raster, 12.0).unwrap();

        let left = thumb.pixel(40, 200).unwrap();
        let right = thumb.pixel(260, 200).unwrap();
        assert!(left[0] > 200 && left[2] < 50);
        assert!(right[2] > 200 && right[0] < 50);
    }

    #[test]
    fn test_render_page_uses_rasterizer() {
        let dir = TempDir::new().unwrap();
        let path = one_page_pdf(&dir);
        let thumbnailer = Thumbnailer::new(SolidRasterizer::new());

        let thumb = thumbnailer.render_page(&path, &RenderOptions::default()).unwrap();
        assert_eq!((thumb.width(), thumb.height()), (300, 400));
        assert_eq!(thumbnailer.rasterizer().calls.get(), 1);
    }

    #[test]
    fn test_render_page_out_of_range() {
        let dir = TempDir::new().unwrap();
        let path = one_page_pdf(&dir);
        let thumbnailer = Thumbnailer::new(SolidRasterizer::new());

        let options = RenderOptions {
            page_index: 1,
            ..RenderOptions::default()
        };
        let err = thumbnailer.render_page(&path, &options).unwrap_err();
        assert!(matches!(err, Error::PageIndex { index: 1, page_count: 1, .. }));
        assert_eq!(thumbnailer.rasterizer().calls.get(), 0);
    }

    #[test]
    fn test_render_page_missing_file() {
        let thumbnailer = Thumbnailer::new(SolidRasterizer::new());
        let err = thumbnailer
            .render_page("missing.pdf", &RenderOptions::default())
            .unwrap_err();
        assert!(matches!(
            err,
            Error::DocumentOpen { source: OpenFailure::NotFound, .. }
        ));
        assert_eq!(thumbnailer.rasterizer().calls.get(), 0);
    }

    /// Refuses every document the way PDFium does for a broken file
    struct RejectingRasterizer {
        calls: Cell<usize>,
    }

    impl Rasterizer for RejectingRasterizer {
        fn rasterize(&self, path: &Path, _page_index: usize, _scale: f32) -> Result<RasterImage> {
            self.calls.set(self.calls.get() + 1);
            Err(Error::open(path, OpenFailure::Backend("bad xref".to_string())))
        }
    }

    #[test]
    fn test_unparseable_file_is_left_to_rasterizer() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("odd.pdf");
        std::fs::write(&path, b"not a pdf lopdf can read").unwrap();

        let solid = Thumbnailer::new(SolidRasterizer::new());
        let thumb = solid.render_page(&path, &RenderOptions::default()).unwrap();
        assert_eq!((thumb.width(), thumb.height()), (300, 400));
        assert_eq!(solid.rasterizer().calls.get(), 1);

        let rejecting = Thumbnailer::new(RejectingRasterizer { calls: Cell::new(0) });
        let err = rejecting.render_page(&path, &RenderOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            Error::DocumentOpen { source: OpenFailure::Backend(_), .. }
        ));
        assert_eq!(rejecting.rasterizer().calls.get(), 1);
    }

    #[test]
    fn test_render_page_rejects_bad_scale() {
        let dir = TempDir::new().unwrap();
        let path = one_page_pdf(&dir);
        let thumbnailer = Thumbnailer::new(SolidRasterizer::new());

        let options = RenderOptions {
            scale: 0.0,
            ..RenderOptions::default()
        };
        assert!(matches!(
            thumbnailer.render_page(&path, &options),
            Err(Error::Rasterize(_))
        ));
    }

    #[test]
    fn test_save_png() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("thumb.png");
        let raster = RasterImage::filled(30, 40, [10, 20, 30]).unwrap();

        Thumbnail::from_raster(&raster, 12.0).unwrap().save_png(&out).unwrap();

        let bytes = std::fs::read(&out).unwrap();
        assert!(bytes.starts_with(b"\x89PNG"));
    }
}
