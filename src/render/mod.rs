//! Page thumbnails
//!
//! A [`Rasterizer`] turns a page into an RGB bitmap; [`Thumbnailer`] fits
//! that bitmap into a fixed 300x400 box with rounded corners.

pub mod pdfium;
pub mod raster;
pub mod thumbnail;

pub use pdfium::PdfiumRasterizer;
pub use raster::{RasterImage, Rasterizer};
pub use thumbnail::{RenderOptions, Thumbnail, Thumbnailer, THUMBNAIL_HEIGHT, THUMBNAIL_WIDTH};
