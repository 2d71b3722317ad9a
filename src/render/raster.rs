//! Decoded page bitmaps and the rasterizer seam

use std::path::Path;
use crate::error::{Error, Result};

/// Bytes per RGB8 sample
const CHANNELS: usize = 3;

/// An RGB8 bitmap of one rendered page.
///
/// Rows are `stride` bytes apart; a row may carry padding past
/// `width * 3` bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    stride: usize,
    samples: Vec<u8>,
}

impl RasterImage {
    /// Wrap decoded samples, checking that the buffer covers every row.
    pub fn new(width: u32, height: u32, stride: usize, samples: Vec<u8>) -> Result<Self> {
        let row_bytes = width as usize * CHANNELS;
        if width == 0 || height == 0 {
            return Err(Error::Rasterize(format!("empty bitmap {}x{}", width, height)));
        }
        if stride < row_bytes {
            return Err(Error::Rasterize(format!(
                "stride {} shorter than row of {} bytes",
                stride, row_bytes
            )));
        }
        let needed = stride * (height as usize - 1) + row_bytes;
        if samples.len() < needed {
            return Err(Error::Rasterize(format!(
                "bitmap holds {} bytes, {} needed",
                samples.len(),
                needed
            )));
        }

        Ok(Self {
            width,
            height,
            stride,
            samples,
        })
    }

    /// A bitmap of one colour, tightly packed
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Result<Self> {
        let samples = rgb.repeat(width as usize * height as usize);
        Self::new(width, height, width as usize * CHANNELS, samples)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn samples(&self) -> &[u8] {
        &self.samples
    }

    /// RGB value at `(x, y)`, or `None` outside the bitmap
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let at = y as usize * self.stride + x as usize * CHANNELS;
        Some([self.samples[at], self.samples[at + 1], self.samples[at + 2]])
    }

    /// Pixel rows without stride padding
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> + '_ {
        let row_bytes = self.width as usize * CHANNELS;
        (0..self.height as usize).map(move |y| {
            let start = y * self.stride;
            &self.samples[start..start + row_bytes]
        })
    }
}

/// Turns one page of a PDF file into a bitmap.
///
/// Implementations open the document themselves and must release it
/// before returning.
pub trait Rasterizer {
    /// Render page `page_index` (zero-based) at `scale` times its size in points.
    fn rasterize(&self, path: &Path, page_index: usize, scale: f32) -> Result<RasterImage>;
}

impl<R: Rasterizer + ?Sized> Rasterizer for &R {
    fn rasterize(&self, path: &Path, page_index: usize, scale: f32) -> Result<RasterImage> {
        (**self).rasterize(path, page_index, scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_padded_rows_are_trimmed() {
        // 2x2 image, 8-byte stride (2 bytes padding per row)
        let samples = vec![
            1, 2, 3, 4, 5, 6, 0, 0, //
            7, 8, 9, 10, 11, 12, 0, 0,
        ];
        let image = RasterImage::new(2, 2, 8, samples).unwrap();

        let rows: Vec<&[u8]> = image.rows().collect();
        assert_eq!(rows, vec![&[1, 2, 3, 4, 5, 6][..], &[7, 8, 9, 10, 11, 12][..]]);
        assert_eq!(image.pixel(1, 1), Some([10, 11, 12]));
        assert_eq!(image.pixel(2, 0), None);
    }

    #[test]
    fn test_short_buffer_rejected() {
        assert!(RasterImage::new(2, 2, 6, vec![0; 11]).is_err());
        assert!(RasterImage::new(2, 2, 5, vec![0; 12]).is_err());
        assert!(RasterImage::new(0, 2, 0, Vec::new()).is_err());
    }

    #[test]
    fn test_filled() {
        let image = RasterImage::filled(3, 2, [9, 8, 7]).unwrap();
        assert_eq!(image.stride(), 9);
        assert_eq!(image.samples().len(), 18);
        assert_eq!(image.pixel(2, 1), Some([9, 8, 7]));
    }
}
