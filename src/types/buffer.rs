//! In-memory pixel buffer.
//!
//! All pipeline stages exchange tightly-packed RGBA8 buffers. Transforms
//! never mutate their input; each produces a fresh buffer.

use crate::error::{BakeError, Result};

/// Number of components per pixel (RGBA).
pub const CHANNELS: u32 = 4;

/// A row-major RGBA8 image buffer.
///
/// Invariant: `data.len() == width * height * 4`. Constructors enforce it;
/// everything downstream may rely on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Create a transparent buffer of the given dimensions.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; (width * height * CHANNELS) as usize],
        }
    }

    /// Create a buffer filled with a single pixel value.
    pub fn from_pixel(width: u32, height: u32, pixel: [u8; 4]) -> Self {
        let mut data = Vec::with_capacity((width * height * CHANNELS) as usize);
        for _ in 0..width * height {
            data.extend_from_slice(&pixel);
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Wrap raw RGBA bytes, checking the size invariant.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = (width * height * CHANNELS) as usize;
        if data.len() != expected {
            return Err(BakeError::ShapeMismatch {
                message: format!(
                    "{}x{} buffer needs {} bytes, got {}",
                    width,
                    height,
                    expected,
                    data.len()
                ),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA bytes, row-major.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consume the buffer, returning the raw bytes.
    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// One row of pixels as a byte slice.
    ///
    /// Panics if `y` is out of bounds; callers iterate `0..height`.
    pub fn row(&self, y: u32) -> &[u8] {
        let stride = (self.width * CHANNELS) as usize;
        let start = y as usize * stride;
        &self.data[start..start + stride]
    }

    /// Mutable access to one row of pixels.
    pub fn row_mut(&mut self, y: u32) -> &mut [u8] {
        let stride = (self.width * CHANNELS) as usize;
        let start = y as usize * stride;
        &mut self.data[start..start + stride]
    }

    /// The pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = ((y * self.width + x) * CHANNELS) as usize;
        [self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]]
    }

    /// Overwrite the pixel at `(x, y)`.
    pub fn put_pixel(&mut self, x: u32, y: u32, pixel: [u8; 4]) {
        let i = ((y * self.width + x) * CHANNELS) as usize;
        self.data[i..i + 4].copy_from_slice(&pixel);
    }

    /// Copy out a vertical band of columns `[x0, x0 + width)`.
    pub fn slice_columns(&self, x0: u32, width: u32) -> Result<Self> {
        if x0 + width > self.width {
            return Err(BakeError::ShapeMismatch {
                message: format!(
                    "column range {}..{} exceeds buffer width {}",
                    x0,
                    x0 + width,
                    self.width
                ),
            });
        }
        let mut data = Vec::with_capacity((width * self.height * CHANNELS) as usize);
        for y in 0..self.height {
            let row = self.row(y);
            let start = (x0 * CHANNELS) as usize;
            let end = start + (width * CHANNELS) as usize;
            data.extend_from_slice(&row[start..end]);
        }
        Ok(Self {
            width,
            height: self.height,
            data,
        })
    }

    /// Convert into an `image` crate buffer for encoding.
    pub fn into_image(self) -> image::RgbaImage {
        // Invariant guarantees the exact byte count, so this cannot fail.
        image::RgbaImage::from_raw(self.width, self.height, self.data)
            .expect("buffer size invariant")
    }

    /// Build from a decoded `image` crate buffer.
    pub fn from_image(img: image::RgbaImage) -> Self {
        let (width, height) = (img.width(), img.height());
        Self {
            width,
            height,
            data: img.into_raw(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_transparent() {
        let buf = PixelBuffer::new(2, 3);
        assert_eq!(buf.width(), 2);
        assert_eq!(buf.height(), 3);
        assert_eq!(buf.data().len(), 24);
        assert!(buf.data().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_from_raw_checks_size() {
        assert!(PixelBuffer::from_raw(2, 2, vec![0; 16]).is_ok());

        let err = PixelBuffer::from_raw(2, 2, vec![0; 15]).unwrap_err();
        assert!(matches!(err, BakeError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_pixel_roundtrip() {
        let mut buf = PixelBuffer::new(3, 2);
        buf.put_pixel(2, 1, [10, 20, 30, 40]);
        assert_eq!(buf.pixel(2, 1), [10, 20, 30, 40]);
        assert_eq!(buf.pixel(0, 0), [0, 0, 0, 0]);
    }

    #[test]
    fn test_row() {
        let mut buf = PixelBuffer::new(2, 2);
        buf.put_pixel(0, 1, [1, 2, 3, 4]);
        buf.put_pixel(1, 1, [5, 6, 7, 8]);
        assert_eq!(buf.row(1), &[1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_slice_columns() {
        let mut buf = PixelBuffer::new(4, 1);
        for x in 0..4 {
            buf.put_pixel(x, 0, [x as u8, 0, 0, 255]);
        }

        let slice = buf.slice_columns(1, 2).unwrap();
        assert_eq!(slice.width(), 2);
        assert_eq!(slice.height(), 1);
        assert_eq!(slice.pixel(0, 0), [1, 0, 0, 255]);
        assert_eq!(slice.pixel(1, 0), [2, 0, 0, 255]);
    }

    #[test]
    fn test_slice_columns_out_of_range() {
        let buf = PixelBuffer::new(4, 1);
        assert!(matches!(
            buf.slice_columns(2, 3).unwrap_err(),
            BakeError::ShapeMismatch { .. }
        ));
    }

    #[test]
    fn test_image_roundtrip() {
        let buf = PixelBuffer::from_pixel(2, 2, [9, 8, 7, 6]);
        let img = buf.clone().into_image();
        assert_eq!(img.get_pixel(1, 1).0, [9, 8, 7, 6]);
        assert_eq!(PixelBuffer::from_image(img), buf);
    }
}
