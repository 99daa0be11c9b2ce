//! Integer upscaling.
//!
//! Nearest-neighbour magnification for pixel art: each source pixel
//! becomes an `s x s` block, hard edges preserved.

use crate::error::{BakeError, Result};
use crate::types::{PixelBuffer, CHANNELS};

/// Upscale by an integer factor with nearest-neighbour sampling.
///
/// Output pixel `(x, y)` equals source pixel `(x / scale, y / scale)`.
/// `upscale(b, 1)` is an exact copy. Fails with `InvalidArgument` for a
/// zero factor.
pub fn upscale(src: &PixelBuffer, scale: u32) -> Result<PixelBuffer> {
    if scale == 0 {
        return Err(BakeError::InvalidArgument {
            message: "scale factor must be >= 1".to_string(),
            help: None,
        });
    }
    if scale == 1 {
        return Ok(src.clone());
    }

    let out_w = src.width() * scale;
    let out_h = src.height() * scale;
    let mut data = Vec::with_capacity((out_w * out_h * CHANNELS) as usize);
    let mut expanded = Vec::with_capacity((out_w * CHANNELS) as usize);

    for y in 0..src.height() {
        expanded.clear();
        let row = src.row(y);
        for px in row.chunks_exact(CHANNELS as usize) {
            for _ in 0..scale {
                expanded.extend_from_slice(px);
            }
        }
        for _ in 0..scale {
            data.extend_from_slice(&expanded);
        }
    }

    PixelBuffer::from_raw(out_w, out_h, data)
}

/// Split into `split_count` equal-width vertical slices and upscale each.
///
/// Supports UI strips authored as one wide image holding several frames.
/// The width must divide evenly; a remainder fails with `InvalidArgument`
/// rather than silently truncating.
pub fn split_upscale(src: &PixelBuffer, split_count: u32, scale: u32) -> Result<Vec<PixelBuffer>> {
    if split_count == 0 {
        return Err(BakeError::InvalidArgument {
            message: "split count must be >= 1".to_string(),
            help: None,
        });
    }
    if src.width() % split_count != 0 {
        return Err(BakeError::InvalidArgument {
            message: format!(
                "width {} is not divisible into {} slices",
                src.width(),
                split_count
            ),
            help: Some("Author the strip with equal-width frames".to_string()),
        });
    }

    let slice_w = src.width() / split_count;
    let mut out = Vec::with_capacity(split_count as usize);
    for i in 0..split_count {
        let slice = src.slice_columns(i * slice_w, slice_w)?;
        out.push(upscale(&slice, scale)?);
    }
    Ok(out)
}
