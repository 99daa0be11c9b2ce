//! Tile replication.

use crate::error::{BakeError, Result};
use crate::types::PixelBuffer;

/// Replicate a buffer `w_repeat` times horizontally and `h_repeat` times
/// vertically.
///
/// Plain replication: the output is `(h * h_repeat) x (w * w_repeat)` with
/// no seam handling. Fails with `InvalidArgument` for zero factors.
pub fn tile(src: &PixelBuffer, w_repeat: u32, h_repeat: u32) -> Result<PixelBuffer> {
    if w_repeat == 0 || h_repeat == 0 {
        return Err(BakeError::InvalidArgument {
            message: format!("repeat factors must be >= 1, got {}x{}", w_repeat, h_repeat),
            help: None,
        });
    }

    let out_w = src.width() * w_repeat;
    let out_h = src.height() * h_repeat;
    let mut data = Vec::with_capacity((out_w * out_h * 4) as usize);

    for out_y in 0..out_h {
        let row = src.row(out_y % src.height());
        for _ in 0..w_repeat {
            data.extend_from_slice(row);
        }
    }

    PixelBuffer::from_raw(out_w, out_h, data)
}
