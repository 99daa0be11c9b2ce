//! Raster adapter: flat PNG files.

use std::path::Path;

use crate::error::{BakeError, Result};
use crate::types::PixelBuffer;

/// Decode a PNG file into an RGBA buffer.
pub fn decode_png(path: &Path) -> Result<PixelBuffer> {
    let img = image::open(path)
        .map_err(|e| BakeError::Decode {
            path: path.to_path_buf(),
            message: format!("failed to load image: {}", e),
        })?
        .to_rgba8();

    Ok(PixelBuffer::from_image(img))
}
