//! PNG output sink.

use std::fs;
use std::path::Path;

use crate::error::{BakeError, Result};
use crate::types::PixelBuffer;

/// Write a pixel buffer to a PNG file, creating parent directories.
pub fn write_png(buffer: &PixelBuffer, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| BakeError::Write {
                path: path.to_path_buf(),
                message: format!("failed to create output directory: {}", e),
            })?;
        }
    }

    buffer
        .clone()
        .into_image()
        .save(path)
        .map_err(|e| BakeError::Write {
            path: path.to_path_buf(),
            message: format!("failed to write PNG: {}", e),
        })?;

    Ok(())
}
