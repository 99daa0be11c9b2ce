//! Source decoding.
//!
//! The transform engine never sees a file format: this module turns a
//! source path into pixel buffers and everything downstream works on
//! those. Dispatch is by extension — `.pdn` through the layered-document
//! adapter, `.png` through the raster adapter, anything else is an error.

mod nrbf;
mod pdn;
mod png;

pub use pdn::decode_pdn;
pub use png::decode_png;

use std::path::Path;

use crate::error::{BakeError, Result};
use crate::transform::flatten;
use crate::types::{LayeredDocument, PixelBuffer};

/// A decoded source: either a flat raster or a layered document.
#[derive(Debug, Clone)]
pub enum Decoded {
    Raster(PixelBuffer),
    Layered(LayeredDocument),
}

/// Decode a source file based on its extension.
pub fn decode(path: &Path) -> Result<Decoded> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "pdn" => Ok(Decoded::Layered(decode_pdn(path)?)),
        "png" => Ok(Decoded::Raster(decode_png(path)?)),
        _ => Err(BakeError::UnsupportedFormat {
            path: path.to_path_buf(),
            help: Some("Sources must be .pdn documents or .png images".to_string()),
        }),
    }
}

/// Decode a source file to a single flat buffer.
///
/// Layered documents are flattened with pass-through compositing (no
/// layer filtering); rasters are returned as-is.
pub fn decode_flat(path: &Path) -> Result<PixelBuffer> {
    match decode(path)? {
        Decoded::Raster(buffer) => Ok(buffer),
        Decoded::Layered(doc) => flatten(&doc),
    }
}
