//! Layer flattening.
//!
//! Composites a layered document into a single RGBA8 buffer, optionally
//! excluding layers by name first.

use crate::error::{BakeError, Result};
use crate::types::{Layer, LayerFilter, LayeredDocument, PixelBuffer};

/// Flatten every visible layer, no name filtering.
pub fn flatten(doc: &LayeredDocument) -> Result<PixelBuffer> {
    flatten_filtered(doc, &LayerFilter::none())
}

/// Flatten the document after dropping layers the filter excludes.
///
/// Layers are composited bottom-to-top in document order with src-over
/// alpha blending; invisible layers are skipped and layer opacity scales
/// the source alpha. Fails with `EmptyResult` when nothing is left to
/// composite and with `ShapeMismatch` when a contributing layer does not
/// match the document size.
pub fn flatten_filtered(doc: &LayeredDocument, filter: &LayerFilter) -> Result<PixelBuffer> {
    let kept: Vec<&Layer> = doc
        .layers
        .iter()
        .filter(|l| l.visible && !filter.excludes(&l.name))
        .collect();

    if kept.is_empty() {
        return Err(BakeError::EmptyResult {
            message: "no layers left to flatten after filtering".to_string(),
        });
    }

    for layer in &kept {
        if layer.image.width() != doc.width || layer.image.height() != doc.height {
            return Err(BakeError::ShapeMismatch {
                message: format!(
                    "layer '{}' is {}x{}, document is {}x{}",
                    layer.name,
                    layer.image.width(),
                    layer.image.height(),
                    doc.width,
                    doc.height
                ),
            });
        }
    }

    let mut out = PixelBuffer::new(doc.width, doc.height);
    for layer in kept {
        composite_over(&mut out, &layer.image, layer.opacity);
    }
    Ok(out)
}

/// Src-over blend `src` (scaled by `opacity`) onto `dst` in place.
///
/// Straight-alpha u8 arithmetic; both buffers must already be the same
/// size.
fn composite_over(dst: &mut PixelBuffer, src: &PixelBuffer, opacity: u8) {
    for y in 0..dst.height() {
        for x in 0..dst.width() {
            let s = src.pixel(x, y);
            let d = dst.pixel(x, y);

            let sa = s[3] as u32 * opacity as u32 / 255;
            if sa == 0 {
                continue;
            }
            let da = d[3] as u32;

            let oa = sa + da * (255 - sa) / 255;
            let mut o = [0u8; 4];
            for c in 0..3 {
                let sc = s[c] as u32;
                let dc = d[c] as u32;
                o[c] = ((sc * sa + dc * da * (255 - sa) / 255) / oa) as u8;
            }
            o[3] = oa as u8;
            dst.put_pixel(x, y, o);
        }
    }
}
