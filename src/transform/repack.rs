//! Sprite-frame repacking.
//!
//! Copies the frames of a horizontal strip into wider, centred slots on a
//! fixed-size canvas. The geometry is data, not code: a layout describes
//! frame width, slot width, frame count, and canvas size, so new sheets
//! reuse the same copy loop with different numbers.

use serde::Deserialize;

use crate::error::{BakeError, Result};
use crate::types::{PixelBuffer, CHANNELS};

/// Geometry for a frame repack.
///
/// Frame `i` is read from source columns `[i*frame_width, (i+1)*frame_width)`
/// and written to destination columns starting at
/// `origin_x + i*slot_width + (slot_width - frame_width) / 2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FrameLayout {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub frame_width: u32,
    pub slot_width: u32,
    pub frame_count: u32,
    /// Column of the first slot on the canvas.
    #[serde(default)]
    pub origin_x: u32,
    /// Row the strip is placed at on the canvas.
    #[serde(default)]
    pub origin_y: u32,
}

impl FrameLayout {
    fn validate(&self, src: &PixelBuffer) -> Result<()> {
        if self.frame_count == 0 || self.frame_width == 0 || self.slot_width == 0 {
            return Err(BakeError::InvalidArgument {
                message: "frame layout sizes and count must be >= 1".to_string(),
                help: None,
            });
        }
        if self.slot_width < self.frame_width {
            return Err(BakeError::InvalidArgument {
                message: format!(
                    "slot width {} is narrower than frame width {}",
                    self.slot_width, self.frame_width
                ),
                help: None,
            });
        }
        if src.width() < self.frame_count * self.frame_width {
            return Err(BakeError::ShapeMismatch {
                message: format!(
                    "source strip is {} wide, {} frames of {} need {}",
                    src.width(),
                    self.frame_count,
                    self.frame_width,
                    self.frame_count * self.frame_width
                ),
            });
        }
        if self.origin_x + self.frame_count * self.slot_width > self.canvas_width {
            return Err(BakeError::ShapeMismatch {
                message: format!(
                    "{} slots of {} at column {} overflow canvas width {}",
                    self.frame_count, self.slot_width, self.origin_x, self.canvas_width
                ),
            });
        }
        if self.origin_y + src.height() > self.canvas_height {
            return Err(BakeError::ShapeMismatch {
                message: format!(
                    "strip height {} at row {} overflows canvas height {}",
                    src.height(),
                    self.origin_y,
                    self.canvas_height
                ),
            });
        }
        Ok(())
    }
}

/// Repack a frame strip onto a padded canvas per the layout.
///
/// Untouched canvas pixels stay transparent.
pub fn repack(src: &PixelBuffer, layout: &FrameLayout) -> Result<PixelBuffer> {
    layout.validate(src)?;

    let margin = (layout.slot_width - layout.frame_width) / 2;
    let mut out = PixelBuffer::new(layout.canvas_width, layout.canvas_height);
    let frame_bytes = (layout.frame_width * CHANNELS) as usize;

    for i in 0..layout.frame_count {
        let src_x = (i * layout.frame_width * CHANNELS) as usize;
        let dst_x = ((layout.origin_x + i * layout.slot_width + margin) * CHANNELS) as usize;
        for y in 0..src.height() {
            let src_row = src.row(y);
            let dst_row = out.row_mut(layout.origin_y + y);
            dst_row[dst_x..dst_x + frame_bytes]
                .copy_from_slice(&src_row[src_x..src_x + frame_bytes]);
        }
    }

    Ok(out)
}
