//! Batch execution.
//!
//! Runs items strictly in sequence: decode, transform, write, next.
//! Progress reporting wraps each item from the outside; the transform
//! engine itself never prints.

use std::path::PathBuf;

use crate::decode::{decode, decode_flat, Decoded};
use crate::error::{BakeError, Result};
use crate::output::{display_path, plural, Printer};
use crate::sink::write_png;
use crate::transform::{flatten_filtered, repack, split_upscale, tile, upscale};

use super::naming::{numbered_output, single_output};
use super::{BatchItem, BatchOp};

/// Batch execution settings.
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    /// Abort the whole run on the first failed item. When false, failed
    /// items are recorded and the rest of the batch still runs.
    pub fail_fast: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self { fail_fast: true }
    }
}

/// Outcome of a batch run.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Items that completed.
    pub processed: usize,
    /// Output files written.
    pub outputs: usize,
    /// Failed items with their errors (only populated with
    /// `fail_fast: false`).
    pub failures: Vec<(PathBuf, BakeError)>,
}

/// Run a single batch item, returning the paths written.
pub fn run_item(item: &BatchItem) -> Result<Vec<PathBuf>> {
    let outputs = match &item.op {
        BatchOp::Flatten { filter } => match decode(&item.source)? {
            Decoded::Layered(doc) => {
                let flat = flatten_filtered(&doc, filter)?;
                write_single(&flat, item)?
            }
            // A raster has no layers to filter; pass it through unchanged.
            Decoded::Raster(buffer) => write_single(&buffer, item)?,
        },

        BatchOp::Tile { w, h } => match decode(&item.source)? {
            // The tiling tool works per layer: every layer of the document
            // becomes its own numbered, tiled output.
            Decoded::Layered(doc) => {
                let mut written = Vec::with_capacity(doc.layers.len());
                for (index, layer) in doc.layers.iter().enumerate() {
                    let tiled = tile(&layer.image, *w, *h)?;
                    let dest = numbered_output(&item.dest, index);
                    write_png(&tiled, &dest)?;
                    written.push(dest);
                }
                written
            }
            Decoded::Raster(buffer) => write_single(&tile(&buffer, *w, *h)?, item)?,
        },

        BatchOp::Upscale { scale } => {
            let flat = decode_flat(&item.source)?;
            write_single(&upscale(&flat, *scale)?, item)?
        }

        BatchOp::SplitUpscale { split, scale } => match decode(&item.source)? {
            Decoded::Raster(buffer) => {
                let parts = split_upscale(&buffer, *split, *scale)?;
                let mut written = Vec::with_capacity(parts.len());
                for (index, part) in parts.iter().enumerate() {
                    let dest = numbered_output(&item.dest, index);
                    write_png(part, &dest)?;
                    written.push(dest);
                }
                written
            }
            Decoded::Layered(_) => {
                return Err(BakeError::InvalidArgument {
                    message: format!(
                        "split upscale needs a flat strip, {} is layered",
                        item.source.display()
                    ),
                    help: Some("Flatten the document to a .png strip first".to_string()),
                })
            }
        },

        BatchOp::Repack(layout) => {
            let flat = decode_flat(&item.source)?;
            write_single(&repack(&flat, layout)?, item)?
        }
    };

    Ok(outputs)
}

fn write_single(buffer: &crate::types::PixelBuffer, item: &BatchItem) -> Result<Vec<PathBuf>> {
    let dest = single_output(&item.dest);
    write_png(buffer, &dest)?;
    Ok(vec![dest])
}

/// Run the whole batch, reporting per-item progress.
pub fn run_batch(
    items: &[BatchItem],
    options: RunOptions,
    printer: &Printer,
) -> Result<BatchReport> {
    let mut report = BatchReport::default();

    for item in items {
        printer.status("Baking", &display_path(&item.source));
        match run_item(item) {
            Ok(outputs) => {
                report.processed += 1;
                report.outputs += outputs.len();
            }
            Err(e) => {
                printer.error(
                    "Failed",
                    &format!("{} ({})", display_path(&item.source), e.kind()),
                );
                if options.fail_fast {
                    return Err(e);
                }
                report.failures.push((item.source.clone(), e));
            }
        }
    }

    printer.info(
        "Finished",
        &format!(
            "{} from {}",
            plural(report.outputs, "output", "outputs"),
            plural(report.processed, "item", "items"),
        ),
    );

    Ok(report)
}
