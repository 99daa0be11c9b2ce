//! Batch planning and execution.
//!
//! A batch is a list of independent items: source document, destination
//! path, and the conversion to apply. Items come from the manifest's
//! static list plus the scanned UI directory, and run strictly one at a
//! time — nothing is shared between them.

mod driver;
mod manifest;
mod naming;
mod scanner;

use std::path::{Path, PathBuf};

pub use driver::{run_batch, run_item, BatchReport, RunOptions};
pub use manifest::{Manifest, ManifestItem, OpSpec, UiConfig, MANIFEST_FILENAME};
pub use naming::{numbered_output, single_output};
pub use scanner::{scan_ui_assets, split_directive};

use crate::transform::FrameLayout;
use crate::types::LayerFilter;

/// One unit of batch work.
#[derive(Debug, Clone)]
pub struct BatchItem {
    pub source: PathBuf,
    pub dest: PathBuf,
    pub op: BatchOp,
}

/// The conversion a batch item applies.
#[derive(Debug, Clone)]
pub enum BatchOp {
    Flatten { filter: LayerFilter },
    Tile { w: u32, h: u32 },
    Upscale { scale: u32 },
    SplitUpscale { split: u32, scale: u32 },
    Repack(FrameLayout),
}

/// Expand a manifest into the batch item list.
///
/// Static items resolve against the manifest's roots; items without an
/// explicit op flatten with the manifest's exclusions. The UI directory
/// scan is appended after the static items.
pub fn plan(manifest: &Manifest, root: &Path) -> Vec<BatchItem> {
    let source_root = root.join(&manifest.source_root);
    let output_root = root.join(&manifest.output_root);

    let mut items = Vec::new();
    for item in &manifest.items {
        let op = match &item.op {
            None | Some(OpSpec::Flatten) => {
                let names = item.exclude.as_ref().unwrap_or(&manifest.exclude);
                BatchOp::Flatten {
                    filter: LayerFilter::excluding(names),
                }
            }
            Some(OpSpec::Tile { w, h }) => BatchOp::Tile { w: *w, h: *h },
            Some(OpSpec::Upscale { scale }) => BatchOp::Upscale { scale: *scale },
            Some(OpSpec::SplitUpscale { split, scale }) => BatchOp::SplitUpscale {
                split: *split,
                scale: *scale,
            },
            Some(OpSpec::Repack(layout)) => BatchOp::Repack(*layout),
        };
        items.push(BatchItem {
            source: source_root.join(&item.source),
            dest: output_root.join(&item.dest),
            op,
        });
    }

    if let Some(ui) = &manifest.ui {
        items.extend(scan_ui_assets(
            &source_root.join(&ui.dir),
            &output_root.join(&ui.dir),
            ui.scale,
        ));
    }

    items
}
