//! UI asset discovery.
//!
//! Recursively scans the UI directory for PNG strips. A `split-<N>-`
//! filename prefix is a build directive: the strip is cut into N frames
//! and each frame is upscaled separately. Everything else gets a plain
//! upscale. The directive prefix is stripped from destination names.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::{BatchItem, BatchOp};

/// Parse a `split-<N>-rest.png` directive.
///
/// Returns the split count and the remaining file name, or `None` when
/// the name carries no directive.
pub fn split_directive(file_name: &str) -> Option<(u32, &str)> {
    let rest = file_name.strip_prefix("split-")?;
    let (count, rest) = rest.split_once('-')?;
    let count: u32 = count.parse().ok()?;
    if count == 0 || rest.is_empty() {
        return None;
    }
    Some((count, rest))
}

/// Scan `ui_dir` for PNG assets and plan their conversions.
///
/// Destinations mirror the source layout under `dest_dir`. Results are
/// sorted by path so batch order is stable across runs.
pub fn scan_ui_assets(ui_dir: &Path, dest_dir: &Path, scale: u32) -> Vec<BatchItem> {
    let mut items = Vec::new();

    if !ui_dir.exists() {
        return items;
    }

    for entry in WalkDir::new(ui_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if path.is_dir() {
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) != Some("png") {
            continue;
        }
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        let relative = path.strip_prefix(ui_dir).unwrap_or(path);
        let (op, dest_name) = match split_directive(file_name) {
            Some((split, rest)) => (BatchOp::SplitUpscale { split, scale }, rest.to_string()),
            None => (BatchOp::Upscale { scale }, file_name.to_string()),
        };

        let dest = match relative.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                dest_dir.join(parent).join(dest_name)
            }
            _ => dest_dir.join(dest_name),
        };

        items.push(BatchItem {
            source: path.to_path_buf(),
            dest,
            op,
        });
    }

    items
}
