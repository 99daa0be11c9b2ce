//! Tile command implementation.
//!
//! Replicates a source image horizontally and vertically. A layered
//! document is tiled layer by layer into numbered outputs; a flat PNG
//! becomes a single tiled PNG.

use std::path::PathBuf;

use clap::Args;

use crate::error::Result;
use crate::output::{display_path, plural, Printer};
use crate::pipeline::{run_item, BatchItem, BatchOp};

/// Tile a source image a given number of times in each direction
#[derive(Args, Debug)]
pub struct TileArgs {
    /// Horizontal repeat count
    pub w: u32,

    /// Vertical repeat count
    pub h: u32,

    /// Source document (.pdn) or image (.png)
    pub in_file: PathBuf,

    /// Output path (defaults to deriving names from the input)
    pub out_file: Option<PathBuf>,
}

pub fn run(args: TileArgs, printer: &Printer) -> Result<()> {
    let dest = args.out_file.unwrap_or_else(|| args.in_file.clone());
    let item = BatchItem {
        source: args.in_file,
        dest,
        op: BatchOp::Tile {
            w: args.w,
            h: args.h,
        },
    };

    printer.status("Tiling", &display_path(&item.source));
    let outputs = run_item(&item)?;
    for path in &outputs {
        printer.info("Wrote", &display_path(path));
    }
    printer.status("Finished", &plural(outputs.len(), "output", "outputs"));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::write_png;
    use crate::types::PixelBuffer;
    use tempfile::tempdir;

    #[test]
    fn test_tile_png_default_output() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("pattern.png");
        write_png(&PixelBuffer::from_pixel(2, 2, [5, 5, 5, 255]), &source).unwrap();

        let args = TileArgs {
            w: 2,
            h: 3,
            in_file: source.clone(),
            out_file: None,
        };
        run(args, &Printer::new()).unwrap();

        // Default output overwrites the .png in place (same path)
        let out = crate::decode::decode_png(&source).unwrap();
        assert_eq!((out.width(), out.height()), (4, 6));
    }

    #[test]
    fn test_tile_png_explicit_output() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("pattern.png");
        let dest = dir.path().join("tiled.png");
        write_png(&PixelBuffer::from_pixel(3, 1, [9, 0, 0, 255]), &source).unwrap();

        let args = TileArgs {
            w: 2,
            h: 2,
            in_file: source,
            out_file: Some(dest.clone()),
        };
        run(args, &Printer::new()).unwrap();

        let out = crate::decode::decode_png(&dest).unwrap();
        assert_eq!((out.width(), out.height()), (6, 2));
    }

    #[test]
    fn test_tile_invalid_factor_fails() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("pattern.png");
        write_png(&PixelBuffer::from_pixel(1, 1, [0, 0, 0, 255]), &source).unwrap();

        let args = TileArgs {
            w: 0,
            h: 1,
            in_file: source,
            out_file: None,
        };
        assert!(run(args, &Printer::new()).is_err());
    }
}
