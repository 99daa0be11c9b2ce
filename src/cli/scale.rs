//! Scale command implementation.
//!
//! Nearest-neighbour integer upscaling for pixel art, with an optional
//! split: `--split N` cuts the source into N equal-width frames and
//! upscales each into its own numbered output.

use std::path::PathBuf;

use clap::Args;

use crate::error::Result;
use crate::output::{display_path, plural, Printer};
use crate::pipeline::{run_item, BatchItem, BatchOp};

/// Integer-upscale a source image, optionally splitting it first
#[derive(Args, Debug)]
pub struct ScaleArgs {
    /// Source document (.pdn) or image (.png)
    pub in_file: PathBuf,

    /// Output path (defaults to deriving names from the input)
    pub out_file: Option<PathBuf>,

    /// Integer scale factor
    #[arg(long, default_value = "2")]
    pub scale: u32,

    /// Split into this many equal-width frames before upscaling
    #[arg(long, value_name = "N")]
    pub split: Option<u32>,
}

pub fn run(args: ScaleArgs, printer: &Printer) -> Result<()> {
    let dest = args.out_file.unwrap_or_else(|| args.in_file.clone());
    let op = match args.split {
        Some(split) => BatchOp::SplitUpscale {
            split,
            scale: args.scale,
        },
        None => BatchOp::Upscale { scale: args.scale },
    };
    let item = BatchItem {
        source: args.in_file,
        dest,
        op,
    };

    printer.status("Scaling", &display_path(&item.source));
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
    fn test_scale_default_factor() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("icon.png");
        let dest = dir.path().join("scaled.png");
        write_png(&PixelBuffer::from_pixel(4, 4, [3, 3, 3, 255]), &source).unwrap();

        let args = ScaleArgs {
            in_file: source,
            out_file: Some(dest.clone()),
            scale: 2,
            split: None,
        };
        run(args, &Printer::new()).unwrap();

        let out = crate::decode::decode_png(&dest).unwrap();
        assert_eq!((out.width(), out.height()), (8, 8));
    }

    #[test]
    fn test_scale_with_split_numbers_outputs() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("strip.png");
        write_png(&PixelBuffer::from_pixel(8, 2, [4, 4, 4, 255]), &source).unwrap();

        let args = ScaleArgs {
            in_file: source,
            out_file: Some(dir.path().join("frame.png")),
            scale: 3,
            split: Some(2),
        };
        run(args, &Printer::new()).unwrap();

        for i in 0..2 {
            let path = dir.path().join(format!("frame_{}.png", i));
            let out = crate::decode::decode_png(&path).unwrap();
            assert_eq!((out.width(), out.height()), (12, 6));
        }
    }

    #[test]
    fn test_scale_uneven_split_fails() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("strip.png");
        write_png(&PixelBuffer::from_pixel(7, 2, [0, 0, 0, 255]), &source).unwrap();

        let args = ScaleArgs {
            in_file: source,
            out_file: None,
            scale: 2,
            split: Some(3),
        };
        assert!(run(args, &Printer::new()).is_err());
    }
}
