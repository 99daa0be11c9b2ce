//! Flatten command implementation.

use std::path::PathBuf;

use clap::Args;

use crate::error::Result;
use crate::output::{display_path, Printer};
use crate::pipeline::{run_item, BatchItem, BatchOp};
use crate::types::LayerFilter;

/// Flatten a layered document into a single PNG
#[derive(Args, Debug)]
pub struct FlattenArgs {
    /// Source document (.pdn) or image (.png)
    pub in_file: PathBuf,

    /// Output path (defaults to the input name with a .png extension)
    pub out_file: Option<PathBuf>,

    /// Layer names to exclude, case-insensitive (repeatable)
    #[arg(long = "exclude", value_name = "NAME")]
    pub exclude: Vec<String>,
}

pub fn run(args: FlattenArgs, printer: &Printer) -> Result<()> {
    let dest = args.out_file.unwrap_or_else(|| args.in_file.clone());
    let item = BatchItem {
        source: args.in_file,
        dest,
        op: BatchOp::Flatten {
            filter: LayerFilter::excluding(&args.exclude),
        },
    };

    printer.status("Flattening", &display_path(&item.source));
    let outputs = run_item(&item)?;
    for path in &outputs {
        printer.info("Wrote", &display_path(path));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::write_png;
    use crate::types::PixelBuffer;
    use tempfile::tempdir;

    #[test]
    fn test_flatten_png_passthrough_to_new_path() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("flat.png");
        let dest = dir.path().join("copy.png");

        let buffer = PixelBuffer::from_pixel(2, 2, [1, 2, 3, 255]);
        write_png(&buffer, &source).unwrap();

        let args = FlattenArgs {
            in_file: source,
            out_file: Some(dest.clone()),
            exclude: vec!["background".to_string()],
        };
        run(args, &Printer::new()).unwrap();

        assert_eq!(crate::decode::decode_png(&dest).unwrap(), buffer);
    }

    #[test]
    fn test_flatten_missing_source_fails() {
        let dir = tempdir().unwrap();
        let args = FlattenArgs {
            in_file: dir.path().join("absent.pdn"),
            out_file: None,
            exclude: vec![],
        };
        assert!(run(args, &Printer::new()).is_err());
    }
}
