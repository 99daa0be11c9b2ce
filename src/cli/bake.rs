//! Bake command implementation.
//!
//! Loads the project manifest, expands it into a batch, and runs every
//! item in sequence. With `--watch`, the source tree is monitored and the
//! batch re-runs whenever a document or image changes.

use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

use clap::Args;
use notify::{RecursiveMode, Watcher};

use crate::error::{BakeError, Result};
use crate::output::{display_path, plural, Printer};
use crate::pipeline::{plan, run_batch, Manifest, RunOptions, MANIFEST_FILENAME};

/// Run the batch described by pxbake.yaml
#[derive(Args, Debug)]
pub struct BakeArgs {
    /// Project directory containing pxbake.yaml
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Manifest file (defaults to pxbake.yaml in the project directory)
    #[arg(long)]
    pub manifest: Option<PathBuf>,

    /// Keep processing after an item fails
    #[arg(long)]
    pub keep_going: bool,

    /// Watch the source directory and re-run on changes
    #[arg(long)]
    pub watch: bool,
}

pub fn run(args: BakeArgs, printer: &Printer) -> Result<()> {
    let manifest_path = args
        .manifest
        .clone()
        .unwrap_or_else(|| args.path.join(MANIFEST_FILENAME));

    if !manifest_path.exists() {
        return Err(BakeError::Parse {
            message: format!("{} not found", display_path(&manifest_path)),
            help: Some(format!(
                "Create a {} describing the batch, or pass --manifest",
                MANIFEST_FILENAME
            )),
        });
    }

    run_once(&args, &manifest_path, printer)?;

    if args.watch {
        watch(&args, &manifest_path, printer)?;
    }

    Ok(())
}

fn run_once(args: &BakeArgs, manifest_path: &Path, printer: &Printer) -> Result<()> {
    let manifest = Manifest::load(manifest_path)?;
    let items = plan(&manifest, &args.path);

    if items.is_empty() {
        printer.warning("Warning", "manifest produced no batch items");
        return Ok(());
    }

    let options = RunOptions {
        fail_fast: !args.keep_going,
    };
    let report = run_batch(&items, options, printer)?;

    if !report.failures.is_empty() {
        return Err(BakeError::Batch {
            message: format!(
                "{} of {} failed",
                plural(report.failures.len(), "item", "items"),
                items.len()
            ),
        });
    }

    Ok(())
}

/// Block on filesystem events, re-running the batch after each burst of
/// changes to source documents or images.
fn watch(args: &BakeArgs, manifest_path: &Path, printer: &Printer) -> Result<()> {
    let manifest = Manifest::load(manifest_path)?;
    let source_root = args.path.join(&manifest.source_root);

    let (tx, rx) = mpsc::channel();
    let mut watcher = notify::recommended_watcher(tx).map_err(|e| BakeError::Io {
        path: source_root.clone(),
        message: format!("failed to start watcher: {}", e),
    })?;
    watcher
        .watch(&source_root, RecursiveMode::Recursive)
        .map_err(|e| BakeError::Io {
            path: source_root.clone(),
            message: format!("failed to watch directory: {}", e),
        })?;

    printer.info("Watching", &display_path(&source_root));

    loop {
        let event = match rx.recv() {
            Ok(event) => event,
            Err(_) => break,
        };
        let mut relevant = is_source_event(&event);

        // Editors fire bursts of events per save; settle before re-running.
        while let Ok(extra) = rx.recv_timeout(Duration::from_millis(200)) {
            relevant |= is_source_event(&extra);
        }
        if !relevant {
            continue;
        }

        if let Err(e) = run_once(args, manifest_path, printer) {
            printer.error("Error", &e.to_string());
        }
    }

    Ok(())
}

fn is_source_event(event: &std::result::Result<notify::Event, notify::Error>) -> bool {
    match event {
        Ok(event) => event.paths.iter().any(|p| {
            matches!(
                p.extension().and_then(|e| e.to_str()),
                Some("pdn") | Some("png")
            )
        }),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::write_png;
    use crate::types::PixelBuffer;
    use std::fs;
    use tempfile::tempdir;

    fn write_source(path: &Path, w: u32, h: u32) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        write_png(&PixelBuffer::from_pixel(w, h, [7, 7, 7, 255]), path).unwrap();
    }

    #[test]
    fn test_bake_missing_manifest() {
        let dir = tempdir().unwrap();
        let args = BakeArgs {
            path: dir.path().to_path_buf(),
            manifest: None,
            keep_going: false,
            watch: false,
        };
        assert!(matches!(
            run(args, &Printer::new()).unwrap_err(),
            BakeError::Parse { .. }
        ));
    }

    #[test]
    fn test_bake_ui_scan_end_to_end() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(MANIFEST_FILENAME),
            "source_root: art\noutput_root: baked\nui:\n  dir: ui\n  scale: 2\n",
        )
        .unwrap();

        write_source(&dir.path().join("art/ui/cursor.png"), 4, 4);
        write_source(&dir.path().join("art/ui/split-2-slots.png"), 8, 4);

        let args = BakeArgs {
            path: dir.path().to_path_buf(),
            manifest: None,
            keep_going: false,
            watch: false,
        };
        run(args, &Printer::new()).unwrap();

        let cursor = crate::decode::decode_png(&dir.path().join("baked/ui/cursor.png")).unwrap();
        assert_eq!((cursor.width(), cursor.height()), (8, 8));

        for i in 0..2 {
            let frame =
                crate::decode::decode_png(&dir.path().join(format!("baked/ui/slots_{}.png", i)))
                    .unwrap();
            assert_eq!((frame.width(), frame.height()), (8, 8));
        }
    }

    #[test]
    fn test_bake_static_items_with_ops() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(MANIFEST_FILENAME),
            r#"
source_root: art
output_root: baked
items:
  - source: floor.png
    dest: floor.png
    op: !tile
      w: 2
      h: 2
"#,
        )
        .unwrap();
        write_source(&dir.path().join("art/floor.png"), 3, 3);

        let args = BakeArgs {
            path: dir.path().to_path_buf(),
            manifest: None,
            keep_going: false,
            watch: false,
        };
        run(args, &Printer::new()).unwrap();

        let out = crate::decode::decode_png(&dir.path().join("baked/floor.png")).unwrap();
        assert_eq!((out.width(), out.height()), (6, 6));
    }

    #[test]
    fn test_bake_keep_going_reports_failures() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(MANIFEST_FILENAME),
            r#"
source_root: art
output_root: baked
items:
  - source: missing.png
    dest: missing.png
    op: !upscale
      scale: 2
  - source: ok.png
    dest: ok.png
    op: !upscale
      scale: 2
"#,
        )
        .unwrap();
        write_source(&dir.path().join("art/ok.png"), 2, 2);

        let args = BakeArgs {
            path: dir.path().to_path_buf(),
            manifest: None,
            keep_going: true,
            watch: false,
        };
        let err = run(args, &Printer::new()).unwrap_err();
        assert!(matches!(err, BakeError::Batch { .. }));

        // the good item still baked
        assert!(dir.path().join("baked/ok.png").exists());
    }

    #[test]
    fn test_is_source_event_filters_extensions() {
        let event = notify::Event::new(notify::EventKind::Any)
            .add_path(PathBuf::from("/art/player.pdn"));
        assert!(is_source_event(&Ok(event)));

        let event =
            notify::Event::new(notify::EventKind::Any).add_path(PathBuf::from("/art/notes.txt"));
        assert!(!is_source_event(&Ok(event)));
    }
}
