//! Output naming convention.
//!
//! A layered source producing N outputs gets individually numbered
//! destinations: strip a trailing `.pdn`, append `_{index}` to the stem,
//! force the extension to `.png`. `sheet.pdn` with three layers becomes
//! `sheet_0.png`, `sheet_1.png`, `sheet_2.png`.

use std::path::{Path, PathBuf};

/// Derive the numbered destination for output `index`.
pub fn numbered_output(dest: &Path, index: usize) -> PathBuf {
    let base = strip_pdn(dest);
    let stem = base
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    base.with_file_name(format!("{}_{}.png", stem, index))
}

/// Derive the single-output destination: the path with a `.png` extension.
pub fn single_output(dest: &Path) -> PathBuf {
    strip_pdn(dest).with_extension("png")
}

fn strip_pdn(dest: &Path) -> PathBuf {
    let is_pdn = dest
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdn"));
    if is_pdn {
        dest.with_extension("")
    } else {
        dest.to_path_buf()
    }
}
