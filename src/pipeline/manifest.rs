//! Project manifest (pxbake.yaml) parsing.
//!
//! The manifest defines the batch: where layered sources live, where
//! baked assets go, the static conversion items, and the UI directory
//! scanned for upscaling.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{BakeError, Result};
use crate::transform::FrameLayout;

/// The name of the manifest file.
pub const MANIFEST_FILENAME: &str = "pxbake.yaml";

/// Project manifest loaded from pxbake.yaml.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Manifest {
    /// Directory holding layered source documents.
    pub source_root: PathBuf,

    /// Directory baked assets are written under.
    pub output_root: PathBuf,

    /// Layer names excluded when flattening (case-insensitive), unless an
    /// item overrides them.
    pub exclude: Vec<String>,

    /// Static conversion items.
    pub items: Vec<ManifestItem>,

    /// UI asset scan configuration.
    pub ui: Option<UiConfig>,
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            source_root: PathBuf::from("assets-pdn"),
            output_root: PathBuf::from("assets"),
            exclude: vec!["background".to_string()],
            items: vec![],
            ui: None,
        }
    }
}

/// One static conversion: a source document and its destination.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestItem {
    pub source: PathBuf,
    pub dest: PathBuf,

    /// Conversion to apply; flatten when omitted.
    #[serde(default)]
    pub op: Option<OpSpec>,

    /// Per-item flatten exclusions, overriding the manifest default.
    #[serde(default)]
    pub exclude: Option<Vec<String>>,
}

/// Conversion selector for manifest items.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub enum OpSpec {
    Flatten,
    Tile { w: u32, h: u32 },
    Upscale { scale: u32 },
    SplitUpscale { split: u32, scale: u32 },
    Repack(FrameLayout),
}

/// Scan settings for the UI asset directory.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UiConfig {
    /// Directory under `source_root` holding UI strips.
    pub dir: PathBuf,

    /// Upscale factor applied to every scanned asset.
    pub scale: u32,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("ui"),
            scale: 2,
        }
    }
}

impl Manifest {
    /// Load a manifest from a pxbake.yaml file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| BakeError::Io {
            path: path.to_path_buf(),
            message: format!("Failed to read manifest: {}", e),
        })?;

        Self::parse(&content)
    }

    /// Parse a manifest from a YAML string.
    pub fn parse(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| BakeError::Parse {
            message: format!("Invalid manifest: {}", e),
            help: Some("Check pxbake.yaml syntax".to_string()),
        })
    }
}
