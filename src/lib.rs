//! pxbake - layered pixel-art document baker
//!
//! A library and CLI for converting layered paint.net documents and flat
//! PNGs into the assets a game loads: flattened sprites, tiled
//! backgrounds, and integer-upscaled UI frames.

pub mod cli;
pub mod decode;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod sink;
pub mod transform;
pub mod types;

pub use decode::{decode, decode_flat, decode_pdn, decode_png, Decoded};
pub use error::{BakeError, Result};
pub use pipeline::{
    plan, run_batch, run_item, BatchItem, BatchOp, BatchReport, Manifest, RunOptions,
};
pub use sink::write_png;
pub use transform::{flatten, flatten_filtered, repack, split_upscale, tile, upscale, FrameLayout};
pub use types::{Layer, LayerFilter, LayeredDocument, PixelBuffer};
