//! The transform engine.
//!
//! Pure functions from pixel buffers to pixel buffers. Nothing in this
//! module touches the filesystem or knows about source formats; decoding
//! and encoding live in `decode` and `sink`.

mod flatten;
mod repack;
mod scale;
mod tile;

pub use flatten::{flatten, flatten_filtered};
pub use repack::{repack, FrameLayout};
pub use scale::{split_upscale, upscale};
pub use tile::tile;
