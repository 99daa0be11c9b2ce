//! Core data types for the conversion pipeline.

mod buffer;
mod document;

pub use buffer::{PixelBuffer, CHANNELS};
pub use document::{Layer, LayerFilter, LayeredDocument};
