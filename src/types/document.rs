//! Layered document model.
//!
//! A decoded layered source is an ordered list of named layers, bottom
//! layer first. Documents are decoded, consumed by one transform, and
//! discarded; nothing caches them across batch items.

use super::PixelBuffer;

/// One named layer of a layered document.
#[derive(Debug, Clone)]
pub struct Layer {
    pub name: String,
    pub visible: bool,
    /// Layer-wide opacity, 255 = fully opaque.
    pub opacity: u8,
    pub image: PixelBuffer,
}

impl Layer {
    /// An always-visible, fully opaque layer.
    pub fn new(name: impl Into<String>, image: PixelBuffer) -> Self {
        Self {
            name: name.into(),
            visible: true,
            opacity: 255,
            image,
        }
    }
}

/// An ordered stack of layers plus the document canvas size.
#[derive(Debug, Clone)]
pub struct LayeredDocument {
    pub width: u32,
    pub height: u32,
    pub layers: Vec<Layer>,
}

impl LayeredDocument {
    pub fn new(width: u32, height: u32, layers: Vec<Layer>) -> Self {
        Self {
            width,
            height,
            layers,
        }
    }
}

/// Case-insensitive layer-name exclusion rules.
#[derive(Debug, Clone, Default)]
pub struct LayerFilter {
    excluded: Vec<String>,
}

impl LayerFilter {
    /// A filter that excludes nothing.
    pub fn none() -> Self {
        Self::default()
    }

    /// Build a filter from exclusion names (matched case-insensitively).
    pub fn excluding<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            excluded: names
                .into_iter()
                .map(|n| n.as_ref().to_lowercase())
                .collect(),
        }
    }

    /// Whether a layer with this name is excluded.
    pub fn excludes(&self, name: &str) -> bool {
        let lowered = name.to_lowercase();
        self.excluded.iter().any(|e| *e == lowered)
    }

    pub fn is_empty(&self) -> bool {
        self.excluded.is_empty()
    }
}
