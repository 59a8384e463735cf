//! Character-code placeholder embedder.

// Code points mod 100 are exact in f32.
#![allow(clippy::cast_precision_loss)]

use super::{DEFAULT_DIMENSIONS, Embedder};
use crate::Result;

/// Maps each character's code point into successive vector slots.
///
/// Slot `i` holds `(code point of char i mod 100) / 100`, so every value is
/// in `[0, 1)`. Text shorter than the vector is zero-padded; longer text is
/// truncated. Similarity between these vectors reflects shared character
/// sequences, not meaning.
#[derive(Debug, Clone, Copy)]
pub struct CharCodeEmbedder {
    dimensions: usize,
}

impl CharCodeEmbedder {
    /// Creates an embedder with [`DEFAULT_DIMENSIONS`] slots.
    #[must_use]
    pub const fn new() -> Self {
        Self::with_dimensions(DEFAULT_DIMENSIONS)
    }

    /// Creates an embedder with a custom slot count.
    #[must_use]
    pub const fn with_dimensions(dimensions: usize) -> Self {
        Self { dimensions }
    }

    /// Embeds `text` without the `Result` wrapper.
    #[must_use]
    pub fn encode(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0; self.dimensions];
        for (slot, ch) in embedding.iter_mut().zip(text.chars()) {
            *slot = (u32::from(ch) % 100) as f32 / 100.0;
        }
        embedding
    }
}

impl Default for CharCodeEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

impl Embedder for CharCodeEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.encode(text))
    }
}
