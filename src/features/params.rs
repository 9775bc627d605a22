//! The per-element output accumulator.

use linear_map::LinearMap;
use serde::Serialize;
use smallvec::SmallVec;

/// Layers are clamped into `-MAX_LAYER..=MAX_LAYER`.
pub const MAX_LAYER: i8 = 10;

/// Everything the pipeline extracts from one element.
///
/// Created empty per element, populated across the whole pipeline and
/// finalized exactly once by [`FeatureParams::finish`]. Never shared across
/// elements.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct FeatureParams {
    types: SmallVec<[u32; 16]>,

    /// Language code -> normalized name, in extraction order.
    pub names: LinearMap<String, String>,

    pub house_name: String,
    pub house_number: String,
    pub street: String,
    pub flats: String,

    /// Population-derived rank.
    pub rank: u8,

    /// Road number or similar reference.
    pub reference: String,

    pub layer: i8,

    /// The element's geometry should be walked back to front.
    pub reverse_geometry: bool,
}

impl FeatureParams {
    pub fn add_type(&mut self, packed: u32) {
        self.types.push(packed);
    }

    /// Remove a type by exact match. Returns whether it was present.
    pub fn pop_exact_type(&mut self, packed: u32) -> bool {
        match self.types.iter().position(|&t| t == packed) {
            Some(index) => {
                self.types.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn types(&self) -> &[u32] {
        &self.types
    }

    pub fn types_mut(&mut self) -> &mut [u32] {
        &mut self.types
    }

    pub fn has_name(&self, lang: &str) -> bool {
        self.names.contains_key(lang)
    }

    pub fn add_name(&mut self, lang: String, name: String) {
        self.names.insert(lang, name);
    }

    pub fn add_house_name(&mut self, name: String) {
        self.house_name = name;
    }

    /// Store a house number, or report `false` if the value doesn't look like
    /// one (the caller redirects those to the house name).
    pub fn add_house_number(&mut self, number: String) -> bool {
        if number.trim().starts_with(|c: char| c.is_ascii_digit()) {
            self.house_number = number;
            true
        } else {
            false
        }
    }

    pub fn has_house(&self) -> bool {
        !self.house_number.is_empty() || !self.house_name.is_empty()
    }

    /// Collapse the accumulated types into their canonical form. Idempotent.
    pub fn finish(&mut self) {
        self.types.sort_unstable();
        self.types.dedup();
    }
}
