//! Seam for the external metadata consumer.
//!
//! After classification every element is handed to a collector which may pull
//! additional structured fields (opening hours, cuisine, stars, ...) out of
//! the not-yet-consumed tags, using the same convention as the rest of the
//! pipeline: clear a tag's key and value on use.

use crate::element::Element;
use crate::features::params::FeatureParams;

pub trait MetadataCollector {
    fn collect(&self, element: &mut Element, params: &mut FeatureParams);
}

/// Collects nothing.
pub struct NoMetadata;

impl MetadataCollector for NoMetadata {
    fn collect(&self, _element: &mut Element, _params: &mut FeatureParams) {}
}

impl<F: Fn(&mut Element, &mut FeatureParams)> MetadataCollector for F {
    fn collect(&self, element: &mut Element, params: &mut FeatureParams) {
        self(element, params);
    }
}
