//! # Strata Core
//!
//! Core data model for the Strata dynamic layout renderer.
//!
//! This crate provides the pieces the baking pipeline reads but never owns:
//! - **Elements**: positionable layout units, addressed purely by index
//! - **Features**: pluggable per-element contributors (geometry, texture)
//! - **Topology Cache**: memoized immutable geometry data per source asset
//! - **Layout Spaces**: swappable strategies placing elements in the world

pub mod element;
pub mod feature;
pub mod space;
pub mod topology;

pub use element::{Anchor, Element};
pub use feature::{
    Feature, FeatureKinds, FeatureSet, GeometryData, GeometryFeature, ImageHandle, TextureData,
    TextureFeature,
};
pub use space::{CylindricalSpace, LayoutSpace, RectSpace, SpaceParams};
pub use topology::{AssetId, Topology, TopologyCache, TopologyError};

/// Layout container: the ordered element list plus the feature registry.
///
/// Every feature's per-element data is kept the same length as the element
/// list; [`Layout::sync_feature_data`] restores that invariant after
/// elements are added or removed.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    /// Elements in index order
    pub elements: Vec<Element>,
    /// Features in fixed bake order
    pub features: FeatureSet,
}

impl Layout {
    /// Create an empty layout
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of elements
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Resize every feature's per-element data to match the element count.
    ///
    /// Excess records are truncated; missing records are filled with
    /// defaults (no asset, white override, no image).
    pub fn sync_feature_data(&mut self) {
        let count = self.elements.len();
        let mut resynced = 0usize;
        for feature in self.features.features_mut() {
            if feature.len() != count {
                resynced += 1;
            }
            match feature {
                Feature::Geometry(g) => g.data.resize(count, GeometryData::default()),
                Feature::Texture(t) => t.data.resize(count, TextureData::default()),
            }
        }
        if resynced > 0 {
            log::debug!("resynced {resynced} feature data arrays to {count} elements");
        }
    }
}
