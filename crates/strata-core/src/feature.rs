//! Feature Model
//!
//! Features are pluggable per-element data contributors. A feature owns an
//! ordered sequence of per-element records, indexed identically to the
//! element list. The set of feature kinds is closed: geometry features
//! contribute mesh data, texture features contribute images for atlasing.
//! Renderers query capabilities once per pass instead of dispatching
//! dynamically per call.

use bitflags::bitflags;
use glam::Vec4;
use smallvec::SmallVec;

use crate::topology::AssetId;

bitflags! {
    /// Capabilities contributed by a feature
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FeatureKinds: u8 {
        /// Contributes vertex/index geometry
        const GEOMETRY = 1 << 0;
        /// Contributes a texture for atlasing
        const TEXTURE = 1 << 1;
    }
}

/// Per-element record of a geometry feature
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometryData {
    /// Source geometry asset; `None` contributes nothing for this element
    pub asset: Option<AssetId>,
    /// Per-element override color, multiplied into the feature tint
    pub color: Vec4,
}

impl Default for GeometryData {
    fn default() -> Self {
        Self {
            asset: None,
            color: Vec4::ONE,
        }
    }
}

impl GeometryData {
    /// Record referencing an asset with the default (white) override color
    pub fn asset(id: AssetId) -> Self {
        Self {
            asset: Some(id),
            color: Vec4::ONE,
        }
    }

    /// Record referencing an asset with an override color
    pub fn tinted(id: AssetId, color: Vec4) -> Self {
        Self {
            asset: Some(id),
            color,
        }
    }
}

/// Geometry-contributing feature
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryFeature {
    /// Uniform tint applied to every element's contribution
    pub tint: Vec4,
    /// Whether this feature participates in per-vertex color baking
    pub vertex_colors: bool,
    /// Per-element records, aligned with the element list
    pub data: Vec<GeometryData>,
}

impl GeometryFeature {
    /// Create a feature with a white tint and no color participation
    pub fn new() -> Self {
        Self {
            tint: Vec4::ONE,
            vertex_colors: false,
            data: Vec::new(),
        }
    }

    /// Set the uniform tint
    pub fn with_tint(mut self, tint: Vec4) -> Self {
        self.tint = tint;
        self
    }

    /// Enable per-vertex color baking
    pub fn with_vertex_colors(mut self) -> Self {
        self.vertex_colors = true;
        self
    }
}

impl Default for GeometryFeature {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to a host-side image consumed by the atlas packer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageHandle {
    /// Host image identity
    pub id: u64,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

/// Per-element record of a texture feature
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextureData {
    /// Source image; `None` contributes nothing for this element
    pub image: Option<ImageHandle>,
}

/// Texture-contributing feature
#[derive(Debug, Clone, PartialEq)]
pub struct TextureFeature {
    /// Material binding name the packed atlas page is bound under
    pub binding: String,
    /// Per-element records, aligned with the element list
    pub data: Vec<TextureData>,
}

impl TextureFeature {
    /// Create a texture feature bound under the given name
    pub fn new(binding: impl Into<String>) -> Self {
        Self {
            binding: binding.into(),
            data: Vec::new(),
        }
    }
}

/// A pluggable per-element data contributor
#[derive(Debug, Clone, PartialEq)]
pub enum Feature {
    /// Contributes mesh geometry and optionally per-vertex colors
    Geometry(GeometryFeature),
    /// Contributes an image packed into the shared atlas
    Texture(TextureFeature),
}

impl Feature {
    /// Capabilities of this feature
    pub fn kind(&self) -> FeatureKinds {
        match self {
            Self::Geometry(_) => FeatureKinds::GEOMETRY,
            Self::Texture(_) => FeatureKinds::TEXTURE,
        }
    }

    /// Number of per-element records this feature carries
    pub fn len(&self) -> usize {
        match self {
            Self::Geometry(f) => f.data.len(),
            Self::Texture(f) => f.data.len(),
        }
    }

    /// Whether this feature carries no per-element records
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Ordered per-pass feature registry.
///
/// Order is fixed and determines bake concatenation order: later geometry
/// features land later in each combined buffer's index stream.
#[derive(Debug, Clone, Default)]
pub struct FeatureSet {
    features: SmallVec<[Feature; 4]>,
}

impl FeatureSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self {
            features: SmallVec::new(),
        }
    }

    /// Append a feature, preserving insertion order
    pub fn push(&mut self, feature: Feature) {
        self.features.push(feature);
    }

    /// All features in order
    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    /// Mutable access to all features in order
    pub fn features_mut(&mut self) -> &mut [Feature] {
        &mut self.features
    }

    /// Geometry features in order
    pub fn geometry(&self) -> impl Iterator<Item = &GeometryFeature> {
        self.features.iter().filter_map(|f| match f {
            Feature::Geometry(g) => Some(g),
            _ => None,
        })
    }

    /// Texture features in order
    pub fn textures(&self) -> impl Iterator<Item = &TextureFeature> {
        self.features.iter().filter_map(|f| match f {
            Feature::Texture(t) => Some(t),
            _ => None,
        })
    }

    /// Union of all feature capabilities, computed once per pass
    pub fn capabilities(&self) -> FeatureKinds {
        self.features
            .iter()
            .fold(FeatureKinds::empty(), |acc, f| acc | f.kind())
    }

    /// Number of features
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}
