//! Topology Cache
//!
//! Immutable cached geometry data for source assets: vertex positions,
//! triangle indices, and an optional authored per-vertex color stream.

use std::sync::Arc;

use ahash::AHashMap;
use glam::{Vec3, Vec4};
use parking_lot::RwLock;
use thiserror::Error;

/// Topology construction errors
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopologyError {
    #[error("color stream length {colors} does not match position stream length {positions}")]
    ColorStreamMismatch { colors: usize, positions: usize },

    #[error("index {index} references past {vertices} vertices")]
    IndexOutOfRange { index: u32, vertices: usize },
}

/// Content-addressed geometry asset ID (hash-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AssetId(pub u64);

impl AssetId {
    /// Create an asset ID from a hash
    pub fn from_hash(hash: u64) -> Self {
        Self(hash)
    }

    /// Create an asset ID from content bytes
    pub fn from_content(content: &[u8]) -> Self {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        content.hash(&mut hasher);
        Self(hasher.finish())
    }

    /// Get the raw ID value
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Immutable geometry data for one source asset.
///
/// Indices are local to this asset and start at 0. The color stream, when
/// present, is aligned 1:1 with the position stream.
#[derive(Debug, Clone, PartialEq)]
pub struct Topology {
    /// Vertex positions
    pub positions: Vec<Vec3>,
    /// Triangle indices (local, three per triangle)
    pub indices: Vec<u32>,
    /// Authored per-vertex colors, absent for untinted geometry
    pub colors: Option<Vec<Vec4>>,
}

impl Topology {
    /// Create a topology, validating stream alignment.
    ///
    /// Fails if a color stream is present but its length does not match the
    /// position stream, or if any index references a vertex past the end of
    /// the position stream.
    pub fn new(
        positions: Vec<Vec3>,
        indices: Vec<u32>,
        colors: Option<Vec<Vec4>>,
    ) -> Result<Self, TopologyError> {
        if let Some(colors) = &colors {
            if colors.len() != positions.len() {
                return Err(TopologyError::ColorStreamMismatch {
                    colors: colors.len(),
                    positions: positions.len(),
                });
            }
        }
        if let Some(&index) = indices.iter().find(|&&i| i as usize >= positions.len()) {
            return Err(TopologyError::IndexOutOfRange {
                index,
                vertices: positions.len(),
            });
        }
        Ok(Self {
            positions,
            indices,
            colors,
        })
    }

    /// Vertex count
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Triangle count
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Unit quad on the XY plane, centered at origin, two triangles
    pub fn quad() -> Self {
        Self {
            positions: vec![
                Vec3::new(-0.5, -0.5, 0.0),
                Vec3::new(0.5, -0.5, 0.0),
                Vec3::new(0.5, 0.5, 0.0),
                Vec3::new(-0.5, 0.5, 0.0),
            ],
            indices: vec![0, 1, 2, 0, 2, 3],
            colors: None,
        }
    }

    /// Regular n-gon fan on the XY plane with unit diameter
    pub fn ngon(sides: u32) -> Self {
        let sides = sides.max(3);
        let mut positions = Vec::with_capacity(sides as usize + 1);
        let mut indices = Vec::with_capacity(sides as usize * 3);

        positions.push(Vec3::ZERO);
        let step = std::f32::consts::TAU / sides as f32;
        for i in 0..sides {
            let angle = i as f32 * step;
            positions.push(Vec3::new(angle.cos() * 0.5, angle.sin() * 0.5, 0.0));
        }

        for i in 0..sides {
            let next = 1 + (i + 1) % sides;
            indices.extend_from_slice(&[0, 1 + i, next]);
        }

        Self {
            positions,
            indices,
            colors: None,
        }
    }
}

/// Memoized topology lookup keyed by asset identity.
///
/// Returns identical data across calls for the same asset until the asset
/// is re-registered or removed.
pub struct TopologyCache {
    entries: RwLock<AHashMap<AssetId, Arc<Topology>>>,
}

impl TopologyCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(AHashMap::new()),
        }
    }

    /// Register a topology under the given asset ID, replacing any prior entry
    pub fn insert(&self, id: AssetId, topology: Topology) {
        self.entries.write().insert(id, Arc::new(topology));
    }

    /// Resolve the cached topology for an asset.
    ///
    /// `None` means the asset failed to resolve; callers treat that
    /// contribution as empty rather than failing the pass.
    pub fn get(&self, id: AssetId) -> Option<Arc<Topology>> {
        self.entries.read().get(&id).cloned()
    }

    /// Drop a cached entry
    pub fn remove(&self, id: AssetId) -> bool {
        self.entries.write().remove(&id).is_some()
    }

    /// Number of cached assets
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the cache holds no assets
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Clear all entries
    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

impl Default for TopologyCache {
    fn default() -> Self {
        Self::new()
    }
}
