//! Layout Elements
//!
//! An element is one positionable unit of the rendered layout. Elements are
//! correlated purely positionally with per-feature data arrays: element `i`
//! reads record `i` of every feature.

use glam::Vec3;

/// Anchoring point used by layout-space queries
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Anchor {
    /// Anchor position in layout-local space
    pub position: Vec3,
}

impl Anchor {
    /// Create an anchor at the given layout-local position
    pub fn at(position: Vec3) -> Self {
        Self { position }
    }
}

/// One positionable unit of the layout
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Element {
    /// Anchor this element is attached to
    pub anchor: Anchor,
    /// Current position in layout-local space
    pub local_position: Vec3,
}

impl Element {
    /// Create an element anchored at its own position
    pub fn at(position: Vec3) -> Self {
        Self {
            anchor: Anchor::at(position),
            local_position: position,
        }
    }

    /// Create an element with a distinct anchor
    pub fn new(anchor: Anchor, local_position: Vec3) -> Self {
        Self {
            anchor,
            local_position,
        }
    }
}
