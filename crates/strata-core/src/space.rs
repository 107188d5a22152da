//! Layout Spaces
//!
//! A layout space converts an element's logical position into a world
//! position and enough orientation information to build a rotation. The
//! baking pipeline treats spaces as opaque strategies: flat and curved
//! spaces are swappable without touching the bakers.

use glam::Vec3;

use crate::element::{Anchor, Element};

/// Orientation parameters produced by a layout-space query
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SpaceParams {
    /// Rotation around the layout's vertical axis, in radians
    pub angle_offset: f32,
}

/// Strategy converting logical element positions into world placement
pub trait LayoutSpace {
    /// Placement parameters for an element at the given world position
    fn parameters(&self, anchor: Anchor, world_position: Vec3) -> SpaceParams;

    /// Transform a layout-local point into world space
    fn transform_point(&self, element: &Element, local: Vec3) -> Vec3;
}

/// Flat layout space: local coordinates are world coordinates
#[derive(Debug, Clone, Copy, Default)]
pub struct RectSpace;

impl LayoutSpace for RectSpace {
    fn parameters(&self, _anchor: Anchor, _world_position: Vec3) -> SpaceParams {
        SpaceParams::default()
    }

    fn transform_point(&self, _element: &Element, local: Vec3) -> Vec3 {
        local
    }
}

/// Cylindrical layout space: the local X axis wraps around a vertical
/// cylinder of the given radius, so elements far from center face inward.
#[derive(Debug, Clone, Copy)]
pub struct CylindricalSpace {
    /// Cylinder radius in world units
    pub radius: f32,
}

impl CylindricalSpace {
    /// Create a cylindrical space with the given radius
    pub fn new(radius: f32) -> Self {
        Self { radius }
    }

    fn wrap(&self, local: Vec3) -> (Vec3, f32) {
        let theta = local.x / self.radius;
        // Depth offsets push the point along the cylinder normal
        let r = self.radius + local.z;
        let world = Vec3::new(theta.sin() * r, local.y, theta.cos() * r - self.radius);
        (world, theta)
    }
}

impl LayoutSpace for CylindricalSpace {
    fn parameters(&self, anchor: Anchor, _world_position: Vec3) -> SpaceParams {
        SpaceParams {
            angle_offset: anchor.position.x / self.radius,
        }
    }

    fn transform_point(&self, _element: &Element, local: Vec3) -> Vec3 {
        self.wrap(local).0
    }
}
