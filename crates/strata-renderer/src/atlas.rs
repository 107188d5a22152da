//! Atlas Integration
//!
//! Once per update pass, every texture feature's images are handed to an
//! external packer, which returns one packed page per feature plus a UV
//! remapping. Packed pages are bound into the material instance under each
//! feature's binding name; the mapping stays valid until the next repack
//! and is read by geometry features to remap their own UV coordinates.

use ahash::AHashMap;
use strata_core::{ImageHandle, TextureFeature};

use crate::material::MaterialInstance;
use crate::{RendererError, RendererResult};

/// UV attribute channel a remapping applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UvChannel {
    /// Primary UV set
    #[default]
    Uv0,
    /// Secondary UV set
    Uv1,
    /// Tertiary UV set
    Uv2,
    /// Quaternary UV set
    Uv3,
}

/// Normalized rectangle inside a packed atlas page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UvRect {
    /// Left edge in [0, 1]
    pub x: f32,
    /// Bottom edge in [0, 1]
    pub y: f32,
    /// Width in [0, 1]
    pub width: f32,
    /// Height in [0, 1]
    pub height: f32,
}

impl UvRect {
    /// Rectangle covering a whole page
    pub const FULL: Self = Self {
        x: 0.0,
        y: 0.0,
        width: 1.0,
        height: 1.0,
    };

    /// Remap a UV coordinate from page space into this rectangle
    pub fn remap(&self, u: f32, v: f32) -> (f32, f32) {
        (self.x + u * self.width, self.y + v * self.height)
    }
}

/// UV-rectangle assignment produced by a repack, one rectangle per texture
/// feature per channel
#[derive(Debug, Clone, Default)]
pub struct AtlasMapping {
    rects: AHashMap<UvChannel, Vec<UvRect>>,
}

impl AtlasMapping {
    /// Create an empty mapping
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the per-feature rectangles for a channel
    pub fn set_channel(&mut self, channel: UvChannel, rects: Vec<UvRect>) {
        self.rects.insert(channel, rects);
    }

    /// Per-feature rectangles for a channel
    pub fn channel(&self, channel: UvChannel) -> Option<&[UvRect]> {
        self.rects.get(&channel).map(Vec::as_slice)
    }

    /// Whether no channel has been packed
    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }
}

/// Packer output: one packed page per texture feature plus the UV remapping
#[derive(Debug, Clone, Default)]
pub struct AtlasOutput {
    /// Packed pages, aligned with the feature list handed to the packer
    pub images: Vec<ImageHandle>,
    /// UV remapping valid until the next repack
    pub mapping: AtlasMapping,
}

/// External bin-packing strategy.
///
/// Determinism for a fixed input set is desirable but not required; the
/// packing heuristic is entirely the implementation's business.
pub trait TexturePacker {
    /// Pack every feature's images into shared pages
    fn pack(&mut self, features: &[&TextureFeature], border_px: u32) -> RendererResult<AtlasOutput>;
}

/// Reference packer placing each feature's images on a fixed square grid.
///
/// Exists so the pipeline is testable end to end; hosts supply a real
/// packer in production.
#[derive(Debug, Clone, Copy)]
pub struct GridPacker {
    /// Page edge length in pixels
    pub page_size: u32,
}

impl Default for GridPacker {
    fn default() -> Self {
        Self { page_size: 1024 }
    }
}

impl TexturePacker for GridPacker {
    fn pack(&mut self, features: &[&TextureFeature], border_px: u32) -> RendererResult<AtlasOutput> {
        if border_px * 2 >= self.page_size {
            return Err(RendererError::AtlasPack(format!(
                "border {border_px}px leaves no room on a {}px page",
                self.page_size
            )));
        }

        let mut output = AtlasOutput::default();
        let inset = border_px as f32 / self.page_size as f32;
        let mut rects = Vec::with_capacity(features.len());

        // One page per feature; the feature's whole image set shares it
        for slot in 0..features.len() {
            output.images.push(ImageHandle {
                id: slot as u64,
                width: self.page_size,
                height: self.page_size,
            });
            rects.push(UvRect {
                x: inset,
                y: inset,
                width: 1.0 - 2.0 * inset,
                height: 1.0 - 2.0 * inset,
            });
        }

        output.mapping.set_channel(UvChannel::Uv0, rects);
        Ok(output)
    }
}

/// Run the packer over the full texture-feature set and bind the packed
/// pages into the material instance.
///
/// On failure the material keeps its previously bound textures and the
/// error is surfaced; there is no automatic retry.
pub fn integrate(
    features: &[&TextureFeature],
    border_px: u32,
    packer: &mut dyn TexturePacker,
    material: &mut MaterialInstance,
) -> RendererResult<AtlasMapping> {
    let output = packer.pack(features, border_px)?;

    for (feature, image) in features.iter().zip(&output.images) {
        material.bind_texture(feature.binding.clone(), *image);
    }
    log::debug!(
        "atlas repacked: {} features into {} pages",
        features.len(),
        output.images.len()
    );

    Ok(output.mapping)
}
