//! # Strata Renderer
//!
//! Baking pipeline for the Strata dynamic layout renderer.
//!
//! Every layout change runs one synchronous pass: the mesh pool is resized
//! to the element count, each element's geometry features are merged into
//! its combined buffer with rebased indices, per-vertex colors are baked
//! when any feature participates, and texture features are repacked into
//! the shared atlas. Every rendered frame then issues one draw call per
//! element through the host's [`DrawSink`].
//!
//! ## Components
//! - **Mesh Pool**: index-stable arena of combined buffers, one per element
//! - **Bakers**: vertex/index concatenation and tinted color streams
//! - **Atlas Integrator**: external packer contract and material rebinding
//! - **Render Dispatcher**: per-frame placement and draw submission

pub mod atlas;
pub mod bake;
pub mod dispatch;
pub mod material;
pub mod pool;

pub use atlas::{AtlasMapping, AtlasOutput, GridPacker, TexturePacker, UvChannel, UvRect};
pub use bake::BakeScratch;
pub use dispatch::{DispatchStats, DrawCall, DrawSink, MotionType};
pub use material::{MaterialInstance, ProgramId};
pub use pool::{BufferBacking, BufferUsage, CombinedBuffer, HeapBacking, MeshPool};

use smallvec::SmallVec;
use strata_core::{FeatureKinds, Layout, LayoutSpace, TextureFeature, TopologyCache};
use thiserror::Error;

/// Renderer errors
#[derive(Error, Debug)]
pub enum RendererError {
    #[error("combined buffer allocation failed: {0}")]
    PoolSync(String),

    #[error("atlas packing failed: {0}")]
    AtlasPack(String),

    #[error(
        "element {element}: color stream length {colors} does not match vertex stream length {vertices}"
    )]
    StreamLengthMismatch {
        element: usize,
        colors: usize,
        vertices: usize,
    },
}

/// Result type for renderer operations
pub type RendererResult<T> = Result<T, RendererError>;

/// Renderer configuration
#[derive(Debug, Clone, Copy)]
pub struct RendererConfig {
    /// How much of the layout space's placement is applied per element
    pub motion_type: MotionType,
    /// Padding between packed atlas entries, in pixels
    pub atlas_border_px: u32,
    /// Shader program the shared material binds
    pub program: ProgramId,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            motion_type: MotionType::Full,
            atlas_border_px: 1,
            program: ProgramId(0),
        }
    }
}

/// Renderer statistics for the most recent frame
#[derive(Debug, Clone, Copy, Default)]
pub struct RendererStats {
    /// Draw calls issued
    pub draw_calls: u32,
    /// Triangles submitted
    pub triangles: u32,
}

/// The dynamic layout renderer.
///
/// Owns the mesh pool and the shared material instance exclusively; both
/// are only read by consumers after a rebuild pass completes. All work is
/// single-threaded and frame-driven.
pub struct DynamicRenderer {
    config: RendererConfig,
    pool: MeshPool,
    backing: Box<dyn BufferBacking>,
    material: MaterialInstance,
    scratch: BakeScratch,
    atlas_mapping: AtlasMapping,
    stats: RendererStats,
}

impl DynamicRenderer {
    /// Create a renderer backed by host memory
    pub fn new(config: RendererConfig) -> Self {
        Self::with_backing(config, Box::new(HeapBacking))
    }

    /// Create a renderer with a host-supplied buffer backing
    pub fn with_backing(config: RendererConfig, backing: Box<dyn BufferBacking>) -> Self {
        Self {
            material: MaterialInstance::new(config.program),
            config,
            pool: MeshPool::new(),
            backing,
            scratch: BakeScratch::new(),
            atlas_mapping: AtlasMapping::new(),
            stats: RendererStats::default(),
        }
    }

    /// The renderer configuration
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// The mesh pool, one combined buffer per element
    pub fn pool(&self) -> &MeshPool {
        &self.pool
    }

    /// The shared material instance
    pub fn material(&self) -> &MaterialInstance {
        &self.material
    }

    /// UV remapping from the most recent atlas repack
    pub fn atlas_mapping(&self) -> &AtlasMapping {
        &self.atlas_mapping
    }

    /// Statistics for the most recent rendered frame
    pub fn stats(&self) -> &RendererStats {
        &self.stats
    }

    /// Swap the shader program, rebuilding the material instance.
    ///
    /// A fresh instance is constructed rather than mutating the old one so
    /// stale texture bindings cannot leak across programs.
    pub fn set_program(&mut self, program: ProgramId) {
        self.config.program = program;
        self.material = MaterialInstance::new(program);
    }

    /// Handle a layout change: resize the pool, rebake every combined
    /// buffer, and repack the atlas when texture features are present.
    ///
    /// On pool-sync failure the pool keeps its previous consistent length
    /// and the pass is aborted. On atlas failure the baked geometry stands
    /// and the material keeps its previous textures.
    pub fn rebuild(
        &mut self,
        layout: &Layout,
        cache: &TopologyCache,
        packer: &mut dyn TexturePacker,
    ) -> RendererResult<()> {
        let capabilities = layout.features.capabilities();

        self.pool
            .sync(layout.element_count(), self.backing.as_mut())?;

        if capabilities.contains(FeatureKinds::GEOMETRY) {
            bake::bake_geometry(layout, cache, &mut self.pool, &mut self.scratch);
            let colors_baked = bake::bake_colors(layout, cache, &mut self.pool, &mut self.scratch);
            self.material.set_vertex_colors(colors_baked);
        }

        if capabilities.contains(FeatureKinds::TEXTURE) {
            let features: SmallVec<[&TextureFeature; 4]> = layout.features.textures().collect();
            self.atlas_mapping = atlas::integrate(
                &features,
                self.config.atlas_border_px,
                packer,
                &mut self.material,
            )?;
        }

        Ok(())
    }

    /// Render one frame: one draw call per non-empty element buffer
    pub fn render(
        &mut self,
        layout: &Layout,
        space: &dyn LayoutSpace,
        sink: &mut dyn DrawSink,
    ) -> RendererStats {
        let dispatched = dispatch::dispatch(
            layout,
            space,
            &self.pool,
            &self.material,
            self.config.motion_type,
            sink,
        );
        self.stats = RendererStats {
            draw_calls: dispatched.draw_calls,
            triangles: dispatched.triangles,
        };
        self.stats
    }
}
