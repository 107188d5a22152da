//! Material Instance
//!
//! One shared GPU-program binding used for every element's draw call.
//! Instances are rebuilt, never retargeted: changing the program means
//! constructing a fresh instance so stale texture bindings cannot leak.

use ahash::AHashMap;
use strata_core::ImageHandle;

/// Host shader-program identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramId(pub u64);

/// Shared material binding for all element draws
#[derive(Debug, Clone)]
pub struct MaterialInstance {
    program: ProgramId,
    bindings: AHashMap<String, ImageHandle>,
    vertex_colors: bool,
}

impl MaterialInstance {
    /// Create a fresh instance for the given program, with no bindings and
    /// vertex-color mode off
    pub fn new(program: ProgramId) -> Self {
        Self {
            program,
            bindings: AHashMap::new(),
            vertex_colors: false,
        }
    }

    /// Program this instance binds
    pub fn program(&self) -> ProgramId {
        self.program
    }

    /// Bind a texture under the given name, replacing any prior binding
    pub fn bind_texture(&mut self, name: impl Into<String>, image: ImageHandle) {
        self.bindings.insert(name.into(), image);
    }

    /// Currently bound texture for a name
    pub fn texture(&self, name: &str) -> Option<ImageHandle> {
        self.bindings.get(name).copied()
    }

    /// Number of texture bindings
    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }

    /// Whether the per-vertex color rendering mode is active
    pub fn vertex_colors(&self) -> bool {
        self.vertex_colors
    }

    /// Activate or deactivate the per-vertex color rendering mode.
    ///
    /// Only the color baker may activate this: the mode must track whether
    /// a color stream was actually written this pass.
    pub fn set_vertex_colors(&mut self, enabled: bool) {
        self.vertex_colors = enabled;
    }
}
