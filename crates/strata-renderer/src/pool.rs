//! Mesh Pool
//!
//! An index-stable arena of combined-geometry buffers, one per element.
//! [`MeshPool::sync`] keeps the pool's length equal to the element count:
//! excess buffers are released (and their backing resources freed), missing
//! buffers are allocated, and every surviving buffer is cleared since bake
//! writes are full overwrites.

use glam::{Vec3, Vec4};

use crate::RendererResult;

/// Update-frequency hint handed to the host's graphics layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BufferUsage {
    /// Written once, drawn many times
    Static,
    /// Rewritten every bake pass
    #[default]
    Dynamic,
}

/// Per-element mutable concatenated geometry storage.
///
/// Cleared and fully rewritten every bake pass; destroyed only when the
/// pool shrinks.
#[derive(Debug, Clone, Default)]
pub struct CombinedBuffer {
    /// Concatenated vertex positions
    pub positions: Vec<Vec3>,
    /// Concatenated rebased triangle indices
    pub indices: Vec<u32>,
    /// Concatenated per-vertex colors; empty unless color baking ran
    pub colors: Vec<Vec4>,
    /// Update-frequency hint
    pub usage: BufferUsage,
}

impl CombinedBuffer {
    /// Create an empty buffer with the given usage hint
    pub fn new(usage: BufferUsage) -> Self {
        Self {
            usage,
            ..Self::default()
        }
    }

    /// Empty all streams, keeping allocations for reuse
    pub fn clear(&mut self) {
        self.positions.clear();
        self.indices.clear();
        self.colors.clear();
    }

    /// Whether the buffer holds no geometry
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Vertex count
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Index count
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// Triangle count
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Minimum and maximum index values, or `None` for an empty index stream
    pub fn index_range(&self) -> Option<(u32, u32)> {
        let first = *self.indices.first()?;
        let range = self
            .indices
            .iter()
            .fold((first, first), |(min, max), &i| (min.min(i), max.max(i)));
        Some(range)
    }
}

/// Host hook for combined-buffer allocation and release.
///
/// GPU resource management stays on the host side: `create` may fail when
/// the graphics layer is out of memory, and `destroy` must free whatever
/// `create` reserved.
pub trait BufferBacking {
    /// Allocate a fresh empty buffer marked as frequently updated
    fn create(&mut self) -> RendererResult<CombinedBuffer>;

    /// Release a buffer and free its backing resources
    fn destroy(&mut self, buffer: CombinedBuffer);
}

/// Host-memory backing with no external resources to free
#[derive(Debug, Clone, Copy, Default)]
pub struct HeapBacking;

impl BufferBacking for HeapBacking {
    fn create(&mut self) -> RendererResult<CombinedBuffer> {
        Ok(CombinedBuffer::new(BufferUsage::Dynamic))
    }

    fn destroy(&mut self, _buffer: CombinedBuffer) {}
}

/// Arena of combined buffers addressed by element index
#[derive(Debug, Default)]
pub struct MeshPool {
    buffers: Vec<CombinedBuffer>,
}

impl MeshPool {
    /// Create an empty pool
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pooled buffers
    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    /// Whether the pool holds no buffers
    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    /// Buffer for the given element index
    pub fn get(&self, index: usize) -> Option<&CombinedBuffer> {
        self.buffers.get(index)
    }

    /// Mutable buffer for the given element index
    pub fn get_mut(&mut self, index: usize) -> Option<&mut CombinedBuffer> {
        self.buffers.get_mut(index)
    }

    /// All buffers in element order
    pub fn buffers(&self) -> &[CombinedBuffer] {
        &self.buffers
    }

    /// Make the pool's length exactly `count` and clear every buffer.
    ///
    /// Shrinking releases excess buffers through `backing`. Growing is
    /// all-or-nothing: if any allocation fails, buffers allocated so far are
    /// released, the pool keeps its previous consistent length, and the
    /// error is surfaced so the caller aborts the pass.
    pub fn sync(&mut self, count: usize, backing: &mut dyn BufferBacking) -> RendererResult<()> {
        while self.buffers.len() > count {
            if let Some(buffer) = self.buffers.pop() {
                backing.destroy(buffer);
            }
        }

        if self.buffers.len() < count {
            let needed = count - self.buffers.len();
            let mut fresh = Vec::with_capacity(needed);
            for _ in 0..needed {
                match backing.create() {
                    Ok(buffer) => fresh.push(buffer),
                    Err(err) => {
                        for buffer in fresh {
                            backing.destroy(buffer);
                        }
                        return Err(err);
                    }
                }
            }
            log::debug!("mesh pool grew by {} to {}", needed, count);
            self.buffers.append(&mut fresh);
        }

        // Bake writes are full overwrites, never incremental patches
        for buffer in &mut self.buffers {
            buffer.clear();
        }

        Ok(())
    }
}
