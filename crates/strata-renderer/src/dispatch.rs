//! Render Dispatcher
//!
//! Once per frame, each element is placed through the layout space and
//! submitted as exactly one draw call against its combined buffer and the
//! shared material instance. No batching across elements: elements may be
//! independently transformed every frame, so one draw per element is the
//! deliberate trade-off.

use glam::{Quat, Vec3};
use strata_core::{Layout, LayoutSpace};

use crate::material::MaterialInstance;
use crate::pool::{CombinedBuffer, MeshPool};

/// How much of the layout space's placement is applied per element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MotionType {
    /// Position only; elements keep their authored orientation
    Translation,
    /// Position plus the space's angular offset
    #[default]
    Full,
}

/// One element's draw submission
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCall {
    /// Element index
    pub element: usize,
    /// World position from the layout space
    pub position: Vec3,
    /// World orientation from the layout space's angular offset
    pub rotation: Quat,
}

/// Host draw-submission hook; actual GPU work stays outside this crate
pub trait DrawSink {
    /// Submit one element's draw
    fn draw(&mut self, call: DrawCall, buffer: &CombinedBuffer, material: &MaterialInstance);
}

/// Per-frame dispatch counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Draw calls issued
    pub draw_calls: u32,
    /// Triangles submitted
    pub triangles: u32,
}

/// Issue one draw call per element.
///
/// Elements whose combined buffer is currently empty are skipped, not an
/// error: an element with zero contributing geometry features simply draws
/// nothing.
pub fn dispatch(
    layout: &Layout,
    space: &dyn LayoutSpace,
    pool: &MeshPool,
    material: &MaterialInstance,
    motion: MotionType,
    sink: &mut dyn DrawSink,
) -> DispatchStats {
    let mut stats = DispatchStats::default();

    for (i, element) in layout.elements.iter().enumerate() {
        let Some(buffer) = pool.get(i) else {
            continue;
        };
        if buffer.is_empty() {
            continue;
        }

        let params = space.parameters(element.anchor, element.local_position);
        let position = space.transform_point(element, element.local_position);
        let rotation = match motion {
            MotionType::Translation => Quat::IDENTITY,
            MotionType::Full => Quat::from_rotation_y(params.angle_offset),
        };

        sink.draw(
            DrawCall {
                element: i,
                position,
                rotation,
            },
            buffer,
            material,
        );
        stats.draw_calls += 1;
        stats.triangles += buffer.triangle_count() as u32;
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::{CylindricalSpace, Element, RectSpace};

    use crate::material::ProgramId;
    use crate::pool::HeapBacking;

    #[derive(Default)]
    struct RecordingSink {
        calls: Vec<DrawCall>,
    }

    impl DrawSink for RecordingSink {
        fn draw(&mut self, call: DrawCall, _buffer: &CombinedBuffer, _material: &MaterialInstance) {
            self.calls.push(call);
        }
    }

    fn pool_with(filled: &[bool]) -> MeshPool {
        let mut pool = MeshPool::new();
        pool.sync(filled.len(), &mut HeapBacking).unwrap();
        for (i, &fill) in filled.iter().enumerate() {
            if fill {
                let buffer = pool.get_mut(i).unwrap();
                buffer.positions = vec![Vec3::ZERO, Vec3::X, Vec3::Y];
                buffer.indices = vec![0, 1, 2];
            }
        }
        pool
    }

    #[test]
    fn test_empty_buffers_are_skipped() {
        let mut layout = Layout::new();
        layout.elements.push(Element::at(Vec3::ZERO));
        layout.elements.push(Element::at(Vec3::X));
        layout.elements.push(Element::at(Vec3::Y));

        let pool = pool_with(&[true, false, true]);
        let material = MaterialInstance::new(ProgramId(0));
        let mut sink = RecordingSink::default();

        let stats = dispatch(
            &layout,
            &RectSpace,
            &pool,
            &material,
            MotionType::Full,
            &mut sink,
        );

        assert_eq!(stats.draw_calls, 2);
        assert_eq!(stats.triangles, 2);
        let drawn: Vec<usize> = sink.calls.iter().map(|c| c.element).collect();
        assert_eq!(drawn, vec![0, 2]);
    }

    #[test]
    fn test_rotation_follows_angle_offset() {
        let arc = std::f32::consts::FRAC_PI_2;
        let mut layout = Layout::new();
        layout.elements.push(Element::at(Vec3::new(arc, 0.0, 0.0)));

        let space = CylindricalSpace::new(1.0);
        let pool = pool_with(&[true]);
        let material = MaterialInstance::new(ProgramId(0));
        let mut sink = RecordingSink::default();

        dispatch(
            &layout,
            &space,
            &pool,
            &material,
            MotionType::Full,
            &mut sink,
        );

        let call = sink.calls[0];
        let expected = Quat::from_rotation_y(arc);
        assert!(call.rotation.angle_between(expected) < 1e-5);
        assert!((call.position.x - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_translation_keeps_identity_rotation() {
        let mut layout = Layout::new();
        layout.elements.push(Element::at(Vec3::new(2.0, 0.0, 0.0)));

        let space = CylindricalSpace::new(1.0);
        let pool = pool_with(&[true]);
        let material = MaterialInstance::new(ProgramId(0));
        let mut sink = RecordingSink::default();

        dispatch(
            &layout,
            &space,
            &pool,
            &material,
            MotionType::Translation,
            &mut sink,
        );

        assert_eq!(sink.calls[0].rotation, Quat::IDENTITY);
    }

    #[test]
    fn test_pool_shorter_than_layout_draws_what_exists() {
        // Transient mid-resize state: dispatch must not panic or overrun
        let mut layout = Layout::new();
        layout.elements.push(Element::at(Vec3::ZERO));
        layout.elements.push(Element::at(Vec3::X));

        let pool = pool_with(&[true]);
        let material = MaterialInstance::new(ProgramId(0));
        let mut sink = RecordingSink::default();

        let stats = dispatch(
            &layout,
            &RectSpace,
            &pool,
            &material,
            MotionType::Full,
            &mut sink,
        );
        assert_eq!(stats.draw_calls, 1);
    }
}
