//! Baking Pipeline
//!
//! Once per layout change, each element's geometry features are merged into
//! that element's combined buffer: vertex streams are concatenated in
//! feature order and index streams are rebased so they stay valid against
//! the concatenated vertices. Color baking runs as a second aligned pass
//! when any geometry feature participates in per-vertex color.

use glam::{Vec3, Vec4};
use strata_core::{Layout, TopologyCache};

use crate::pool::MeshPool;
use crate::RendererError;

/// Reusable scratch workspace for per-element bake steps.
///
/// Cleared at the start of every element so no data escapes between
/// elements; kept alive across passes to avoid per-element allocation.
#[derive(Debug, Default)]
pub struct BakeScratch {
    positions: Vec<Vec3>,
    indices: Vec<u32>,
    colors: Vec<Vec4>,
}

impl BakeScratch {
    /// Create an empty workspace
    pub fn new() -> Self {
        Self::default()
    }
}

/// Merge every geometry feature's sub-mesh into each element's combined
/// buffer, in feature order, rebasing indices against the concatenated
/// vertex stream.
///
/// A record with no source asset, or an asset the cache cannot resolve,
/// contributes nothing for that element. Buffers are assumed cleared by the
/// preceding pool sync; their streams are fully replaced here.
pub fn bake_geometry(
    layout: &Layout,
    cache: &TopologyCache,
    pool: &mut MeshPool,
    scratch: &mut BakeScratch,
) {
    for (i, _element) in layout.elements.iter().enumerate() {
        scratch.positions.clear();
        scratch.indices.clear();

        for feature in layout.features.geometry() {
            let Some(record) = feature.data.get(i) else {
                continue;
            };
            let Some(asset) = record.asset else {
                continue;
            };
            let Some(topology) = cache.get(asset) else {
                log::warn!("topology missing for asset {asset}, skipping contribution");
                continue;
            };

            // Indices are local to the source asset; rebase them against the
            // vertices concatenated so far
            let vert_offset = scratch.positions.len() as u32;
            scratch
                .indices
                .extend(topology.indices.iter().map(|&index| index + vert_offset));
            scratch.positions.extend_from_slice(&topology.positions);
        }

        let Some(buffer) = pool.get_mut(i) else {
            continue;
        };
        buffer.positions.clone_from(&scratch.positions);
        buffer.indices.clone_from(&scratch.indices);

        if let Some((min, max)) = buffer.index_range() {
            log::trace!("element {i} baked index range {min}..={max}");
            debug_assert!(
                (max as usize) < buffer.vertex_count(),
                "element {i} index {max} references past {} vertices",
                buffer.vertex_count()
            );
        }
    }
}

/// Bake per-vertex color streams aligned 1:1 with the vertex streams
/// produced by [`bake_geometry`].
///
/// Skipped entirely (returns `false`) unless some geometry feature has its
/// color-participation flag set; callers must only activate the material's
/// vertex-color mode when this returns `true`.
///
/// Authored topology colors are multiplied by the total tint
/// (`override * feature tint`, component-wise including alpha); geometry
/// without authored colors receives the total tint as a flat fill.
pub fn bake_colors(
    layout: &Layout,
    cache: &TopologyCache,
    pool: &mut MeshPool,
    scratch: &mut BakeScratch,
) -> bool {
    if !layout.features.geometry().any(|f| f.vertex_colors) {
        return false;
    }

    for (i, _element) in layout.elements.iter().enumerate() {
        scratch.colors.clear();

        // Skip decisions must mirror bake_geometry exactly so the color
        // stream stays aligned with the vertex stream
        for feature in layout.features.geometry() {
            let Some(record) = feature.data.get(i) else {
                continue;
            };
            let Some(asset) = record.asset else {
                continue;
            };
            let Some(topology) = cache.get(asset) else {
                continue;
            };

            let total_tint = record.color * feature.tint;
            match &topology.colors {
                Some(colors) => scratch
                    .colors
                    .extend(colors.iter().map(|&c| c * total_tint)),
                None => scratch
                    .colors
                    .extend(std::iter::repeat_n(total_tint, topology.vertex_count())),
            }
        }

        let Some(buffer) = pool.get_mut(i) else {
            continue;
        };

        if scratch.colors.len() != buffer.vertex_count() {
            let err = RendererError::StreamLengthMismatch {
                element: i,
                colors: scratch.colors.len(),
                vertices: buffer.vertex_count(),
            };
            debug_assert!(false, "{err}");
            log::error!("{err}; clamping color stream");
            scratch.colors.resize(buffer.vertex_count(), Vec4::ONE);
        }

        buffer.colors.clone_from(&scratch.colors);
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use strata_core::{
        AssetId, Element, Feature, GeometryData, GeometryFeature, Topology, TopologyCache,
    };

    use crate::pool::{HeapBacking, MeshPool};

    fn cached_quad(cache: &TopologyCache) -> AssetId {
        let id = AssetId::from_content(b"quad");
        cache.insert(id, Topology::quad());
        id
    }

    fn cached_tri(cache: &TopologyCache) -> AssetId {
        let id = AssetId::from_content(b"tri");
        let tri = Topology::new(
            vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            vec![0, 1, 2],
            Some(vec![
                Vec4::new(1.0, 0.0, 0.0, 1.0),
                Vec4::new(0.0, 1.0, 0.0, 1.0),
                Vec4::new(0.0, 0.0, 1.0, 1.0),
            ]),
        )
        .unwrap();
        cache.insert(id, tri);
        id
    }

    fn baked_layout(layout: &mut Layout, cache: &TopologyCache) -> MeshPool {
        layout.sync_feature_data();
        let mut pool = MeshPool::new();
        pool.sync(layout.element_count(), &mut HeapBacking).unwrap();
        let mut scratch = BakeScratch::new();
        bake_geometry(layout, cache, &mut pool, &mut scratch);
        bake_colors(layout, cache, &mut pool, &mut scratch);
        pool
    }

    #[test]
    fn test_concatenation_order_and_rebase() {
        let cache = TopologyCache::new();
        let quad = cached_quad(&cache);
        let tri = cached_tri(&cache);

        let mut layout = Layout::new();
        layout.elements.push(Element::at(Vec3::ZERO));

        let mut a = GeometryFeature::new();
        a.data = vec![GeometryData::asset(quad)];
        let mut b = GeometryFeature::new();
        b.data = vec![GeometryData::asset(tri)];
        layout.features.push(Feature::Geometry(a));
        layout.features.push(Feature::Geometry(b));

        let pool = baked_layout(&mut layout, &cache);
        let buffer = pool.get(0).unwrap();

        // A's 4 vertices first, then B's 3
        assert_eq!(buffer.vertex_count(), 7);
        assert_eq!(buffer.positions[..4], Topology::quad().positions[..]);
        assert_eq!(buffer.positions[4], Vec3::ZERO);

        // B's indices rebased by A's vertex count
        assert_eq!(buffer.indices[..6], [0, 1, 2, 0, 2, 3]);
        assert_eq!(buffer.indices[6..], [4, 5, 6]);
    }

    #[test]
    fn test_index_validity() {
        let cache = TopologyCache::new();
        let quad = cached_quad(&cache);
        let tri = cached_tri(&cache);

        let mut layout = Layout::new();
        for i in 0..4 {
            layout
                .elements
                .push(Element::at(Vec3::new(i as f32, 0.0, 0.0)));
        }

        let mut a = GeometryFeature::new();
        a.data = vec![
            GeometryData::asset(quad),
            GeometryData::default(),
            GeometryData::asset(tri),
            GeometryData::asset(quad),
        ];
        let mut b = GeometryFeature::new();
        b.data = vec![
            GeometryData::asset(tri),
            GeometryData::asset(tri),
            GeometryData::default(),
            GeometryData::asset(quad),
        ];
        layout.features.push(Feature::Geometry(a));
        layout.features.push(Feature::Geometry(b));

        let pool = baked_layout(&mut layout, &cache);
        for buffer in pool.buffers() {
            for &index in &buffer.indices {
                assert!((index as usize) < buffer.vertex_count());
            }
        }
    }

    #[test]
    fn test_missing_asset_contributes_nothing() {
        let cache = TopologyCache::new();
        let quad = cached_quad(&cache);
        let unresolved = AssetId::from_content(b"never registered");

        let mut layout = Layout::new();
        layout.elements.push(Element::at(Vec3::ZERO));

        let mut a = GeometryFeature::new().with_vertex_colors();
        a.data = vec![GeometryData::asset(unresolved)];
        let mut b = GeometryFeature::new();
        b.data = vec![GeometryData::asset(quad)];
        layout.features.push(Feature::Geometry(a));
        layout.features.push(Feature::Geometry(b));

        let pool = baked_layout(&mut layout, &cache);
        let buffer = pool.get(0).unwrap();

        // The unresolved feature is skipped in both passes; streams stay aligned
        assert_eq!(buffer.vertex_count(), 4);
        assert_eq!(buffer.indices.len(), 6);
        assert_eq!(buffer.colors.len(), 4);
    }

    #[test]
    fn test_color_alignment_across_features() {
        let cache = TopologyCache::new();
        let quad = cached_quad(&cache);
        let tri = cached_tri(&cache);

        let mut layout = Layout::new();
        layout.elements.push(Element::at(Vec3::ZERO));
        layout.elements.push(Element::at(Vec3::X));

        let mut a = GeometryFeature::new().with_vertex_colors();
        a.data = vec![GeometryData::asset(quad), GeometryData::asset(tri)];
        let mut b = GeometryFeature::new();
        b.data = vec![GeometryData::default(), GeometryData::asset(quad)];
        layout.features.push(Feature::Geometry(a));
        layout.features.push(Feature::Geometry(b));

        let pool = baked_layout(&mut layout, &cache);
        for buffer in pool.buffers() {
            assert_eq!(buffer.colors.len(), buffer.vertex_count());
        }
    }

    #[test]
    fn test_fallback_flat_fill() {
        let cache = TopologyCache::new();
        let quad = cached_quad(&cache);

        let tint = Vec4::new(0.5, 1.0, 1.0, 0.5);
        let override_color = Vec4::new(1.0, 0.0, 0.0, 1.0);

        let mut layout = Layout::new();
        layout.elements.push(Element::at(Vec3::ZERO));

        let mut feature = GeometryFeature::new().with_tint(tint).with_vertex_colors();
        feature.data = vec![GeometryData::tinted(quad, override_color)];
        layout.features.push(Feature::Geometry(feature));

        let pool = baked_layout(&mut layout, &cache);
        let buffer = pool.get(0).unwrap();

        // No authored colors: every contributed vertex gets override * tint
        let expected = override_color * tint;
        assert_eq!(buffer.colors.len(), 4);
        assert!(buffer.colors.iter().all(|&c| c == expected));
    }

    #[test]
    fn test_authored_colors_are_tinted() {
        let cache = TopologyCache::new();
        let tri = cached_tri(&cache);

        let tint = Vec4::new(0.5, 0.5, 0.5, 1.0);

        let mut layout = Layout::new();
        layout.elements.push(Element::at(Vec3::ZERO));

        let mut feature = GeometryFeature::new().with_tint(tint).with_vertex_colors();
        feature.data = vec![GeometryData::asset(tri)];
        layout.features.push(Feature::Geometry(feature));

        let pool = baked_layout(&mut layout, &cache);
        let buffer = pool.get(0).unwrap();

        assert_eq!(buffer.colors[0], Vec4::new(0.5, 0.0, 0.0, 1.0));
        assert_eq!(buffer.colors[1], Vec4::new(0.0, 0.5, 0.0, 1.0));
        assert_eq!(buffer.colors[2], Vec4::new(0.0, 0.0, 0.5, 1.0));
    }

    #[test]
    fn test_color_bake_skipped_without_participation() {
        let cache = TopologyCache::new();
        let quad = cached_quad(&cache);

        let mut layout = Layout::new();
        layout.elements.push(Element::at(Vec3::ZERO));

        let mut feature = GeometryFeature::new();
        feature.data = vec![GeometryData::asset(quad)];
        layout.features.push(Feature::Geometry(feature));

        layout.sync_feature_data();
        let mut pool = MeshPool::new();
        pool.sync(1, &mut HeapBacking).unwrap();
        let mut scratch = BakeScratch::new();
        bake_geometry(&layout, &cache, &mut pool, &mut scratch);

        assert!(!bake_colors(&layout, &cache, &mut pool, &mut scratch));
        assert!(pool.get(0).unwrap().colors.is_empty());
    }

    #[test]
    fn test_rebake_replaces_prior_contents() {
        let cache = TopologyCache::new();
        let quad = cached_quad(&cache);
        let tri = cached_tri(&cache);

        let mut layout = Layout::new();
        layout.elements.push(Element::at(Vec3::ZERO));
        let mut feature = GeometryFeature::new();
        feature.data = vec![GeometryData::asset(quad)];
        layout.features.push(Feature::Geometry(feature));

        let mut pool = MeshPool::new();
        let mut scratch = BakeScratch::new();
        layout.sync_feature_data();
        pool.sync(1, &mut HeapBacking).unwrap();
        bake_geometry(&layout, &cache, &mut pool, &mut scratch);
        assert_eq!(pool.get(0).unwrap().vertex_count(), 4);

        // Swap the asset and rebake; prior contents must not leak through
        if let Feature::Geometry(g) = &mut layout.features.features_mut()[0] {
            g.data[0] = GeometryData::asset(tri);
        }
        pool.sync(1, &mut HeapBacking).unwrap();
        bake_geometry(&layout, &cache, &mut pool, &mut scratch);
        assert_eq!(pool.get(0).unwrap().vertex_count(), 3);
        assert_eq!(pool.get(0).unwrap().index_count(), 3);
    }
}
