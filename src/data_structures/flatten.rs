use std::collections::VecDeque;

use super::bvh::Bvh;
use super::vector::{vec3u32, Vec3f32, Vec3u32};

/// Flat array layouts for the traversal kernel
///
/// Every type here is an element of one of the shared storage arrays the
/// renderer reads, so the layouts are fixed and checked at compile time.

#[repr(C, align(16))]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuVertex {
    pub position: Vec3f32,
    _padding: f32,
}

impl From<Vec3f32> for GpuVertex {
    fn from(value: Vec3f32) -> Self {
        Self {
            position: value,
            _padding: 0.0,
        }
    }
}

#[repr(C, align(16))]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuNormal {
    pub direction: Vec3f32,
    _padding: f32,
}

impl From<Vec3f32> for GpuNormal {
    fn from(value: Vec3f32) -> Self {
        Self {
            direction: value,
            _padding: 0.0,
        }
    }
}

#[repr(C, align(16))]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuTriangle {
    pub indices: Vec3u32,
    _padding: u32,
}

impl From<Vec3u32> for GpuTriangle {
    fn from(value: Vec3u32) -> Self {
        Self {
            indices: value,
            _padding: 0,
        }
    }
}

/// Flattened bottom-level node.
///
/// Interior nodes carry `child_idx` pointing at the first of their two
/// children in the same array and `-1` face sentinels; leaves carry the
/// half-open global face range `[face_start_idx, face_end_idx)` plus the
/// material of their faces, and `child_idx = -1`.
#[repr(C, align(16))]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BlasNode {
    pub min: Vec3f32,
    pub face_start_idx: i32,
    pub max: Vec3f32,
    pub face_end_idx: i32,
    pub material_idx: i32,
    pub child_idx: i32,
    _padding: [i32; 2],
}

/// One entry per scene instance, pointing a top-level leaf at the
/// bottom-level tree of the mesh it instantiates
#[repr(C, align(16))]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TlasRawNode {
    pub min: Vec3f32,
    pub transform_idx: u32,
    pub max: Vec3f32,
    pub node_root_idx: u32,
}

impl TlasRawNode {
    pub fn new(
        min: Vec3f32,
        max: Vec3f32,
        transform_idx: u32,
        node_root_idx: u32,
    ) -> Self {
        Self {
            min,
            transform_idx,
            max,
            node_root_idx,
        }
    }
}

/// Flattened top-level node. Mirrors [`BlasNode`] except that leaves own a
/// range of raw node entries instead of faces, since a top-level leaf may
/// hold several instances.
#[repr(C, align(16))]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TlasNode {
    pub min: Vec3f32,
    pub raw_start_idx: i32,
    pub max: Vec3f32,
    pub raw_end_idx: i32,
    pub child_idx: i32,
    _padding: [i32; 3],
}

static_assertions::assert_eq_size!(GpuVertex, [u32; 4]);
static_assertions::assert_eq_size!(GpuNormal, [u32; 4]);
static_assertions::assert_eq_size!(GpuTriangle, [u32; 4]);
static_assertions::assert_eq_size!(BlasNode, [u32; 12]);
static_assertions::assert_eq_size!(TlasRawNode, [u32; 8]);
static_assertions::assert_eq_size!(TlasNode, [u32; 12]);

/// Append a built bottom-level tree to the shared node array in level order
/// and append its triangles, in leaf order, to the shared index array.
///
/// Nodes come out in breadth-first layout: once all nodes queued ahead of an
/// interior node have been flushed, its two children are the next two
/// entries, which is what the closed-form `child_idx` below encodes. Leaf
/// face ranges are offset by the number of faces already in the index array,
/// vertex indices by `vertex_base`. `material_of` maps a mesh-local face id
/// to its global material index.
///
/// Must be called exactly once per built tree; it always appends.
pub fn flatten_blas(
    bvh: &Bvh,
    local_triangles: &[Vec3u32],
    vertex_base: u32,
    material_of: impl Fn(u32) -> i32,
    nodes: &mut Vec<BlasNode>,
    indices: &mut Vec<GpuTriangle>,
) -> u32 {
    let root_offset = nodes.len() as u32;
    let face_base = indices.len() as u32;
    let ordered = bvh.ordered_prim_ids();

    for &face_id in ordered {
        let triangle = local_triangles[face_id as usize];
        indices.push(
            vec3u32(
                triangle.0 + vertex_base,
                triangle.1 + vertex_base,
                triangle.2 + vertex_base,
            )
            .into(),
        );
    }

    let mut queue = VecDeque::new();
    queue.push_back(bvh.root());
    while let Some(node) = queue.pop_front() {
        let flat = match node.prim_range() {
            Some((start, end)) => BlasNode {
                min: node.bbox.min,
                face_start_idx: (face_base + start) as i32,
                max: node.bbox.max,
                face_end_idx: (face_base + end) as i32,
                material_idx: material_of(ordered[start as usize]),
                child_idx: -1,
                _padding: [0; 2],
            },
            None => BlasNode {
                min: node.bbox.min,
                face_start_idx: -1,
                max: node.bbox.max,
                face_end_idx: -1,
                material_idx: 0,
                child_idx: (queue.len() + nodes.len() + 1) as i32,
                _padding: [0; 2],
            },
        };
        nodes.push(flat);
        if let Some((left, right)) = node.children() {
            queue.push_back(left);
            queue.push_back(right);
        }
    }
    root_offset
}

/// Append a built top-level tree to the node array in level order and return
/// the raw node array reordered to the tree's primitive permutation, so that
/// leaf ranges `[raw_start_idx, raw_end_idx)` index it directly.
///
/// Must be called exactly once per built tree; it always appends.
pub fn flatten_tlas(
    bvh: &Bvh,
    raw_nodes: &[TlasRawNode],
    nodes: &mut Vec<TlasNode>,
) -> Vec<TlasRawNode> {
    let reordered = bvh
        .ordered_prim_ids()
        .iter()
        .map(|&id| raw_nodes[id as usize])
        .collect();

    let mut queue = VecDeque::new();
    queue.push_back(bvh.root());
    while let Some(node) = queue.pop_front() {
        let flat = match node.prim_range() {
            Some((start, end)) => TlasNode {
                min: node.bbox.min,
                raw_start_idx: start as i32,
                max: node.bbox.max,
                raw_end_idx: end as i32,
                child_idx: -1,
                _padding: [0; 3],
            },
            None => TlasNode {
                min: node.bbox.min,
                raw_start_idx: -1,
                max: node.bbox.max,
                raw_end_idx: -1,
                child_idx: (queue.len() + nodes.len() + 1) as i32,
                _padding: [0; 3],
            },
        };
        nodes.push(flat);
        if let Some((left, right)) = node.children() {
            queue.push_back(left);
            queue.push_back(right);
        }
    }
    reordered
}
