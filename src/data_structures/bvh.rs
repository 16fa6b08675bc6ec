use log::debug;

use super::accobj::{AccObj, Split, SplitMethod};
use super::bbox::Bbox;

const N_BUCKETS: usize = 12;
/// Estimated cost of one traversal step, relative to one intersection test
const TRAVERSAL_COST: f32 = 0.5;
/// Ranges larger than this are always split, whatever the SAH says
const MAX_LEAF_PRIMS: usize = 16;

///
/// Binary bounding volume hierarchy over a set of indexed bounding boxes
///
/// Building consumes the primitive records and produces, next to the tree
/// itself, the `ordered_prim_ids` permutation: for every leaf ever created,
/// the original primitive indices it owns, in left-to-right tree order.
/// Leaf ranges index into that permutation.
#[derive(Debug)]
pub struct Bvh {
    root: BvhBuildNode,
    ordered_prim_ids: Vec<u32>,
    total_nodes: u32,
}

impl Bvh {
    /// Build a BVH over the given primitives with the given split policy.
    ///
    /// The primitive list must not be empty; callers are expected to filter
    /// out empty meshes and empty scenes before getting here.
    pub fn new(mut primitives: Vec<AccObj>, method: SplitMethod) -> Self {
        assert!(
            !primitives.is_empty(),
            "cannot build a BVH over zero primitives"
        );
        let count = primitives.len();
        let mut ordered_prim_ids = Vec::with_capacity(count);
        let mut total_nodes = 0u32;
        let root = build_recursive(
            &mut primitives,
            0,
            count,
            method,
            &mut ordered_prim_ids,
            &mut total_nodes,
        );
        debug!(
            "built {method:?} bvh: {count} primitives, {total_nodes} nodes"
        );
        Self {
            root,
            ordered_prim_ids,
            total_nodes,
        }
    }

    pub fn root(&self) -> &BvhBuildNode {
        &self.root
    }

    /// Original primitive indices in left-to-right leaf order
    pub fn ordered_prim_ids(&self) -> &[u32] {
        &self.ordered_prim_ids
    }

    pub fn node_count(&self) -> u32 {
        self.total_nodes
    }
}

#[derive(Clone, Debug)]
pub struct BvhBuildNode {
    pub bbox: Bbox,
    pub num_primitives: u32,
    node_type: BvhBuildNodeType,
}

#[derive(Clone, Debug)]
enum BvhBuildNodeType {
    Leaf {
        first_prim_offset: u32,
    },
    Interior {
        #[allow(dead_code)]
        split: Split,
        left: Box<BvhBuildNode>,
        right: Box<BvhBuildNode>,
    },
}

impl BvhBuildNode {
    fn new_leaf(first_prim_offset: u32, num_primitives: u32, bbox: Bbox) -> Self {
        Self {
            bbox,
            num_primitives,
            node_type: BvhBuildNodeType::Leaf { first_prim_offset },
        }
    }

    fn new_internal(axis: Split, child0: BvhBuildNode, child1: BvhBuildNode) -> Self {
        let bbox = Bbox::combine(&child0.bbox, &child1.bbox);
        Self {
            bbox,
            num_primitives: child0.num_primitives + child1.num_primitives,
            node_type: BvhBuildNodeType::Interior {
                split: axis,
                left: Box::new(child0),
                right: Box::new(child1),
            },
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.node_type, BvhBuildNodeType::Leaf { .. })
    }

    /// Leaf range into the ordered primitive id array, if this is a leaf
    pub fn prim_range(&self) -> Option<(u32, u32)> {
        match self.node_type {
            BvhBuildNodeType::Leaf { first_prim_offset } => {
                Some((first_prim_offset, first_prim_offset + self.num_primitives))
            }
            BvhBuildNodeType::Interior { .. } => None,
        }
    }

    pub fn children(&self) -> Option<(&BvhBuildNode, &BvhBuildNode)> {
        match &self.node_type {
            BvhBuildNodeType::Leaf { .. } => None,
            BvhBuildNodeType::Interior { left, right, .. } => Some((left, right)),
        }
    }
}

fn build_recursive(
    prims: &mut [AccObj],
    start: usize,
    end: usize,
    method: SplitMethod,
    ordered_prim_ids: &mut Vec<u32>,
    total_nodes: &mut u32,
) -> BvhBuildNode {
    *total_nodes += 1;
    let mut bound = Bbox::new();
    for prim in &prims[start..end] {
        bound.include_bbox(&prim.bbox);
    }
    let count = end - start;

    if count == 1 {
        return emit_leaf(prims, start, end, bound, ordered_prim_ids);
    }

    let mut centroid_bound = Bbox::new();
    for prim in &prims[start..end] {
        centroid_bound.include_vertex(prim.center);
    }
    let dim = centroid_bound.longest_axis();

    // All centroids coincide on the widest centroid axis, so no split can
    // separate them. Forced leaf, not an error.
    if centroid_bound.max[dim] == centroid_bound.min[dim] {
        return emit_leaf(prims, start, end, bound, ordered_prim_ids);
    }

    let mid = match method {
        SplitMethod::Midpoint => partition_midpoint(prims, start, end, dim),
        SplitMethod::Sah => {
            match partition_sah(prims, start, end, dim, &bound, &centroid_bound) {
                Some(mid) => mid,
                // splitting costs more than intersecting everything here
                None => return emit_leaf(prims, start, end, bound, ordered_prim_ids),
            }
        }
    };
    // an empty left child would recurse forever
    let mid = if mid == start {
        partition_midpoint(prims, start, end, dim)
    } else {
        mid
    };

    let left = build_recursive(prims, start, mid, method, ordered_prim_ids, total_nodes);
    let right = build_recursive(prims, mid, end, method, ordered_prim_ids, total_nodes);
    BvhBuildNode::new_internal(dim.into(), left, right)
}

fn emit_leaf(
    prims: &[AccObj],
    start: usize,
    end: usize,
    bound: Bbox,
    ordered_prim_ids: &mut Vec<u32>,
) -> BvhBuildNode {
    let first_prim_offset = ordered_prim_ids.len() as u32;
    for prim in &prims[start..end] {
        ordered_prim_ids.push(prim.idx);
    }
    BvhBuildNode::new_leaf(first_prim_offset, (end - start) as u32, bound)
}

/// Sort the range by centroid along `dim` and cut at the middle index
fn partition_midpoint(prims: &mut [AccObj], start: usize, end: usize, dim: u32) -> usize {
    prims[start..end].sort_by(|a, b| f32::total_cmp(&a.center[dim], &b.center[dim]));
    (start + end) / 2
}

#[derive(Debug, Copy, Clone, Default)]
struct Bucket {
    count: u32,
    bounds: Bbox,
}

/// Binned surface area heuristic split.
///
/// Returns the partition point, or `None` when making one leaf out of the
/// whole range is estimated to be cheaper than splitting it.
fn partition_sah(
    prims: &mut [AccObj],
    start: usize,
    end: usize,
    dim: u32,
    bound: &Bbox,
    centroid_bound: &Bbox,
) -> Option<usize> {
    let count = end - start;
    // too few primitives for binning to say anything useful
    if count <= 2 {
        return Some(partition_midpoint(prims, start, end, dim));
    }

    let bucket_index = |prim: &AccObj| -> usize {
        let b = (centroid_bound.offset(prim.center)[dim] * N_BUCKETS as f32) as usize;
        b.min(N_BUCKETS - 1)
    };

    let mut buckets = [Bucket::default(); N_BUCKETS];
    for prim in &prims[start..end] {
        let b = bucket_index(prim);
        buckets[b].count += 1;
        buckets[b].bounds.include_bbox(&prim.bbox);
    }

    // cost of splitting after bucket i: prims below * area below
    // plus prims above * area above, skipping one-sided boundaries
    let mut min_cost = f32::INFINITY;
    let mut min_boundary = None;
    for boundary in 0..N_BUCKETS - 1 {
        let mut below_bound = Bbox::new();
        let mut below_count = 0;
        for bucket in &buckets[..=boundary] {
            below_count += bucket.count;
            below_bound.include_bbox(&bucket.bounds);
        }
        let mut above_bound = Bbox::new();
        let mut above_count = 0;
        for bucket in &buckets[boundary + 1..] {
            above_count += bucket.count;
            above_bound.include_bbox(&bucket.bounds);
        }
        if below_count == 0 || above_count == 0 {
            continue;
        }
        let cost =
            below_count as f32 * below_bound.area() + above_count as f32 * above_bound.area();
        if cost < min_cost {
            min_cost = cost;
            min_boundary = Some(boundary);
        }
    }
    let Some(min_boundary) = min_boundary else {
        // every boundary was one-sided; the midpoint sort still works
        return Some(partition_midpoint(prims, start, end, dim));
    };

    let leaf_cost = count as f32;
    let split_cost = TRAVERSAL_COST + min_cost / bound.area();
    if count > MAX_LEAF_PRIMS || split_cost < leaf_cost {
        // stable partition around the chosen bucket boundary
        let mut below = Vec::with_capacity(count);
        let mut above = Vec::with_capacity(count);
        for prim in &prims[start..end] {
            if bucket_index(prim) <= min_boundary {
                below.push(*prim);
            } else {
                above.push(*prim);
            }
        }
        let mid = start + below.len();
        prims[start..mid].copy_from_slice(&below);
        prims[mid..end].copy_from_slice(&above);
        Some(mid)
    } else {
        None
    }
}
