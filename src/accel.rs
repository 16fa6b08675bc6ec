use cgmath::{Matrix4, SquareMatrix};
use log::{debug, warn};

use crate::data_structures::{
    accobj::{AccObj, SplitMethod},
    bbox::Bbox,
    bvh::Bvh,
    flatten::{
        flatten_blas, flatten_tlas, BlasNode, GpuNormal, GpuTriangle, GpuVertex, TlasNode,
        TlasRawNode,
    },
};
use crate::material::Material;
use crate::mesh::Mesh;

/// Local-to-world and world-to-local matrices for one instance, in the
/// layout the kernel reads them
#[repr(C, align(16))]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TransformPair {
    pub local_to_world: [[f32; 4]; 4],
    pub world_to_local: [[f32; 4]; 4],
}

static_assertions::assert_eq_size!(TransformPair, [u32; 32]);

impl TransformPair {
    fn new(local_to_world: Matrix4<f32>) -> Self {
        let world_to_local = local_to_world.invert().unwrap_or_else(|| {
            warn!("instance transform is singular, using identity for the inverse");
            Matrix4::identity()
        });
        Self {
            local_to_world: local_to_world.into(),
            world_to_local: world_to_local.into(),
        }
    }
}

/// Per-instance record kept across transform-only rebuilds: the local-space
/// root bound of the instance's bottom-level tree, plus where that tree and
/// the instance transform live in the shared arrays
#[derive(Debug, Copy, Clone)]
struct RawNodeCache {
    local_bounds: Bbox,
    transform_idx: u32,
    node_root_idx: u32,
}

///
/// The two-level acceleration structure in its flat, kernel-ready form.
///
/// All arrays are owned here and rewritten wholesale during a rebuild:
/// a full rebuild clears everything and re-appends one bottom-level tree per
/// submesh instance, a transform-only rebuild keeps the bottom-level arrays
/// and reconstructs just the top level from cached local-space root bounds.
#[derive(Debug)]
pub struct AccelStructures {
    pub vertices: Vec<GpuVertex>,
    pub normals: Vec<GpuNormal>,
    pub indices: Vec<GpuTriangle>,
    pub materials: Vec<Material>,
    pub blas_nodes: Vec<BlasNode>,
    pub tlas_raw_nodes: Vec<TlasRawNode>,
    pub tlas_nodes: Vec<TlasNode>,
    pub transforms: Vec<TransformPair>,
    instance_matrices: Vec<Matrix4<f32>>,
    raw_cache: Vec<RawNodeCache>,
    split_method: SplitMethod,
}

impl AccelStructures {
    pub fn new(split_method: SplitMethod) -> Self {
        Self {
            vertices: vec![],
            normals: vec![],
            indices: vec![],
            materials: vec![],
            blas_nodes: vec![],
            tlas_raw_nodes: vec![],
            tlas_nodes: vec![],
            transforms: vec![],
            instance_matrices: vec![],
            raw_cache: vec![],
            split_method,
        }
    }

    pub fn split_method(&self) -> SplitMethod {
        self.split_method
    }

    /// Number of cached instance records (one per submesh instance)
    pub fn instance_count(&self) -> usize {
        self.raw_cache.len()
    }

    /// Drop all geometry-derived state ahead of a full rebuild
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.normals.clear();
        self.indices.clear();
        self.materials.clear();
        self.blas_nodes.clear();
        self.tlas_raw_nodes.clear();
        self.tlas_nodes.clear();
        self.transforms.clear();
        self.instance_matrices.clear();
        self.raw_cache.clear();
    }

    /// Load the per-instance transform pairs. Runs on every rebuild tier.
    pub fn set_transforms(&mut self, matrices: &[Matrix4<f32>]) {
        self.instance_matrices = matrices.to_vec();
        self.transforms = matrices
            .iter()
            .map(|&matrix| TransformPair::new(matrix))
            .collect();
    }

    /// Build and flatten one bottom-level tree per submesh of `mesh`,
    /// appending vertices, normals, indices, materials, nodes and one raw
    /// node record per submesh into the shared arrays.
    ///
    /// Empty submeshes are skipped with a warning so the builder never sees
    /// a zero-primitive input.
    pub fn append_instance(&mut self, mesh: &Mesh, transform_idx: u32) {
        let vertex_base = self.vertices.len() as u32;
        self.vertices
            .extend(mesh.positions.iter().map(|&position| GpuVertex::from(position)));
        self.normals
            .extend(mesh.normals.iter().map(|&normal| GpuNormal::from(normal)));

        for (submesh_idx, submesh) in mesh.submeshes().iter().enumerate() {
            if submesh.triangles.is_empty() {
                warn!("skipping empty submesh {submesh_idx} of instance {transform_idx}");
                continue;
            }
            let material_idx = self.materials.len() as i32;
            self.materials.push(submesh.material);

            let bvh = Bvh::new(mesh.bboxes(submesh_idx), self.split_method);
            let node_root_idx = flatten_blas(
                &bvh,
                &submesh.triangles,
                vertex_base,
                |_face| material_idx,
                &mut self.blas_nodes,
                &mut self.indices,
            );
            self.raw_cache.push(RawNodeCache {
                local_bounds: bvh.root().bbox,
                transform_idx,
                node_root_idx,
            });
        }
    }

    /// Build the top level over the world-space bounds of every cached
    /// instance record, then flatten it. The shipped raw node array comes
    /// out in the top-level tree's primitive order, not registration order.
    pub fn build_tlas(&mut self) {
        self.tlas_nodes.clear();
        self.tlas_raw_nodes.clear();
        if self.raw_cache.is_empty() {
            debug!("no instances, skipping top-level build");
            return;
        }

        let mut raw_nodes = Vec::with_capacity(self.raw_cache.len());
        let mut prims = Vec::with_capacity(self.raw_cache.len());
        for (idx, cache) in self.raw_cache.iter().enumerate() {
            let world_bounds = cache
                .local_bounds
                .transform(&self.instance_matrices[cache.transform_idx as usize]);
            raw_nodes.push(TlasRawNode::new(
                world_bounds.min,
                world_bounds.max,
                cache.transform_idx,
                cache.node_root_idx,
            ));
            prims.push(AccObj::new(idx as u32, world_bounds));
        }

        let bvh = Bvh::new(prims, self.split_method);
        self.tlas_raw_nodes = flatten_tlas(&bvh, &raw_nodes, &mut self.tlas_nodes);
        debug!(
            "top level rebuilt: {} raw nodes, {} nodes",
            self.tlas_raw_nodes.len(),
            self.tlas_nodes.len()
        );
    }
}

#[cfg(test)]
mod accel_test {
    use super::*;
    use crate::data_structures::vector::{vec3f, vec3u32};
    use crate::mesh::Submesh;
    use cgmath::Vector3;

    fn tetrahedron() -> Mesh {
        let positions = vec![
            vec3f(0.0, 0.0, 0.0),
            vec3f(1.0, 0.0, 0.0),
            vec3f(0.0, 1.0, 0.0),
            vec3f(0.0, 0.0, 1.0),
        ];
        let normals = vec![vec3f(0.0, 1.0, 0.0); 4];
        let submeshes = vec![Submesh {
            triangles: vec![
                vec3u32(0, 1, 2),
                vec3u32(0, 1, 3),
                vec3u32(0, 2, 3),
                vec3u32(1, 2, 3),
            ],
            material: Material::default(),
        }];
        Mesh::from_raw(positions, normals, submeshes)
    }

    fn full_build(accel: &mut AccelStructures, meshes: &[(&Mesh, Matrix4<f32>)]) {
        accel.clear();
        let matrices: Vec<_> = meshes.iter().map(|&(_, matrix)| matrix).collect();
        accel.set_transforms(&matrices);
        for (idx, &(mesh, _)) in meshes.iter().enumerate() {
            accel.append_instance(mesh, idx as u32);
        }
        accel.build_tlas();
    }

    #[test]
    fn three_instances_three_raw_nodes() {
        let mesh = tetrahedron();
        let translations = [
            Matrix4::from_translation(Vector3::new(0.0, 0.0, 0.0)),
            Matrix4::from_translation(Vector3::new(5.0, 0.0, 0.0)),
            Matrix4::from_translation(Vector3::new(0.0, 5.0, 0.0)),
        ];
        let mut accel = AccelStructures::new(SplitMethod::Sah);
        full_build(
            &mut accel,
            &[
                (&mesh, translations[0]),
                (&mesh, translations[1]),
                (&mesh, translations[2]),
            ],
        );

        assert_eq!(accel.tlas_raw_nodes.len(), 3);
        assert_eq!(accel.transforms.len(), 3);
        assert_eq!(accel.materials.len(), 3);
        assert_eq!(accel.vertices.len(), 12);
        assert_eq!(accel.indices.len(), 12);
        // every raw node points at a blas root inside the node array
        for raw in &accel.tlas_raw_nodes {
            assert!((raw.node_root_idx as usize) < accel.blas_nodes.len());
            let root = &accel.blas_nodes[raw.node_root_idx as usize];
            assert_eq!(root.min, vec3f(0.0, 0.0, 0.0));
        }
        // transform indices are a permutation of the instances
        let mut seen: Vec<u32> = accel
            .tlas_raw_nodes
            .iter()
            .map(|raw| raw.transform_idx)
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1, 2]);
    }

    #[test]
    fn tlas_leaf_ranges_cover_raw_array() {
        let mesh = tetrahedron();
        let instances: Vec<(&Mesh, Matrix4<f32>)> = (0..5)
            .map(|i| {
                (
                    &mesh,
                    Matrix4::from_translation(Vector3::new(i as f32 * 3.0, 0.0, 0.0)),
                )
            })
            .collect();
        let mut accel = AccelStructures::new(SplitMethod::Midpoint);
        full_build(&mut accel, &instances);

        let mut covered = vec![false; accel.tlas_raw_nodes.len()];
        for node in &accel.tlas_nodes {
            if node.child_idx < 0 {
                for slot in &mut covered[node.raw_start_idx as usize..node.raw_end_idx as usize]
                {
                    assert!(!*slot);
                    *slot = true;
                }
            }
        }
        assert!(covered.iter().all(|&c| c));
    }

    #[test]
    fn transform_only_rebuild_is_idempotent() {
        let mesh = tetrahedron();
        let mut accel = AccelStructures::new(SplitMethod::Sah);
        full_build(
            &mut accel,
            &[
                (&mesh, Matrix4::from_translation(Vector3::new(0.0, 0.0, 0.0))),
                (&mesh, Matrix4::from_translation(Vector3::new(4.0, 0.0, 0.0))),
            ],
        );
        let blas_before = accel.blas_nodes.clone();

        let moved = [
            Matrix4::from_translation(Vector3::new(0.0, 2.0, 0.0)),
            Matrix4::from_translation(Vector3::new(4.0, -2.0, 0.0)),
        ];
        accel.set_transforms(&moved);
        accel.build_tlas();
        let tlas_first = accel.tlas_nodes.clone();
        let raw_first = accel.tlas_raw_nodes.clone();

        accel.set_transforms(&moved);
        accel.build_tlas();
        assert_eq!(accel.tlas_nodes, tlas_first);
        assert_eq!(accel.tlas_raw_nodes, raw_first);
        // bottom level untouched by the transform-only path
        assert_eq!(accel.blas_nodes, blas_before);
    }

    #[test]
    fn empty_submesh_is_skipped() {
        let mut mesh = tetrahedron();
        let positions = mesh.positions.clone();
        let normals = mesh.normals.clone();
        let mut submeshes = mesh.submeshes().to_vec();
        submeshes.push(Submesh {
            triangles: vec![],
            material: Material::default(),
        });
        mesh = Mesh::from_raw(positions, normals, submeshes);

        let mut accel = AccelStructures::new(SplitMethod::Sah);
        full_build(&mut accel, &[(&mesh, Matrix4::identity())]);
        assert_eq!(accel.instance_count(), 1);
        assert_eq!(accel.tlas_raw_nodes.len(), 1);
    }
}
