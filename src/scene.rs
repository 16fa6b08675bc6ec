use anyhow::bail;
use cgmath::Matrix4;
use log::info;

use crate::accel::AccelStructures;
use crate::data_structures::accobj::SplitMethod;
use crate::mesh::Mesh;

/// Handle to a registered scene object
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ObjectId(u64);

/// What a validation pass found and therefore which tier it rebuilt
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Rebuild {
    /// Nothing changed, arrays untouched
    None,
    /// Only transforms changed: top level rebuilt from cached bounds
    TlasOnly,
    /// Geometry changed: everything rebuilt
    Full,
}

/// Validation state between frames. Registration changes always escalate to
/// `GeometryDirty`; transform changes only mark `TransformDirty` from
/// `Clean`, since a full rebuild reloads transforms anyway.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum DirtyState {
    Clean,
    GeometryDirty,
    TransformDirty,
}

struct SceneObject {
    id: ObjectId,
    mesh: Mesh,
    transform: Matrix4<f32>,
}

///
/// The scene aggregate: registered objects, their transforms, and the flat
/// acceleration arrays derived from them.
///
/// Mutations only mark state dirty; [`Scene::validate`] performs the actual
/// rebuild synchronously and reports which tier ran, so the caller knows
/// whether to re-upload buffers and reset frame accumulation. Nothing reads
/// the arrays mid-rebuild: `validate` takes `&mut self` and the arrays are
/// only reachable through [`Scene::accel`] afterwards.
pub struct Scene {
    objects: Vec<SceneObject>,
    next_id: u64,
    state: DirtyState,
    accel: AccelStructures,
}

impl Scene {
    pub fn new(split_method: SplitMethod) -> Self {
        Self {
            objects: vec![],
            next_id: 0,
            state: DirtyState::Clean,
            accel: AccelStructures::new(split_method),
        }
    }

    /// Register a mesh instance. Meshes without any triangles are rejected
    /// here so the tree builder never sees an empty primitive list.
    pub fn register_object(
        &mut self,
        mesh: Mesh,
        transform: Matrix4<f32>,
    ) -> anyhow::Result<ObjectId> {
        if mesh.triangle_count() == 0 {
            bail!("cannot register a mesh with no triangles");
        }
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        self.objects.push(SceneObject {
            id,
            mesh,
            transform,
        });
        self.state = DirtyState::GeometryDirty;
        Ok(id)
    }

    /// Remove a registered object. Returns false for unknown handles.
    pub fn unregister_object(&mut self, id: ObjectId) -> bool {
        let before = self.objects.len();
        self.objects.retain(|object| object.id != id);
        if self.objects.len() != before {
            self.state = DirtyState::GeometryDirty;
            true
        } else {
            false
        }
    }

    /// Replace an object's local-to-world transform.
    /// Returns false for unknown handles.
    pub fn set_transform(&mut self, id: ObjectId, transform: Matrix4<f32>) -> bool {
        let Some(object) = self.objects.iter_mut().find(|object| object.id == id) else {
            return false;
        };
        object.transform = transform;
        if self.state == DirtyState::Clean {
            self.state = DirtyState::TransformDirty;
        }
        true
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// The flat arrays, valid after the most recent [`Scene::validate`]
    pub fn accel(&self) -> &AccelStructures {
        &self.accel
    }

    /// Per-frame entry point: rebuild whatever the dirty state requires and
    /// return which tier ran. A failed rebuild propagates; the caller must
    /// not keep rendering with arrays that no longer match the scene.
    pub fn validate(&mut self) -> anyhow::Result<Rebuild> {
        let rebuilt = match self.state {
            DirtyState::Clean => Rebuild::None,
            DirtyState::TransformDirty => {
                self.rebuild_transforms_only();
                Rebuild::TlasOnly
            }
            DirtyState::GeometryDirty => {
                self.rebuild_full();
                Rebuild::Full
            }
        };
        self.state = DirtyState::Clean;
        Ok(rebuilt)
    }

    fn transform_list(&self) -> Vec<Matrix4<f32>> {
        self.objects.iter().map(|object| object.transform).collect()
    }

    fn rebuild_full(&mut self) {
        self.accel.clear();
        self.accel.set_transforms(&self.transform_list());
        for idx in 0..self.objects.len() {
            let mesh = &self.objects[idx].mesh;
            self.accel.append_instance(mesh, idx as u32);
        }
        self.accel.build_tlas();
        info!(
            "full rebuild: {} objects, {} blas nodes, {} tlas nodes",
            self.objects.len(),
            self.accel.blas_nodes.len(),
            self.accel.tlas_nodes.len()
        );
    }

    fn rebuild_transforms_only(&mut self) {
        self.accel.set_transforms(&self.transform_list());
        self.accel.build_tlas();
        info!(
            "transform-only rebuild: {} tlas nodes",
            self.accel.tlas_nodes.len()
        );
    }
}

#[cfg(test)]
mod scene_test {
    use super::*;
    use crate::data_structures::vector::{vec3f, vec3u32};
    use crate::material::Material;
    use crate::mesh::Submesh;
    use cgmath::{SquareMatrix, Vector3};

    fn quad() -> Mesh {
        let positions = vec![
            vec3f(0.0, 0.0, 0.0),
            vec3f(1.0, 0.0, 0.0),
            vec3f(1.0, 1.0, 0.0),
            vec3f(0.0, 1.0, 0.0),
        ];
        let normals = vec![vec3f(0.0, 0.0, 1.0); 4];
        Mesh::from_raw(
            positions,
            normals,
            vec![Submesh {
                triangles: vec![vec3u32(0, 1, 2), vec3u32(0, 2, 3)],
                material: Material::default(),
            }],
        )
    }

    fn translation(x: f32, y: f32, z: f32) -> Matrix4<f32> {
        Matrix4::from_translation(Vector3::new(x, y, z))
    }

    #[test]
    fn registration_triggers_full_rebuild_once() {
        let mut scene = Scene::new(SplitMethod::Sah);
        scene
            .register_object(quad(), Matrix4::identity())
            .unwrap();
        assert_eq!(scene.validate().unwrap(), Rebuild::Full);
        assert_eq!(scene.accel().tlas_raw_nodes.len(), 1);
        // clean scene, nothing to do
        assert_eq!(scene.validate().unwrap(), Rebuild::None);
    }

    #[test]
    fn empty_mesh_is_rejected() {
        let mut scene = Scene::new(SplitMethod::Sah);
        let empty = Mesh::from_raw(vec![], vec![], vec![]);
        assert!(scene.register_object(empty, Matrix4::identity()).is_err());
        assert_eq!(scene.object_count(), 0);
    }

    #[test]
    fn transform_change_rebuilds_tlas_only() {
        let mut scene = Scene::new(SplitMethod::Sah);
        let a = scene
            .register_object(quad(), translation(0.0, 0.0, 0.0))
            .unwrap();
        scene
            .register_object(quad(), translation(3.0, 0.0, 0.0))
            .unwrap();
        scene.validate().unwrap();
        let blas_before = scene.accel().blas_nodes.clone();

        assert!(scene.set_transform(a, translation(0.0, 7.0, 0.0)));
        assert_eq!(scene.validate().unwrap(), Rebuild::TlasOnly);
        assert_eq!(scene.accel().blas_nodes, blas_before);

        // the moved instance's world bound moved with it
        let moved = scene
            .accel()
            .tlas_raw_nodes
            .iter()
            .find(|raw| raw.transform_idx == 0)
            .unwrap();
        assert_eq!(moved.min, vec3f(0.0, 7.0, 0.0));
    }

    #[test]
    fn geometry_dirty_wins_over_transform_dirty() {
        let mut scene = Scene::new(SplitMethod::Sah);
        let a = scene
            .register_object(quad(), Matrix4::identity())
            .unwrap();
        scene.validate().unwrap();

        scene.set_transform(a, translation(1.0, 0.0, 0.0));
        scene
            .register_object(quad(), translation(5.0, 0.0, 0.0))
            .unwrap();
        // both changed; one full rebuild covers everything
        assert_eq!(scene.validate().unwrap(), Rebuild::Full);
        assert_eq!(scene.accel().tlas_raw_nodes.len(), 2);
        let moved = scene
            .accel()
            .tlas_raw_nodes
            .iter()
            .find(|raw| raw.transform_idx == 0)
            .unwrap();
        assert_eq!(moved.min, vec3f(1.0, 0.0, 0.0));
    }

    #[test]
    fn unregister_shrinks_the_scene() {
        let mut scene = Scene::new(SplitMethod::Midpoint);
        let a = scene
            .register_object(quad(), Matrix4::identity())
            .unwrap();
        scene
            .register_object(quad(), translation(4.0, 0.0, 0.0))
            .unwrap();
        scene.validate().unwrap();
        assert_eq!(scene.accel().tlas_raw_nodes.len(), 2);

        assert!(scene.unregister_object(a));
        assert!(!scene.unregister_object(a));
        assert_eq!(scene.validate().unwrap(), Rebuild::Full);
        assert_eq!(scene.accel().tlas_raw_nodes.len(), 1);
        assert_eq!(scene.accel().transforms.len(), 1);
    }

    #[test]
    fn three_instances_of_one_mesh() {
        let mut scene = Scene::new(SplitMethod::Sah);
        for i in 0..3 {
            scene
                .register_object(quad(), translation(i as f32 * 4.0, 0.0, 0.0))
                .unwrap();
        }
        scene.validate().unwrap();
        let accel = scene.accel();
        assert_eq!(accel.tlas_raw_nodes.len(), 3);
        assert_eq!(accel.transforms.len(), 3);
        // each raw node resolves to a valid blas root
        for raw in &accel.tlas_raw_nodes {
            assert!((raw.node_root_idx as usize) < accel.blas_nodes.len());
        }
    }
}
