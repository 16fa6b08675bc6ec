use std::path::Path;

use log::warn;

use crate::data_structures::{
    accobj::AccObj,
    bbox::Bbox,
    vector::{vec3f, vec3u32, vec4f, Vec3f32, Vec3u32},
};
use crate::material::Material;

/// One triangle list of a mesh sharing a single material
#[derive(Debug, Clone)]
pub struct Submesh {
    pub triangles: Vec<Vec3u32>,
    pub material: Material,
}

///
/// Host-side mesh: one position/normal buffer shared by any number of
/// submeshes, each submesh being a triangle index list with its own material
#[derive(Debug, Clone)]
pub struct Mesh {
    pub positions: Vec<Vec3f32>,
    pub normals: Vec<Vec3f32>,
    submeshes: Vec<Submesh>,
}

impl Mesh {
    /// Assemble a mesh from raw buffers, warning (but not failing) on
    /// inconsistent per-vertex data counts
    pub fn from_raw(
        positions: Vec<Vec3f32>,
        normals: Vec<Vec3f32>,
        submeshes: Vec<Submesh>,
    ) -> Self {
        if !normals.is_empty() && normals.len() != positions.len() {
            warn!(
                "mesh has {} positions but {} normals, shading data will be incomplete",
                positions.len(),
                normals.len()
            );
        }
        Self {
            positions,
            normals,
            submeshes,
        }
    }

    pub fn submeshes(&self) -> &[Submesh] {
        &self.submeshes
    }

    /// Total triangle count over all submeshes
    pub fn triangle_count(&self) -> usize {
        self.submeshes.iter().map(|sub| sub.triangles.len()).sum()
    }

    /// Indexed bounding boxes for one submesh, ready for a BVH build
    pub fn bboxes(&self, submesh: usize) -> Vec<AccObj> {
        self.submeshes[submesh]
            .triangles
            .iter()
            .enumerate()
            .map(|(idx, triangle)| {
                AccObj::new(
                    idx as u32,
                    Bbox::from_triangle(
                        self.positions[triangle.0 as usize],
                        self.positions[triangle.1 as usize],
                        self.positions[triangle.2 as usize],
                    ),
                )
            })
            .collect()
    }

    pub fn scale(&mut self, factor: f32) {
        self.positions.iter_mut().for_each(|position| {
            *position = *position * factor;
        });
    }

    pub fn from_obj<P>(file_name: P) -> anyhow::Result<Mesh>
    where
        P: AsRef<Path> + std::fmt::Debug,
    {
        let (models, materials_maybe) = tobj::load_obj(
            file_name,
            &tobj::LoadOptions {
                single_index: true,
                triangulate: true,
                ..Default::default()
            },
        )?;
        let obj_materials = materials_maybe.unwrap_or_default();

        let mut positions = vec![];
        let mut normals = vec![];
        let mut submeshes = vec![];
        for model in &models {
            let base = positions.len() as u32;
            for i in 0..model.mesh.positions.len() / 3 {
                positions.push(vec3f(
                    model.mesh.positions[i * 3],
                    model.mesh.positions[i * 3 + 1],
                    model.mesh.positions[i * 3 + 2],
                ));
            }
            if model.mesh.normals.len() != model.mesh.positions.len() {
                warn!(
                    "model {} has {} normal components for {} position components",
                    model.name,
                    model.mesh.normals.len(),
                    model.mesh.positions.len()
                );
            }
            for i in 0..model.mesh.normals.len() / 3 {
                normals.push(vec3f(
                    model.mesh.normals[i * 3],
                    model.mesh.normals[i * 3 + 1],
                    model.mesh.normals[i * 3 + 2],
                ));
            }

            let triangles = (0..model.mesh.indices.len() / 3)
                .map(|i| {
                    vec3u32(
                        base + model.mesh.indices[i * 3],
                        base + model.mesh.indices[i * 3 + 1],
                        base + model.mesh.indices[i * 3 + 2],
                    )
                })
                .collect();
            let material = model
                .mesh
                .material_id
                .and_then(|id| obj_materials.get(id))
                .map(convert_obj_material)
                .unwrap_or_default();
            submeshes.push(Submesh {
                triangles,
                material,
            });
        }

        Ok(Mesh::from_raw(positions, normals, submeshes))
    }
}

fn convert_obj_material(material: &tobj::Material) -> Material {
    let color = |rgb: Option<[f32; 3]>| {
        let [r, g, b] = rgb.unwrap_or([0.0, 0.0, 0.0]);
        vec4f(r, g, b, 1.0)
    };
    Material::new(
        color(material.diffuse),
        color(material.specular),
        vec4f(0.0, 0.0, 0.0, 0.0),
        material.shininess.map(|s| s / 1000.0).unwrap_or(0.0),
    )
}
