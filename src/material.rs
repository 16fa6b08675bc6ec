use crate::data_structures::vector::{vec4f, Vec4f32};

/// Surface description shipped to the shading kernel, one entry per
/// registered submesh. Texture slots are opaque indices into whatever atlas
/// the texture collaborator maintains; `-1` means "no texture".
#[repr(C, align(16))]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Material {
    pub albedo: Vec4f32,
    pub specular: Vec4f32,
    pub emission: Vec4f32,
    pub smoothness: f32,
    pub albedo_tex_idx: i32,
    pub normal_tex_idx: i32,
    _padding: i32,
}

static_assertions::assert_eq_size!(Material, [u32; 16]);

impl Material {
    pub fn new(albedo: Vec4f32, specular: Vec4f32, emission: Vec4f32, smoothness: f32) -> Self {
        Self {
            albedo,
            specular,
            emission,
            smoothness,
            albedo_tex_idx: -1,
            normal_tex_idx: -1,
            _padding: 0,
        }
    }

    /// Matte gray placeholder for submeshes registered without a material
    pub fn lambertian_gray() -> Self {
        Self::new(
            vec4f(0.8, 0.8, 0.8, 1.0),
            vec4f(0.0, 0.0, 0.0, 1.0),
            vec4f(0.0, 0.0, 0.0, 0.0),
            0.0,
        )
    }

    pub fn with_albedo_texture(mut self, slot: i32) -> Self {
        self.albedo_tex_idx = slot;
        self
    }

    pub fn with_normal_texture(mut self, slot: i32) -> Self {
        self.normal_tex_idx = slot;
        self
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::lambertian_gray()
    }
}
