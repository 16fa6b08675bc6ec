use cgmath::Matrix4;

use super::vector::*;

///
/// ### Bounding Box
/// Axis aligned bounding box type
///
/// A freshly created box is inverted (min = +inf, max = -inf) so that it
/// acts as an absorbing identity for `include_*` operations.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Bbox {
    pub min: Vec3f32,
    pub max: Vec3f32,
}

impl Bbox {
    ///
    /// Create a new bounding box including nothing
    pub fn new() -> Bbox {
        Self {
            min: vec3f(f32::INFINITY, f32::INFINITY, f32::INFINITY),
            max: vec3f(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
        }
    }

    ///
    /// Create a bounding box from a given triangle
    pub fn from_triangle(v0: Vec3f32, v1: Vec3f32, v2: Vec3f32) -> Bbox {
        Self {
            min: v0.min(v1).min(v2),
            max: v0.max(v1).max(v2),
        }
    }

    /// Extend the bounding box to include the given vertex
    pub fn include_vertex(&mut self, v: Vec3f32) {
        self.min = self.min.min(v);
        self.max = self.max.max(v);
    }

    /// Extend the bounding box to include the given bounding box
    pub fn include_bbox(&mut self, other: &Bbox) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    /// Union of two bounding boxes
    pub fn combine(a: &Bbox, b: &Bbox) -> Bbox {
        Self {
            min: a.min.min(b.min),
            max: a.max.max(b.max),
        }
    }

    /// Get the center of the bounding box
    pub fn center(&self) -> Vec3f32 {
        (self.min + self.max) * 0.5
    }

    /// Get the extents of the bounding box
    pub fn extent(&self) -> Vec3f32 {
        self.max - self.min
    }

    /// Get the surface area of the bounding box
    pub fn area(&self) -> f32 {
        let d = self.extent();
        2.0 * (d.0 * d.1 + d.1 * d.2 + d.2 * d.0)
    }

    /// Get the longest axis of the bounding box as an index.
    /// On ties the later axis wins only when strictly greater,
    /// so equal extents resolve to x.
    pub fn longest_axis(&self) -> u32 {
        let d = self.extent();
        let mut result = 0;
        if d.1 > d[result] {
            result = 1;
        }
        if d.2 > d[result] {
            result = 2;
        }
        result
    }

    /// Position of a point relative to the box corners, as a
    /// per-axis fraction in [0, 1]. Axes with zero extent map to 0.
    pub fn offset(&self, p: Vec3f32) -> Vec3f32 {
        let d = self.extent();
        let mut o = p - self.min;
        for dim in 0..3 {
            o[dim] = if d[dim] > 0.0 { o[dim] / d[dim] } else { 0.0 };
        }
        o
    }

    /// Bounding box of this box transformed by the given matrix,
    /// computed by extending over all eight transformed corners
    pub fn transform(&self, matrix: &Matrix4<f32>) -> Bbox {
        let mut result = Bbox::new();
        for i in 0..8 {
            let corner = vec3f(
                if i & 1 == 0 { self.min.0 } else { self.max.0 },
                if i & 2 == 0 { self.min.1 } else { self.max.1 },
                if i & 4 == 0 { self.min.2 } else { self.max.2 },
            );
            let transformed =
                matrix * cgmath::Vector4::new(corner.0, corner.1, corner.2, 1.0);
            result.include_vertex(vec3f(transformed.x, transformed.y, transformed.z));
        }
        result
    }
}

impl Default for Bbox {
    fn default() -> Self {
        Self::new()
    }
}
