use strum_macros::EnumIter;

use super::bbox::Bbox;
use super::vector::Vec3f32;

/// Intermediate data structure to pass
/// indexed bounding boxes to the BVH builder
///
/// Each index points towards the primitive the bbox was computed from:
/// a triangle for a bottom-level build, an instance for a top-level build.
/// The centroid is cached since the builder reads it many times.
#[derive(Debug, Copy, Clone)]
pub struct AccObj {
    pub idx: u32,
    pub bbox: Bbox,
    pub center: Vec3f32,
}

impl AccObj {
    pub fn new(idx: u32, bbox: Bbox) -> Self {
        let center = bbox.center();
        Self { idx, bbox, center }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Split {
    AxisX = 0,
    AxisY = 1,
    AxisZ = 2,
}

impl From<u32> for Split {
    fn from(value: u32) -> Self {
        match value {
            0 => Split::AxisX,
            1 => Split::AxisY,
            2 => Split::AxisZ,
            _ => panic!("unexpected input {value}"),
        }
    }
}

/// How the builder picks split points
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, EnumIter)]
pub enum SplitMethod {
    /// Sort by centroid and cut at the median
    Midpoint,
    /// Binned surface area heuristic
    #[default]
    Sah,
}
