/// Acceleration structure core for a GPU path tracer: builds a two-level
/// bounding volume hierarchy (one bottom-level tree per submesh instance,
/// one top level over their world-space bounds) and linearizes both into
/// the flat, index-addressed arrays a traversal kernel consumes.
pub mod accel;
pub mod data_structures;
pub mod material;
pub mod mesh;
pub mod scene;

pub use accel::{AccelStructures, TransformPair};
pub use data_structures::accobj::SplitMethod;
pub use scene::{ObjectId, Rebuild, Scene};
