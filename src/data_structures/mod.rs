pub mod accobj;
pub mod bbox;
pub mod bvh;
pub mod flatten;
pub mod vector;
