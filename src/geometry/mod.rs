//! Geometry utilities: the anchor transform and its conventions.

pub mod transform;

pub use transform::AnchorTransform;
