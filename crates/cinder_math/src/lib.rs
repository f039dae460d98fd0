//! Cinder math - vectors, intervals, bounding boxes and rays.
//!
//! Thin layer over `glam` with the few types the ray tracer and the
//! scene passes share.

// Re-export glam for convenience
pub use glam::*;

mod aabb;
mod interval;
mod ray;
mod transform;

pub use aabb::Aabb;
pub use interval::Interval;
pub use ray::Ray;
pub use transform::Mat4Ext;
