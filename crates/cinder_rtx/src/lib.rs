//! Cinder RTX - ray intersection core
//!
//! Hitables compose into groups; a group reports the last child hit in
//! insertion order and may override its children's materials. Primitives
//! shrink the ray on every hit, so later children only qualify when nearer.
//! [`BvhNode`] gives a true nearest-hit search for large child lists.

mod bvh;
mod camera;
mod caster;
mod group;
mod hit;
mod hitable;
mod instance;
mod sphere;
mod triangle;
mod world;

pub use bvh::BvhNode;
pub use camera::Camera;
pub use caster::{CastConfig, DepthBuffer, DepthCaster, DepthSample};
pub use group::Group;
pub use hit::{HitRecord, HitRst, MaterialSlot};
pub use hitable::Hitable;
pub use instance::Instance;
pub use sphere::Sphere;
pub use triangle::Triangle;
pub use world::{build_world, WorldBuilder};

/// Re-export Vec3 and common math types from cinder_math
pub use cinder_math::{Aabb, Interval, Ray, Vec3};
