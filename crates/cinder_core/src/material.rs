//! Surface material definitions shared by the ray tracer and the viewport.

use cinder_math::Vec3;

/// Surface material.
///
/// Materials are shared through `Arc<Material>`; identity (not value) is what
/// the ray tracer propagates when an aggregate overrides a child's material.
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    /// Material name, for logs and debugging
    pub name: String,

    /// Diffuse/albedo color (RGB, 0-1)
    pub diffuse_color: Vec3,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: String::new(),
            diffuse_color: Vec3::new(0.5, 0.5, 0.5),
        }
    }
}

impl Material {
    /// Create a material from a name and a diffuse color.
    pub fn new(name: impl Into<String>, diffuse_color: Vec3) -> Self {
        Self {
            name: name.into(),
            diffuse_color,
        }
    }
}
