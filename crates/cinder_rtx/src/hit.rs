//! Intersection results and the material slot every hitable carries.

use std::sync::Arc;

use cinder_core::Material;
use cinder_math::{Ray, Vec3};

/// Surface data at a ray/object intersection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitRecord {
    /// Ray parameter of the intersection
    pub t: f32,
    pub point: Vec3,
    /// Surface normal, always facing against the ray
    pub normal: Vec3,
    pub u: f32,
    pub v: f32,
    /// Whether the ray hit the front face (outside) of the surface
    pub front_face: bool,
}

impl Default for HitRecord {
    fn default() -> Self {
        Self {
            t: f32::INFINITY,
            point: Vec3::ZERO,
            normal: Vec3::ZERO,
            u: 0.0,
            v: 0.0,
            front_face: false,
        }
    }
}

impl HitRecord {
    /// Orient `outward_normal` against the ray and remember which side was hit.
    pub fn set_face_normal(&mut self, ray: &Ray, outward_normal: Vec3) {
        self.front_face = ray.direction.dot(outward_normal) < 0.0;
        self.normal = if self.front_face {
            outward_normal
        } else {
            -outward_normal
        };
    }
}

/// Outcome of testing a ray against a [`Hitable`](crate::Hitable).
///
/// Built fresh per test. Aggregates may only rewrite `material` and
/// `is_mat_coverable`.
#[derive(Debug, Clone)]
pub struct HitRst {
    pub hit: bool,
    pub record: HitRecord,
    pub material: Option<Arc<Material>>,
    /// Whether an enclosing aggregate may replace `material` with its own.
    pub is_mat_coverable: bool,
}

impl HitRst {
    /// The no-hit sentinel.
    pub fn invalid() -> Self {
        Self {
            hit: false,
            record: HitRecord::default(),
            material: None,
            is_mat_coverable: true,
        }
    }

    /// A hit carrying the material of `slot`.
    pub fn new(record: HitRecord, slot: &MaterialSlot) -> Self {
        Self {
            hit: true,
            record,
            material: slot.material.clone(),
            is_mat_coverable: slot.coverable,
        }
    }

    /// Let an aggregate owning `slot` impose its material on this result.
    ///
    /// Applies only to hits whose material is coverable, and only when the
    /// aggregate has a material. The aggregate's own coverable flag then
    /// decides whether an outer aggregate may override again.
    pub fn cover_with(&mut self, slot: &MaterialSlot) {
        if !(self.hit && self.is_mat_coverable) {
            return;
        }
        if let Some(material) = &slot.material {
            self.material = Some(material.clone());
            self.is_mat_coverable = slot.coverable;
        }
    }
}

impl Default for HitRst {
    fn default() -> Self {
        Self::invalid()
    }
}

/// Optional material of a hitable plus its coverable flag.
#[derive(Debug, Clone)]
pub struct MaterialSlot {
    material: Option<Arc<Material>>,
    coverable: bool,
}

impl MaterialSlot {
    pub const NONE: MaterialSlot = MaterialSlot {
        material: None,
        coverable: true,
    };

    /// No material; hits are open to any enclosing material.
    pub fn none() -> Self {
        Self::NONE
    }

    /// Coverable exactly when no material is given.
    pub fn new(material: Option<Arc<Material>>) -> Self {
        let coverable = material.is_none();
        Self {
            material,
            coverable,
        }
    }

    pub fn with_coverable(mut self, coverable: bool) -> Self {
        self.coverable = coverable;
        self
    }

    pub fn material(&self) -> Option<&Arc<Material>> {
        self.material.as_ref()
    }

    pub fn is_coverable(&self) -> bool {
        self.coverable
    }
}

impl Default for MaterialSlot {
    fn default() -> Self {
        Self::none()
    }
}

impl From<Arc<Material>> for MaterialSlot {
    fn from(material: Arc<Material>) -> Self {
        Self::new(Some(material))
    }
}
