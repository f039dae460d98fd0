//! The capability every ray-testable object implements.

use std::sync::Arc;

use cinder_core::Material;
use cinder_math::{Aabb, Ray};

use crate::hit::{HitRst, MaterialSlot};

/// Anything a ray can be tested against.
///
/// Objects are shared as `Arc<dyn Hitable>`, so one primitive may sit in
/// several aggregates at once.
pub trait Hitable: Send + Sync {
    /// Test `ray` against this object (and, for aggregates, every descendant).
    ///
    /// Returns [`HitRst::invalid`] when nothing qualifies within the ray's
    /// valid range. Implementations may shrink `ray.t.max` to the distance of
    /// the hit they report; they never touch anything else on the ray.
    fn ray_in(&self, ray: &mut Ray) -> HitRst;

    /// Current spatial bound. Aggregates return the union of their children.
    fn bounding_box(&self) -> Aabb;

    fn material_slot(&self) -> &MaterialSlot;

    fn material(&self) -> Option<&Arc<Material>> {
        self.material_slot().material()
    }

    /// Whether an enclosing aggregate may override this object's material.
    fn is_mat_coverable(&self) -> bool {
        self.material_slot().is_coverable()
    }
}
