//! Triangle primitive for ray tracing.
//!
//! Uses the Möller-Trumbore algorithm for ray-triangle intersection.

use cinder_math::{Aabb, Ray, Vec3};

use crate::hit::{HitRecord, HitRst, MaterialSlot};
use crate::hitable::Hitable;

pub struct Triangle {
    v0: Vec3,
    v1: Vec3,
    v2: Vec3,
    /// Pre-computed face normal (unit length, CCW front)
    normal: Vec3,
    slot: MaterialSlot,
    bbox: Aabb,
}

impl Triangle {
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3, slot: MaterialSlot) -> Self {
        let normal = (v1 - v0).cross(v2 - v0).normalize_or_zero();
        let bbox = Aabb::from_points(v0.min(v1).min(v2), v0.max(v1).max(v2));

        Self {
            v0,
            v1,
            v2,
            normal,
            slot,
            bbox,
        }
    }
}

impl Hitable for Triangle {
    fn ray_in(&self, ray: &mut Ray) -> HitRst {
        let edge1 = self.v1 - self.v0;
        let edge2 = self.v2 - self.v0;

        let h = ray.direction.cross(edge2);
        let a = edge1.dot(h);

        // Ray is parallel to triangle
        if a.abs() < 1e-8 {
            return HitRst::invalid();
        }

        let f = 1.0 / a;
        let s = ray.origin - self.v0;
        let u = f * s.dot(h);
        if !(0.0..=1.0).contains(&u) {
            return HitRst::invalid();
        }

        let q = s.cross(edge1);
        let v = f * ray.direction.dot(q);
        if v < 0.0 || u + v > 1.0 {
            return HitRst::invalid();
        }

        let t = f * edge2.dot(q);
        if !ray.t.surrounds(t) {
            return HitRst::invalid();
        }

        let mut record = HitRecord {
            t,
            point: ray.at(t),
            u,
            v,
            ..Default::default()
        };
        record.set_face_normal(ray, self.normal);

        ray.set_t_max(t);
        HitRst::new(record, &self.slot)
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }

    fn material_slot(&self) -> &MaterialSlot {
        &self.slot
    }
}
