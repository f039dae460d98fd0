//! Sphere primitive for ray tracing.

use std::f32::consts::PI;

use cinder_math::{Aabb, Ray, Vec3};

use crate::hit::{HitRecord, HitRst, MaterialSlot};
use crate::hitable::Hitable;

pub struct Sphere {
    center: Vec3,
    radius: f32,
    slot: MaterialSlot,
    bbox: Aabb,
}

impl Sphere {
    pub fn new(center: Vec3, radius: f32, slot: MaterialSlot) -> Self {
        let radius = radius.max(0.0);
        let rvec = Vec3::splat(radius);
        let bbox = Aabb::from_points(center - rvec, center + rvec);

        Self {
            center,
            radius,
            slot,
            bbox,
        }
    }

    /// UV of a point on the unit sphere: u around +Y from +X, v down from +Y.
    fn sphere_uv(p: Vec3) -> (f32, f32) {
        let theta = (-p.y).acos();
        let phi = (-p.z).atan2(p.x) + PI;

        (phi / (2.0 * PI), theta / PI)
    }
}

impl Hitable for Sphere {
    fn ray_in(&self, ray: &mut Ray) -> HitRst {
        // A point has no surface to hit
        if self.radius <= 0.0 {
            return HitRst::invalid();
        }

        let oc = self.center - ray.origin;
        let a = ray.direction.length_squared();
        let h = ray.direction.dot(oc);
        let c = oc.length_squared() - self.radius * self.radius;

        let discriminant = h * h - a * c;
        if discriminant < 0.0 {
            return HitRst::invalid();
        }

        let sqrtd = discriminant.sqrt();

        // Find the nearest root in the acceptable range
        let mut root = (h - sqrtd) / a;
        if !ray.t.surrounds(root) {
            root = (h + sqrtd) / a;
            if !ray.t.surrounds(root) {
                return HitRst::invalid();
            }
        }

        let mut record = HitRecord {
            t: root,
            point: ray.at(root),
            ..Default::default()
        };
        let outward_normal = (record.point - self.center) / self.radius;
        record.set_face_normal(ray, outward_normal);
        (record.u, record.v) = Self::sphere_uv(outward_normal);

        ray.set_t_max(root);
        HitRst::new(record, &self.slot)
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }

    fn material_slot(&self) -> &MaterialSlot {
        &self.slot
    }
}
