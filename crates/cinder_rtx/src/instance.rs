//! A shared hitable placed in the world by a transform.
//!
//! The prototype stays in its local space; rays are moved into that space
//! instead. The local direction is not renormalized, so `t` means the same
//! distance along the world ray and narrowing carries over unchanged.

use std::sync::Arc;

use cinder_math::{Aabb, Mat4, Mat4Ext, Ray};

use crate::hit::{HitRst, MaterialSlot};
use crate::hitable::Hitable;

pub struct Instance {
    object: Arc<dyn Hitable>,
    /// Local-to-world
    transform: Mat4,
    /// World-to-local
    inv_transform: Mat4,
    bbox: Aabb,
    slot: MaterialSlot,
}

impl Instance {
    pub fn new(object: Arc<dyn Hitable>, transform: Mat4, slot: MaterialSlot) -> Self {
        let bbox = transform.transform_aabb(&object.bounding_box());
        Self {
            object,
            transform,
            inv_transform: transform.inverse(),
            bbox,
            slot,
        }
    }

    pub fn transform(&self) -> Mat4 {
        self.transform
    }

    pub fn object(&self) -> &Arc<dyn Hitable> {
        &self.object
    }
}

impl Hitable for Instance {
    fn ray_in(&self, ray: &mut Ray) -> HitRst {
        if !self.bbox.hit(ray, ray.t) {
            return HitRst::invalid();
        }

        let mut local_ray = Ray::with_range(
            self.inv_transform.transform_point3(ray.origin),
            self.inv_transform.transform_vector3(ray.direction),
            ray.t,
        );

        let mut rst = self.object.ray_in(&mut local_ray);
        if !rst.hit {
            return rst;
        }

        ray.set_t_max(local_ray.t_max());
        rst.record.point = self.transform.transform_point3(rst.record.point);
        rst.record.normal = self.transform.transform_normal(rst.record.normal);
        rst.cover_with(&self.slot);
        rst
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }

    fn material_slot(&self) -> &MaterialSlot {
        &self.slot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Sphere, Triangle};
    use cinder_core::Material;
    use cinder_math::Vec3;

    fn unit_sphere() -> Arc<dyn Hitable> {
        Arc::new(Sphere::new(Vec3::ZERO, 1.0, MaterialSlot::none()))
    }

    #[test]
    fn test_identity_matches_prototype() {
        let instance = Instance::new(unit_sphere(), Mat4::IDENTITY, MaterialSlot::none());

        let mut ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), -Vec3::Z);
        let rst = instance.ray_in(&mut ray);

        assert!(rst.hit);
        assert!((rst.record.t - 4.0).abs() < 1e-4);
        assert!((ray.t_max() - 4.0).abs() < 1e-4);
    }

    #[test]
    fn test_translated_and_scaled_instance() {
        let transform = Mat4::from_translation(Vec3::new(10.0, 0.0, 0.0)) * Mat4::from_scale(Vec3::splat(2.0));
        let instance = Instance::new(unit_sphere(), transform, MaterialSlot::none());

        let bbox = instance.bounding_box();
        assert!((bbox.x.min - 8.0).abs() < 1e-3);
        assert!((bbox.x.max - 12.0).abs() < 1e-3);

        let mut ray = Ray::new(Vec3::new(10.0, 0.0, 10.0), -Vec3::Z);
        let rst = instance.ray_in(&mut ray);

        assert!(rst.hit);
        // World distance: 10 - radius 2
        assert!((rst.record.t - 8.0).abs() < 1e-3);
        assert!((rst.record.point - Vec3::new(10.0, 0.0, 2.0)).length() < 1e-3);
        assert!((rst.record.normal - Vec3::Z).length() < 1e-3);

        let mut miss = Ray::new(Vec3::ZERO, -Vec3::Z);
        assert!(!instance.ray_in(&mut miss).hit);
    }

    #[test]
    fn test_instances_share_prototype() {
        let tri: Arc<dyn Hitable> = Arc::new(Triangle::new(
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            MaterialSlot::none(),
        ));

        let near = Instance::new(tri.clone(), Mat4::from_translation(Vec3::new(0.0, 0.0, -2.0)), MaterialSlot::none());
        let far = Instance::new(tri.clone(), Mat4::from_translation(Vec3::new(0.0, 0.0, -6.0)), MaterialSlot::none());

        let mut ray = Ray::new(Vec3::ZERO, -Vec3::Z);
        let first = near.ray_in(&mut ray);
        let second = far.ray_in(&mut ray);

        assert!(first.hit);
        assert!((first.record.t - 2.0).abs() < 1e-4);
        // The narrowed ray no longer reaches the far copy
        assert!(!second.hit);
        assert_eq!(Arc::strong_count(&tri), 3);
    }

    #[test]
    fn test_instance_material_covers_prototype() {
        let mat = Arc::new(Material::new("paint", Vec3::X));
        let instance = Instance::new(unit_sphere(), Mat4::IDENTITY, MaterialSlot::from(mat.clone()));

        let mut ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), -Vec3::Z);
        let rst = instance.ray_in(&mut ray);

        assert!(Arc::ptr_eq(rst.material.as_ref().unwrap(), &mat));
    }
}
