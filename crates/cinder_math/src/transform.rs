// Transform helpers for Mat4 used by instancing and scene traversal.

use glam::{Mat4, Vec3};

use crate::Aabb;

/// Extension trait for Mat4 covering what glam does not provide directly.
pub trait Mat4Ext {
    /// Bounding box of all 8 transformed corners of `aabb`.
    fn transform_aabb(&self, aabb: &Aabb) -> Aabb;

    /// Transform a surface normal (inverse transpose), result normalized.
    fn transform_normal(&self, normal: Vec3) -> Vec3;

    /// World-space position of the local origin.
    fn origin(&self) -> Vec3;
}

impl Mat4Ext for Mat4 {
    fn transform_aabb(&self, aabb: &Aabb) -> Aabb {
        if !aabb.is_valid() {
            return Aabb::EMPTY;
        }

        let lo = aabb.min_point();
        let hi = aabb.max_point();

        let mut result_min = Vec3::splat(f32::INFINITY);
        let mut result_max = Vec3::splat(f32::NEG_INFINITY);
        for i in 0..8 {
            let corner = Vec3::new(
                if i & 1 == 0 { lo.x } else { hi.x },
                if i & 2 == 0 { lo.y } else { hi.y },
                if i & 4 == 0 { lo.z } else { hi.z },
            );
            let p = self.transform_point3(corner);
            result_min = result_min.min(p);
            result_max = result_max.max(p);
        }

        Aabb::from_points(result_min, result_max)
    }

    fn transform_normal(&self, normal: Vec3) -> Vec3 {
        self.inverse()
            .transpose()
            .transform_vector3(normal)
            .normalize_or_zero()
    }

    fn origin(&self) -> Vec3 {
        self.w_axis.truncate()
    }
}
