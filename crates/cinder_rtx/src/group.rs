//! Aggregate of child hitables with a fallback material.

use std::ops::Shl;
use std::sync::Arc;

use cinder_core::Material;
use cinder_math::{Aabb, Ray};

use crate::hit::{HitRst, MaterialSlot};
use crate::hitable::Hitable;

/// Ordered list of children tested one after another.
///
/// The result of [`Group::ray_in`] is the result of the *last* child, in
/// insertion order, that reports a hit. It is not a nearest-hit search of its
/// own: callers get nearest-hit behaviour only from children that narrow the
/// ray on hit, as the built-in primitives do. Use [`crate::BvhNode`] when the
/// children cannot be trusted to narrow.
pub struct Group {
    children: Vec<Arc<dyn Hitable>>,
    slot: MaterialSlot,
    bbox: Aabb,
}

impl Group {
    pub fn new(material: Option<Arc<Material>>) -> Self {
        Self::with_slot(MaterialSlot::new(material))
    }

    pub fn with_slot(slot: MaterialSlot) -> Self {
        Self {
            children: Vec::new(),
            slot,
            bbox: Aabb::EMPTY,
        }
    }

    /// Append `child`; `None` is ignored. Grows the bounds, never shrinks them.
    pub fn push(&mut self, child: Option<Arc<dyn Hitable>>) -> &mut Self {
        if let Some(child) = child {
            self.bbox += child.bounding_box();
            self.children.push(child);
        }
        self
    }

    pub fn add(&mut self, child: Arc<dyn Hitable>) -> &mut Self {
        self.push(Some(child))
    }

    pub fn children(&self) -> &[Arc<dyn Hitable>] {
        &self.children
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl Default for Group {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Shl<Option<Arc<dyn Hitable>>> for Group {
    type Output = Group;

    fn shl(mut self, child: Option<Arc<dyn Hitable>>) -> Group {
        self.push(child);
        self
    }
}

impl Shl<Arc<dyn Hitable>> for Group {
    type Output = Group;

    fn shl(mut self, child: Arc<dyn Hitable>) -> Group {
        self.push(Some(child));
        self
    }
}

/// Appends a concrete hitable without a typed binding at the call site.
impl<H: Hitable + 'static> Shl<Arc<H>> for Group {
    type Output = Group;

    fn shl(mut self, child: Arc<H>) -> Group {
        self.push(Some(child));
        self
    }
}

impl Hitable for Group {
    fn ray_in(&self, ray: &mut Ray) -> HitRst {
        let mut final_rst = HitRst::invalid();

        for child in &self.children {
            let rst = child.ray_in(ray);
            if rst.hit {
                final_rst = rst;
            }
        }

        final_rst.cover_with(&self.slot);
        final_rst
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
    use crate::hit::HitRecord;
    use crate::Sphere;
    use cinder_math::Vec3;

    /// Reports a fixed result and never narrows the ray.
    struct Fixed {
        rst: HitRst,
        slot: MaterialSlot,
        bbox: Aabb,
    }

    impl Fixed {
        fn hit(t: f32, slot: MaterialSlot) -> Arc<dyn Hitable> {
            let record = HitRecord {
                t,
                ..Default::default()
            };
            Arc::new(Self {
                rst: HitRst::new(record, &slot),
                slot,
                bbox: Aabb::from_points(Vec3::ZERO, Vec3::ONE),
            })
        }

        fn miss(bbox: Aabb) -> Arc<dyn Hitable> {
            Arc::new(Self {
                rst: HitRst::invalid(),
                slot: MaterialSlot::none(),
                bbox,
            })
        }
    }

    impl Hitable for Fixed {
        fn ray_in(&self, _ray: &mut Ray) -> HitRst {
            self.rst.clone()
        }

        fn bounding_box(&self) -> Aabb {
            self.bbox
        }

        fn material_slot(&self) -> &MaterialSlot {
            &self.slot
        }
    }

    fn mat(name: &str) -> Arc<Material> {
        Arc::new(Material::new(name, Vec3::ONE))
    }

    fn axis_ray() -> Ray {
        Ray::new(Vec3::new(0.0, 0.0, -10.0), Vec3::Z)
    }

    fn boxed(lo: f32, hi: f32) -> Aabb {
        Aabb::from_points(Vec3::splat(lo), Vec3::splat(hi))
    }

    #[test]
    fn test_empty_group_misses() {
        let group = Group::default();

        let rst = group.ray_in(&mut axis_ray());
        assert!(!rst.hit);
        assert!(rst.material.is_none());
        assert!(!group.bounding_box().is_valid());
    }

    #[test]
    fn test_push_none_is_noop() {
        let mut group = Group::default();
        group.add(Fixed::miss(boxed(0.0, 1.0)));
        let before = group.bounding_box();

        group.push(None);

        assert_eq!(group.len(), 1);
        assert_eq!(group.bounding_box(), before);
    }

    #[test]
    fn test_bounds_are_union_regardless_of_order() {
        let a = boxed(0.0, 1.0);
        let b = boxed(5.0, 6.0);
        let c = Aabb::from_points(Vec3::new(-3.0, 2.0, 0.0), Vec3::new(-2.0, 8.0, 0.5));

        let mut forward = Group::default();
        let mut backward = Group::default();
        let mut last = Aabb::EMPTY;
        for bbox in [a, b, c] {
            forward.add(Fixed::miss(bbox));
            let grown = forward.bounding_box();
            // Monotonic: the previous box stays inside the new one
            assert_eq!(grown + last, grown);
            last = grown;
        }
        for bbox in [c, b, a] {
            backward.add(Fixed::miss(bbox));
        }

        assert_eq!(forward.bounding_box(), a + b + c);
        assert_eq!(backward.bounding_box(), forward.bounding_box());
    }

    #[test]
    fn test_chained_append() {
        let nothing: Option<Arc<dyn Hitable>> = None;
        let group = Group::default()
            << Fixed::miss(boxed(0.0, 1.0))
            << nothing
            << Fixed::miss(boxed(2.0, 3.0));

        assert_eq!(group.len(), 2);
        assert_eq!(group.bounding_box(), boxed(0.0, 3.0));

        let unit = Sphere::new(Vec3::ZERO, 1.0, MaterialSlot::none());
        let mixed = Group::default() << Arc::new(unit) << Arc::new(Group::default());
        assert_eq!(mixed.len(), 2);
        assert_eq!(mixed.bounding_box(), boxed(-1.0, 1.0));

        let mut by_ref = Group::default();
        by_ref.push(None).add(Fixed::miss(boxed(0.0, 1.0))).add(Fixed::miss(boxed(1.0, 2.0)));
        assert_eq!(by_ref.len(), 2);
    }

    // Last hit wins, even when an earlier child hit nearer. This mirrors the
    // composition rule exactly; nearest-hit only emerges from ray narrowing.
    #[test]
    fn test_last_hit_wins_not_nearest() {
        let near = mat("near");
        let far = mat("far");

        let mut group = Group::default();
        group
            .add(Fixed::hit(1.0, MaterialSlot::new(Some(near))))
            .add(Fixed::hit(9.0, MaterialSlot::new(Some(far.clone()))));

        let rst = group.ray_in(&mut axis_ray());

        assert!(rst.hit);
        assert_eq!(rst.record.t, 9.0);
        assert!(Arc::ptr_eq(rst.material.as_ref().unwrap(), &far));
    }

    #[test]
    fn test_coverable_then_fixed_returns_second() {
        let fixed = mat("fixed");

        let mut group = Group::default();
        group
            .add(Fixed::hit(7.0, MaterialSlot::none()))
            .add(Fixed::hit(3.0, MaterialSlot::new(Some(fixed.clone()))));

        let rst = group.ray_in(&mut axis_ray());

        assert_eq!(rst.record.t, 3.0);
        assert!(!rst.is_mat_coverable);
        assert!(Arc::ptr_eq(rst.material.as_ref().unwrap(), &fixed));
    }

    #[test]
    fn test_misses_do_not_overwrite_hits() {
        let mut group = Group::default();
        group
            .add(Fixed::hit(4.0, MaterialSlot::none()))
            .add(Fixed::miss(boxed(0.0, 1.0)));

        let rst = group.ray_in(&mut axis_ray());
        assert!(rst.hit);
        assert_eq!(rst.record.t, 4.0);
    }

    #[test]
    fn test_group_material_covers_coverable_child() {
        let group_mat = mat("group");
        let mut group = Group::with_slot(MaterialSlot::new(Some(group_mat.clone())).with_coverable(true));
        group.add(Fixed::hit(2.0, MaterialSlot::none()));

        let rst = group.ray_in(&mut axis_ray());

        assert!(Arc::ptr_eq(rst.material.as_ref().unwrap(), &group_mat));
        assert!(rst.is_mat_coverable);

        let mut locked = Group::new(Some(group_mat.clone()));
        locked.add(Fixed::hit(2.0, MaterialSlot::none()));
        let rst = locked.ray_in(&mut axis_ray());

        assert!(Arc::ptr_eq(rst.material.as_ref().unwrap(), &group_mat));
        assert!(!rst.is_mat_coverable);
    }

    #[test]
    fn test_group_material_keeps_fixed_child() {
        let child_mat = mat("child");
        let mut group = Group::new(Some(mat("group")));
        group.add(Fixed::hit(2.0, MaterialSlot::new(Some(child_mat.clone()))));

        let rst = group.ray_in(&mut axis_ray());

        assert!(Arc::ptr_eq(rst.material.as_ref().unwrap(), &child_mat));
    }

    #[test]
    fn test_nested_groups_inner_material_wins() {
        let inner_mat = mat("inner");
        let outer_mat = mat("outer");

        let mut inner = Group::new(Some(inner_mat.clone()));
        inner.add(Fixed::hit(2.0, MaterialSlot::none()));
        let mut outer = Group::new(Some(outer_mat));
        outer.add(Arc::new(inner));

        let rst = outer.ray_in(&mut axis_ray());
        assert!(Arc::ptr_eq(rst.material.as_ref().unwrap(), &inner_mat));
    }

    #[test]
    fn test_shared_child_in_two_groups() {
        let sphere: Arc<dyn Hitable> = Arc::new(Sphere::new(Vec3::ZERO, 1.0, MaterialSlot::none()));
        let red = mat("red");
        let blue = mat("blue");

        let mut a = Group::new(Some(red.clone()));
        a.add(sphere.clone());
        let mut b = Group::new(Some(blue.clone()));
        b.add(sphere.clone());

        let ra = a.ray_in(&mut axis_ray());
        let rb = b.ray_in(&mut axis_ray());

        assert!(Arc::ptr_eq(ra.material.as_ref().unwrap(), &red));
        assert!(Arc::ptr_eq(rb.material.as_ref().unwrap(), &blue));
        assert!((ra.record.t - 9.0).abs() < 1e-4);
    }

    #[test]
    fn test_narrowing_children_give_nearest_hit() {
        let mut group = Group::default();
        group
            .add(Arc::new(Sphere::new(Vec3::new(0.0, 0.0, 0.0), 1.0, MaterialSlot::none())))
            .add(Arc::new(Sphere::new(Vec3::new(0.0, 0.0, 5.0), 1.0, MaterialSlot::none())));

        let rst = group.ray_in(&mut axis_ray());
        assert!((rst.record.t - 9.0).abs() < 1e-4);
    }
}
