//! Bounding Volume Hierarchy (BVH) acceleration structure.
//!
//! A binary tree over shared hitables. Unlike [`crate::Group`] it is a true
//! nearest-hit search: it keeps the closest result and narrows the ray itself,
//! so it does not depend on its children narrowing.

use std::sync::Arc;

use cinder_math::{Aabb, Ray};

use crate::hit::{HitRst, MaterialSlot};
use crate::hitable::Hitable;

/// Maximum primitives per leaf node before splitting.
const LEAF_MAX_SIZE: usize = 4;

static NO_MATERIAL: MaterialSlot = MaterialSlot::NONE;

/// BVH node - either a branch with two children or a leaf with primitives.
pub enum BvhNode {
    Branch {
        left: Box<BvhNode>,
        right: Box<BvhNode>,
        bbox: Aabb,
    },
    Leaf {
        objects: Vec<Arc<dyn Hitable>>,
        bbox: Aabb,
    },
    Empty,
}

impl BvhNode {
    pub fn new(objects: Vec<Arc<dyn Hitable>>) -> Self {
        if objects.is_empty() {
            return BvhNode::Empty;
        }
        Self::build(objects)
    }

    /// Median split on the longest axis of the centroid bounds.
    fn build(mut objects: Vec<Arc<dyn Hitable>>) -> Self {
        let bounds = objects
            .iter()
            .fold(Aabb::EMPTY, |acc, o| acc + o.bounding_box());

        if objects.len() <= LEAF_MAX_SIZE {
            return BvhNode::Leaf {
                objects,
                bbox: bounds,
            };
        }

        let centroid_bounds = objects.iter().fold(Aabb::EMPTY, |acc, obj| {
            let c = obj.bounding_box().centroid();
            acc + Aabb::from_points(c, c)
        });
        let axis = centroid_bounds.longest_axis();

        objects.sort_unstable_by(|a, b| {
            let a_val = a.bounding_box().centroid()[axis];
            let b_val = b.bounding_box().centroid()[axis];
            a_val.total_cmp(&b_val)
        });

        let right_objects = objects.split_off(objects.len() / 2);
        let left = Self::build(objects);
        let right = Self::build(right_objects);

        BvhNode::Branch {
            left: Box::new(left),
            right: Box::new(right),
            bbox: bounds,
        }
    }

    /// Number of leaf primitives below this node.
    pub fn primitive_count(&self) -> usize {
        match self {
            BvhNode::Empty => 0,
            BvhNode::Leaf { objects, .. } => objects.len(),
            BvhNode::Branch { left, right, .. } => left.primitive_count() + right.primitive_count(),
        }
    }
}

/// Keep whichever of `best` and `candidate` is nearer, narrowing the ray.
fn keep_nearest(best: &mut HitRst, candidate: HitRst, ray: &mut Ray) {
    if candidate.hit && (!best.hit || candidate.record.t < best.record.t) {
        ray.set_t_max(candidate.record.t);
        *best = candidate;
    }
}

impl Hitable for BvhNode {
    fn ray_in(&self, ray: &mut Ray) -> HitRst {
        match self {
            BvhNode::Empty => HitRst::invalid(),

            BvhNode::Leaf { objects, bbox } => {
                if !bbox.hit(ray, ray.t) {
                    return HitRst::invalid();
                }

                let mut best = HitRst::invalid();
                for obj in objects {
                    let rst = obj.ray_in(ray);
                    keep_nearest(&mut best, rst, ray);
                }
                best
            }

            BvhNode::Branch { left, right, bbox } => {
                if !bbox.hit(ray, ray.t) {
                    return HitRst::invalid();
                }

                let mut best = left.ray_in(ray);
                let rst = right.ray_in(ray);
                keep_nearest(&mut best, rst, ray);
                best
            }
        }
    }

    fn bounding_box(&self) -> Aabb {
        match self {
            BvhNode::Empty => Aabb::EMPTY,
            BvhNode::Leaf { bbox, .. } => *bbox,
            BvhNode::Branch { bbox, .. } => *bbox,
        }
    }

    fn material_slot(&self) -> &MaterialSlot {
        &NO_MATERIAL
    }
}
