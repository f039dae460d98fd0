use crate::{Interval, Vec3};

/// Smallest parameter a new ray accepts, avoids self-intersection acne.
pub const DEFAULT_T_MIN: f32 = 1e-3;

/// A ray with an origin, a direction and a valid parametric range.
///
/// Intersection routines only report hits with `t` strictly inside `t`.
/// Primitives may shrink `t.max` to the distance of the hit they report, so
/// that later tests along the same ray only accept nearer surfaces.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    pub t: Interval,
}

impl Ray {
    /// Ray valid over `[DEFAULT_T_MIN, +inf)`.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self::with_range(origin, direction, Interval::new(DEFAULT_T_MIN, f32::INFINITY))
    }

    pub fn with_range(origin: Vec3, direction: Vec3, t: Interval) -> Self {
        Self {
            origin,
            direction,
            t,
        }
    }

    #[inline]
    pub fn t_min(&self) -> f32 {
        self.t.min
    }

    #[inline]
    pub fn t_max(&self) -> f32 {
        self.t.max
    }

    /// Narrow the valid range to end at `t`. Never widens it.
    pub fn set_t_max(&mut self, t: f32) {
        self.t.max = self.t.max.min(t);
    }

    /// origin + t * direction
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}
