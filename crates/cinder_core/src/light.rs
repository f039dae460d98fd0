//! Light components attached to scene objects.

use std::sync::{Arc, Weak};

use cinder_math::Vec3;

use crate::object::SceneObject;

/// Omnidirectional light at its owner's world position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub color: Vec3,
    pub intensity: f32,
    pub linear: f32,
    pub quadratic: f32,
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            color: Vec3::ONE,
            intensity: 1.0,
            linear: 0.7,
            quadratic: 1.8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub color: Vec3,
    pub intensity: f32,
    pub direction: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpotLight {
    pub color: Vec3,
    pub intensity: f32,
    pub direction: Vec3,
    /// Half angle of the cone, radians
    pub angle: f32,
}

/// Concrete light payload of a [`LightComponent`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Light {
    Point(PointLight),
    Directional(DirectionalLight),
    Spot(SpotLight),
}

/// A light attached to a scene object.
///
/// Created by [`SceneObject::add_light`]; holds a weak back-reference to its
/// owner so the component never keeps the object alive.
#[derive(Debug)]
pub struct LightComponent {
    owner: Weak<SceneObject>,
    pub light: Light,
}

impl LightComponent {
    pub(crate) fn new(owner: Weak<SceneObject>, light: Light) -> Self {
        Self { owner, light }
    }

    pub fn owner(&self) -> Option<Arc<SceneObject>> {
        self.owner.upgrade()
    }

    pub fn as_point(&self) -> Option<&PointLight> {
        match &self.light {
            Light::Point(point) => Some(point),
            _ => None,
        }
    }

    pub fn is_point(&self) -> bool {
        self.as_point().is_some()
    }

    /// World position of the owning object, `None` once the owner is gone.
    pub fn world_position(&self) -> Option<Vec3> {
        self.owner().map(|owner| owner.world_position())
    }
}

/// Non-owning handle to a light component.
///
/// Lets caches keyed by light survive scene teardown: once the component is
/// dropped the handle reports itself expired instead of keeping it alive.
#[derive(Debug, Clone)]
pub struct LightRef(Weak<LightComponent>);

impl LightRef {
    pub fn new(light: &Arc<LightComponent>) -> Self {
        Self(Arc::downgrade(light))
    }

    pub fn is_expired(&self) -> bool {
        self.0.strong_count() == 0
    }

    pub fn resolve(&self) -> Option<Arc<LightComponent>> {
        self.0.upgrade()
    }

    /// Whether this handle was taken from `light`.
    ///
    /// The weak count keeps the allocation reserved, so an expired handle
    /// never compares equal to a newer component.
    pub fn refers_to(&self, light: &Arc<LightComponent>) -> bool {
        std::ptr::eq(self.0.as_ptr(), Arc::as_ptr(light))
    }
}
