//! Scene objects: nodes of the scene graph and their components.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

use cinder_math::{Mat4, Mat4Ext, Vec3};

use crate::error::SceneError;
use crate::light::{Light, LightComponent};
use crate::material::Material;
use crate::primitive::Primitive;
use crate::transform::Transform;
use crate::visit::Visitor;

/// Geometry component: wraps the drawable primitive of an object.
///
/// A component may exist without a primitive (e.g. while an asset loads).
/// The material, when set, applies to this object and to descendants that
/// carry none of their own.
#[derive(Debug, Clone, Default)]
pub struct Geometry {
    pub primitive: Option<Arc<dyn Primitive>>,
    pub material: Option<Arc<Material>>,
}

impl Geometry {
    pub fn new(primitive: Arc<dyn Primitive>) -> Self {
        Self {
            primitive: Some(primitive),
            material: None,
        }
    }

    pub fn with_material(mut self, material: Arc<Material>) -> Self {
        self.material = Some(material);
        self
    }
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// A node of the scene graph.
///
/// Objects are shared through `Arc`. Children are owned by their parent, the
/// parent link is weak. Components (transform, geometry, lights) are optional.
#[derive(Debug)]
pub struct SceneObject {
    name: String,
    parent: RwLock<Weak<SceneObject>>,
    children: RwLock<Vec<Arc<SceneObject>>>,
    transform: RwLock<Option<Transform>>,
    geometry: RwLock<Option<Geometry>>,
    lights: RwLock<Vec<Arc<LightComponent>>>,
}

impl SceneObject {
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            parent: RwLock::new(Weak::new()),
            children: RwLock::new(Vec::new()),
            transform: RwLock::new(None),
            geometry: RwLock::new(None),
            lights: RwLock::new(Vec::new()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<Arc<SceneObject>> {
        read(&self.parent).upgrade()
    }

    /// Snapshot of the children, so traversals hold no lock while recursing.
    pub fn children(&self) -> Vec<Arc<SceneObject>> {
        read(&self.children).clone()
    }

    pub fn child_count(&self) -> usize {
        read(&self.children).len()
    }

    /// Attach `child`, detaching it from any previous parent.
    ///
    /// Fails if `child` is this object or one of its ancestors.
    pub fn add_child(self: &Arc<Self>, child: Arc<SceneObject>) -> Result<(), SceneError> {
        let mut ancestor = Some(self.clone());
        while let Some(node) = ancestor {
            if Arc::ptr_eq(&node, &child) {
                return Err(SceneError::CyclicHierarchy {
                    parent: self.name.clone(),
                    child: child.name.clone(),
                });
            }
            ancestor = node.parent();
        }

        if let Some(old_parent) = child.parent() {
            old_parent.remove_child(&child);
        }

        *write(&child.parent) = Arc::downgrade(self);
        write(&self.children).push(child);
        Ok(())
    }

    pub fn remove_child(&self, child: &Arc<SceneObject>) -> bool {
        let mut children = write(&self.children);
        let Some(index) = children.iter().position(|c| Arc::ptr_eq(c, child)) else {
            return false;
        };
        children.remove(index);
        *write(&child.parent) = Weak::new();
        true
    }

    pub fn transform(&self) -> Option<Transform> {
        *read(&self.transform)
    }

    pub fn set_transform(&self, transform: Transform) {
        *write(&self.transform) = Some(transform);
    }

    pub fn geometry(&self) -> Option<Geometry> {
        read(&self.geometry).clone()
    }

    pub fn set_geometry(&self, geometry: Geometry) {
        *write(&self.geometry) = Some(geometry);
    }

    /// The drawable primitive, if the object has geometry that carries one.
    pub fn primitive(&self) -> Option<Arc<dyn Primitive>> {
        read(&self.geometry)
            .as_ref()
            .and_then(|g| g.primitive.clone())
    }

    pub fn add_light(self: &Arc<Self>, light: Light) -> Arc<LightComponent> {
        let component = Arc::new(LightComponent::new(Arc::downgrade(self), light));
        write(&self.lights).push(component.clone());
        component
    }

    pub fn remove_light(&self, light: &Arc<LightComponent>) -> bool {
        let mut lights = write(&self.lights);
        let before = lights.len();
        lights.retain(|l| !Arc::ptr_eq(l, light));
        lights.len() != before
    }

    pub fn lights(&self) -> Vec<Arc<LightComponent>> {
        read(&self.lights).clone()
    }

    pub fn material(&self) -> Option<Arc<Material>> {
        read(&self.geometry)
            .as_ref()
            .and_then(|g| g.material.clone())
    }

    /// Local matrix, identity when the object has no transform component.
    pub fn local_matrix(&self) -> Mat4 {
        self.transform()
            .map_or(Mat4::IDENTITY, |t| t.to_matrix())
    }

    /// Product of the local matrices from the root down to this object.
    pub fn world_matrix(&self) -> Mat4 {
        let local = self.local_matrix();
        match self.parent() {
            Some(parent) => parent.world_matrix() * local,
            None => local,
        }
    }

    pub fn world_position(&self) -> Vec3 {
        self.world_matrix().origin()
    }

    pub fn accept<V: Visitor>(&self, visitor: &mut V) -> bool {
        visitor.visit(self)
    }
}
