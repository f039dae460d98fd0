//! Drawable primitives carried by a scene object's geometry component.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use cinder_math::{Aabb, Vec3};

use crate::mesh::Mesh;
use crate::visit::Visitor;

/// Anything a geometry component can hold.
///
/// Implementors are visited by their concrete type, so a pass that does not
/// register a handler for a primitive type simply ignores it.
pub trait Primitive: Any + Send + Sync + fmt::Debug {
    fn as_any(&self) -> &dyn Any;

    /// Bounds in the owning object's local space.
    fn local_bounds(&self) -> Aabb;
}

impl dyn Primitive {
    pub fn accept<V: Visitor>(&self, visitor: &mut V) -> bool {
        visitor.visit(self.as_any())
    }
}

/// Unit sphere centred at the origin; scale it with the object transform.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Sphere;

impl Primitive for Sphere {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn local_bounds(&self) -> Aabb {
        Aabb::from_points(Vec3::splat(-1.0), Vec3::splat(1.0))
    }
}

/// Unit square in the XZ plane facing +Y.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Plane;

impl Primitive for Plane {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn local_bounds(&self) -> Aabb {
        Aabb::from_points(Vec3::new(-0.5, 0.0, -0.5), Vec3::new(0.5, 0.0, 0.5))
    }
}

/// Identity of a shared mesh, stable for as long as the mesh is alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshId(usize);

/// Triangle mesh primitive sharing its geometry through an `Arc`.
#[derive(Debug, Clone)]
pub struct TriMesh {
    mesh: Arc<Mesh>,
}

impl TriMesh {
    pub fn new(mesh: Arc<Mesh>) -> Self {
        Self { mesh }
    }

    pub fn mesh(&self) -> &Arc<Mesh> {
        &self.mesh
    }

    /// Two `TriMesh`es sharing one `Mesh` report the same id.
    pub fn id(&self) -> MeshId {
        MeshId(Arc::as_ptr(&self.mesh) as usize)
    }
}

impl Primitive for TriMesh {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn local_bounds(&self) -> Aabb {
        self.mesh.bounds
    }
}
