//! Conversion of a scene graph into a hitable hierarchy.
//!
//! Every scene object that carries a primitive or children becomes a
//! [`Group`] holding the object's material, so material inheritance falls out
//! of the group override rule. Primitives are placed with an [`Instance`] at
//! the accumulated world matrix.

use std::collections::HashMap;
use std::sync::Arc;

use cinder_core::{Dispatcher, MeshId, Plane, Scene, SceneObject, Sphere as SphereShape, TriMesh, Visitor};
use cinder_math::{Mat4, Vec3};

use crate::bvh::BvhNode;
use crate::group::Group;
use crate::hit::MaterialSlot;
use crate::hitable::Hitable;
use crate::instance::Instance;
use crate::sphere::Sphere;
use crate::triangle::Triangle;

/// Build the hitable world for `scene`. `None` when the scene has no root or
/// nothing under it is drawable.
pub fn build_world(scene: &Scene) -> Option<Group> {
    let Some(root) = scene.root() else {
        log::error!("Scene '{}' has no root object", scene.name());
        return None;
    };
    WorldBuilder::new().build(root)
}

pub struct WorldBuilder {
    dispatcher: Dispatcher<WorldBuilder>,
    transforms: Vec<Mat4>,
    /// Open groups, innermost last
    groups: Vec<Group>,
    finished: Option<Group>,
    unit_sphere: Arc<dyn Hitable>,
    unit_plane: Arc<dyn Hitable>,
    meshes: HashMap<MeshId, Arc<dyn Hitable>>,
}

impl WorldBuilder {
    pub fn new() -> Self {
        let mut dispatcher = Dispatcher::new();
        dispatcher
            .register::<SceneObject>(Self::visit_object)
            .register::<SphereShape>(Self::visit_sphere)
            .register::<Plane>(Self::visit_plane)
            .register::<TriMesh>(Self::visit_trimesh);

        Self {
            dispatcher,
            transforms: vec![Mat4::IDENTITY],
            groups: Vec::new(),
            finished: None,
            unit_sphere: Arc::new(Sphere::new(Vec3::ZERO, 1.0, MaterialSlot::none())),
            unit_plane: Arc::new(unit_plane()),
            meshes: HashMap::new(),
        }
    }

    pub fn build(&mut self, root: &SceneObject) -> Option<Group> {
        self.transforms.clear();
        self.transforms.push(Mat4::IDENTITY);
        self.groups.clear();
        self.finished = None;

        root.accept(self);

        let world = self.finished.take();
        if let Some(world) = &world {
            log::debug!(
                "Built world from '{}': {} top-level children, {} cached meshes",
                root.name(),
                world.len(),
                self.meshes.len()
            );
        }
        world
    }

    /// Meshes converted so far. Objects sharing a mesh share one BVH.
    pub fn cached_mesh_count(&self) -> usize {
        self.meshes.len()
    }

    fn top(&self) -> Mat4 {
        self.transforms.last().copied().unwrap_or(Mat4::IDENTITY)
    }

    fn place(&mut self, object: Arc<dyn Hitable>) {
        let instance = Instance::new(object, self.top(), MaterialSlot::none());
        if let Some(group) = self.groups.last_mut() {
            group.add(Arc::new(instance));
        }
    }

    fn visit_object(&mut self, object: &SceneObject) {
        let primitive = object.primitive();
        let children = object.children();
        if primitive.is_none() && children.is_empty() {
            return;
        }

        let world = self.top() * object.local_matrix();
        self.transforms.push(world);
        self.groups.push(Group::new(object.material()));

        if let Some(primitive) = primitive {
            if !primitive.accept(self) {
                log::debug!("'{}' has a primitive the ray tracer cannot intersect", object.name());
            }
        }
        for child in &children {
            child.accept(self);
        }

        self.transforms.pop();
        let Some(group) = self.groups.pop() else {
            return;
        };
        match self.groups.last_mut() {
            Some(parent) => {
                parent.add(Arc::new(group));
            }
            None => self.finished = Some(group),
        }
    }

    fn visit_sphere(&mut self, _sphere: &SphereShape) {
        self.place(self.unit_sphere.clone());
    }

    fn visit_plane(&mut self, _plane: &Plane) {
        self.place(self.unit_plane.clone());
    }

    fn visit_trimesh(&mut self, trimesh: &TriMesh) {
        let bvh = self
            .meshes
            .entry(trimesh.id())
            .or_insert_with(|| {
                let triangles: Vec<Arc<dyn Hitable>> = trimesh
                    .mesh()
                    .triangles()
                    .into_iter()
                    .map(|[v0, v1, v2]| {
                        Arc::new(Triangle::new(v0, v1, v2, MaterialSlot::none())) as Arc<dyn Hitable>
                    })
                    .collect();
                Arc::new(BvhNode::new(triangles))
            })
            .clone();
        self.place(bvh);
    }
}

impl Default for WorldBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Visitor for WorldBuilder {
    fn dispatcher(&self) -> &Dispatcher<Self> {
        &self.dispatcher
    }
}

/// Unit square in the XZ plane facing +Y, matching [`Plane`].
fn unit_plane() -> Group {
    let a = Vec3::new(-0.5, 0.0, -0.5);
    let b = Vec3::new(0.5, 0.0, -0.5);
    let c = Vec3::new(0.5, 0.0, 0.5);
    let d = Vec3::new(-0.5, 0.0, 0.5);

    Group::default()
        << Arc::new(Triangle::new(a, d, c, MaterialSlot::none()))
        << Arc::new(Triangle::new(a, c, b, MaterialSlot::none()))
}
