//! Cinder Core - scene graph shared by the ray tracer and the viewport.
//!
//! This crate provides:
//!
//! - **Scene graph types**: `Scene`, `SceneObject` and its components
//!   (`Transform`, `Geometry`, `LightComponent`)
//! - **Primitives**: `Sphere`, `Plane`, `TriMesh` over a shared `Mesh`
//! - **Visitor dispatch**: `Dispatcher` / `Visitor`, for passes that walk
//!   heterogeneous nodes without the nodes knowing about them

pub mod error;
pub mod light;
pub mod material;
pub mod mesh;
pub mod object;
pub mod primitive;
pub mod scene;
pub mod transform;
pub mod visit;

// Re-export commonly used types
pub use error::SceneError;
pub use light::{DirectionalLight, Light, LightComponent, LightRef, PointLight, SpotLight};
pub use material::Material;
pub use mesh::Mesh;
pub use object::{Geometry, SceneObject};
pub use primitive::{MeshId, Plane, Primitive, Sphere, TriMesh};
pub use scene::{Scene, SceneWriteGuard};
pub use transform::Transform;
pub use visit::{Dispatcher, Visitor};
