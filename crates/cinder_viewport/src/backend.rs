//! The seam between the depth passes and a graphics API.
//!
//! Passes only ever talk to a [`DepthBackend`]; a GPU implementation owns the
//! real framebuffers, shaders and vertex arrays behind the opaque ids used here.

use std::path::PathBuf;

use cinder_core::MeshId;
use cinder_math::{Mat4, Vec3};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FramebufferId(pub u32);

impl FramebufferId {
    /// The window's own framebuffer
    pub const DEFAULT: FramebufferId = FramebufferId(0);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u32);

impl TextureId {
    /// Returned by lookups that find nothing.
    pub const INVALID: TextureId = TextureId(0);

    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn square(size: u32) -> Self {
        Self::new(0, 0, size, size)
    }
}

/// A depth-only render target with a six-face cube map attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CubeDepthTarget {
    pub framebuffer: FramebufferId,
    pub texture: TextureId,
    pub size: u32,
}

/// Built-in shapes the backend keeps one vertex array for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Sphere,
    Plane,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawTarget {
    Shape(ShapeKind),
    /// Vertex array uploaded for a shared mesh
    Mesh(MeshId),
}

/// Vertex, geometry and fragment stage sources of a program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderPaths {
    pub vertex: PathBuf,
    pub geometry: PathBuf,
    pub fragment: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Uniform {
    Float(f32),
    Vec3(Vec3),
    Mat4(Mat4),
}

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("failed to load shader stage {path:?}: {source}")]
    ShaderSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("shader program failed to link: {0}")]
    ShaderLink(String),
}

/// Render state and draw calls needed by depth passes.
pub trait DepthBackend {
    fn load_shader(&mut self, paths: &ShaderPaths) -> Result<ShaderId, BackendError>;

    /// Attach the uniform block `name` of `shader` to a binding slot.
    fn bind_uniform_block(&mut self, shader: ShaderId, name: &str, binding: u32);

    fn set_uniform(&mut self, shader: ShaderId, name: &str, value: Uniform);

    /// Upload raw bytes for the uniform block `name`.
    fn upload_uniform_block(&mut self, shader: ShaderId, name: &str, data: &[u8]);

    fn bound_framebuffer(&self) -> FramebufferId;

    fn bind_framebuffer(&mut self, framebuffer: FramebufferId);

    fn viewport(&self) -> Viewport;

    fn set_viewport(&mut self, viewport: Viewport);

    fn enable_depth_test(&mut self);

    fn clear_depth(&mut self);

    fn create_cube_depth_target(&mut self, size: u32) -> CubeDepthTarget;

    fn release_cube_depth_target(&mut self, target: CubeDepthTarget);

    fn draw(&mut self, shader: ShaderId, target: DrawTarget, model: Mat4);
}
