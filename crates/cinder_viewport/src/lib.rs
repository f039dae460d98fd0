//! Cinder Viewport - GPU-side scene passes
//!
//! Depth passes are written against the [`DepthBackend`] trait rather than a
//! graphics API, so they can run headless. The main pass here is
//! [`PointLightDepthMaps`], which renders omnidirectional shadow cube maps.

pub mod backend;
pub mod config;
pub mod headless;
pub mod pldm;

pub use backend::{
    BackendError, CubeDepthTarget, DepthBackend, DrawTarget, FramebufferId, ShaderId, ShaderPaths,
    ShapeKind, TextureId, Uniform, Viewport,
};
pub use config::{ConfigError, DepthMapConfig};
pub use headless::{DepthCommand, HeadlessBackend};
pub use pldm::{
    cube_face_transforms, DepthMapError, GenerationStats, PointLightDepthMaps, PointLightUniform,
    CUBE_FACES, POINT_LIGHT_BLOCK,
};
