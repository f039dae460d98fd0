//! Settings for the point-light depth pass.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backend::ShaderPaths;

const DEPTH_SHADER_DIR: &str = "data/shaders/Engine/PointLight";
const DEPTH_SHADER_NAME: &str = "genDepth";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepthMapConfig {
    /// Directory that `data/shaders/...` is resolved against
    pub shader_root: PathBuf,
    /// Edge length of each cube face in texels
    pub depth_map_size: u32,
    pub light_near: f32,
    pub light_far: f32,
}

impl Default for DepthMapConfig {
    fn default() -> Self {
        Self {
            shader_root: PathBuf::from("."),
            depth_map_size: 1024,
            light_near: 0.1,
            light_far: 25.0,
        }
    }
}

impl DepthMapConfig {
    pub fn new(shader_root: impl Into<PathBuf>) -> Self {
        Self {
            shader_root: shader_root.into(),
            ..Self::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.depth_map_size == 0 {
            return Err(ConfigError::Invalid("depth_map_size must be positive".into()));
        }
        if !(self.light_near > 0.0 && self.light_near < self.light_far) {
            return Err(ConfigError::Invalid(format!(
                "light planes must satisfy 0 < near < far, got near={} far={}",
                self.light_near, self.light_far
            )));
        }
        Ok(())
    }

    /// Stage sources of the depth shader under `shader_root`.
    pub fn shader_paths(&self) -> ShaderPaths {
        let base = self.shader_root.join(DEPTH_SHADER_DIR);
        ShaderPaths {
            vertex: base.join(format!("{DEPTH_SHADER_NAME}.vs")),
            geometry: base.join(format!("{DEPTH_SHADER_NAME}.gs")),
            fragment: base.join(format!("{DEPTH_SHADER_NAME}.fs")),
        }
    }
}
