//! A backend that records calls instead of rendering.
//!
//! Lets depth passes run without a GPU context, in tests and in batch tools
//! that only want to know what a pass would draw.
//!
//! The command log is unbounded. Callers running more than one pass drain it
//! with [`HeadlessBackend::take_commands`] or [`HeadlessBackend::clear_commands`].

use cinder_math::Mat4;

use crate::backend::{
    BackendError, CubeDepthTarget, DepthBackend, DrawTarget, FramebufferId, ShaderId, ShaderPaths,
    TextureId, Uniform, Viewport,
};

#[derive(Debug, Clone, PartialEq)]
pub enum DepthCommand {
    LoadShader(ShaderPaths),
    BindUniformBlock { name: String, binding: u32 },
    SetUniform { name: String, value: Uniform },
    UploadUniformBlock { name: String, data: Vec<u8> },
    BindFramebuffer(FramebufferId),
    SetViewport(Viewport),
    EnableDepthTest,
    ClearDepth,
    CreateCubeDepthTarget(CubeDepthTarget),
    ReleaseCubeDepthTarget(CubeDepthTarget),
    Draw { target: DrawTarget, model: Mat4 },
}

/// Records every backend call in order. The log keeps growing until drained.
#[derive(Debug)]
pub struct HeadlessBackend {
    commands: Vec<DepthCommand>,
    framebuffer: FramebufferId,
    viewport: Viewport,
    next_id: u32,
    live_targets: Vec<CubeDepthTarget>,
    check_sources: bool,
}

impl HeadlessBackend {
    /// Starts bound to the default framebuffer with a `width` x `height` viewport.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            commands: Vec::new(),
            framebuffer: FramebufferId::DEFAULT,
            viewport: Viewport::new(0, 0, width, height),
            next_id: 1,
            live_targets: Vec::new(),
            check_sources: false,
        }
    }

    /// Make `load_shader` fail when a stage file does not exist.
    pub fn with_source_check(mut self) -> Self {
        self.check_sources = true;
        self
    }

    pub fn commands(&self) -> &[DepthCommand] {
        &self.commands
    }

    /// Hand over the recorded log, leaving it empty. Bound state is kept.
    pub fn take_commands(&mut self) -> Vec<DepthCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    /// Cube targets created and not yet released.
    pub fn live_targets(&self) -> &[CubeDepthTarget] {
        &self.live_targets
    }

    pub fn draws(&self) -> impl Iterator<Item = (DrawTarget, Mat4)> + '_ {
        self.commands.iter().filter_map(|command| match command {
            DepthCommand::Draw { target, model } => Some((*target, *model)),
            _ => None,
        })
    }

    /// Last upload to the uniform block `name`.
    pub fn last_block(&self, name: &str) -> Option<&[u8]> {
        self.commands.iter().rev().find_map(|command| match command {
            DepthCommand::UploadUniformBlock { name: n, data } if n == name => Some(data.as_slice()),
            _ => None,
        })
    }

    fn next_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl DepthBackend for HeadlessBackend {
    fn load_shader(&mut self, paths: &ShaderPaths) -> Result<ShaderId, BackendError> {
        if self.check_sources {
            for path in [&paths.vertex, &paths.geometry, &paths.fragment] {
                std::fs::metadata(path).map_err(|source| BackendError::ShaderSource {
                    path: path.clone(),
                    source,
                })?;
            }
        }
        self.commands.push(DepthCommand::LoadShader(paths.clone()));
        Ok(ShaderId(self.next_id()))
    }

    fn bind_uniform_block(&mut self, _shader: ShaderId, name: &str, binding: u32) {
        self.commands.push(DepthCommand::BindUniformBlock {
            name: name.to_string(),
            binding,
        });
    }

    fn set_uniform(&mut self, _shader: ShaderId, name: &str, value: Uniform) {
        self.commands.push(DepthCommand::SetUniform {
            name: name.to_string(),
            value,
        });
    }

    fn upload_uniform_block(&mut self, _shader: ShaderId, name: &str, data: &[u8]) {
        self.commands.push(DepthCommand::UploadUniformBlock {
            name: name.to_string(),
            data: data.to_vec(),
        });
    }

    fn bound_framebuffer(&self) -> FramebufferId {
        self.framebuffer
    }

    fn bind_framebuffer(&mut self, framebuffer: FramebufferId) {
        self.framebuffer = framebuffer;
        self.commands.push(DepthCommand::BindFramebuffer(framebuffer));
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.commands.push(DepthCommand::SetViewport(viewport));
    }

    fn enable_depth_test(&mut self) {
        self.commands.push(DepthCommand::EnableDepthTest);
    }

    fn clear_depth(&mut self) {
        self.commands.push(DepthCommand::ClearDepth);
    }

    fn create_cube_depth_target(&mut self, size: u32) -> CubeDepthTarget {
        let target = CubeDepthTarget {
            framebuffer: FramebufferId(self.next_id()),
            texture: TextureId(self.next_id()),
            size,
        };
        self.live_targets.push(target);
        self.commands.push(DepthCommand::CreateCubeDepthTarget(target));
        target
    }

    fn release_cube_depth_target(&mut self, target: CubeDepthTarget) {
        self.live_targets.retain(|t| *t != target);
        self.commands.push(DepthCommand::ReleaseCubeDepthTarget(target));
    }

    fn draw(&mut self, _shader: ShaderId, target: DrawTarget, model: Mat4) {
        self.commands.push(DepthCommand::Draw { target, model });
    }
}
