//! Point-light depth cube maps for omnidirectional shadows.
//!
//! [`PointLightDepthMaps`] walks a scene once per point light and draws every
//! primitive into that light's cube depth target. A geometry shader fans each
//! draw out to the six faces, so the pass uploads all six face matrices at
//! once and draws each primitive a single time per light.

use std::sync::Arc;

use cinder_core::{
    Dispatcher, LightComponent, LightRef, Plane, Scene, SceneObject, Sphere, TriMesh, Visitor,
};
use cinder_math::{Mat4, Vec3};
use thiserror::Error;

use crate::backend::{
    BackendError, CubeDepthTarget, DepthBackend, DrawTarget, ShaderId, ShapeKind, TextureId,
    Uniform, Viewport,
};
use crate::config::{ConfigError, DepthMapConfig};

/// Uniform block holding the per-light data of the depth shader.
pub const POINT_LIGHT_BLOCK: &str = "PointLight";

/// Look direction and up vector of each cube face, in cube map layer order.
pub const CUBE_FACES: [(Vec3, Vec3); 6] = [
    (Vec3::X, Vec3::NEG_Y),
    (Vec3::NEG_X, Vec3::NEG_Y),
    (Vec3::Y, Vec3::Z),
    (Vec3::NEG_Y, Vec3::NEG_Z),
    (Vec3::Z, Vec3::NEG_Y),
    (Vec3::NEG_Z, Vec3::NEG_Y),
];

#[derive(Error, Debug)]
pub enum DepthMapError {
    #[error("no scene to generate depth maps for")]
    MissingScene,

    #[error("scene '{0}' has no root object")]
    MissingRoot(String),

    #[error("scene '{0}' is write-locked by another pass")]
    SceneLocked(String),

    #[error("depth shader not loaded; call init() first")]
    NotInitialized,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Per-light uniform block layout, matching `genDepth.gs`.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointLightUniform {
    pub shadow_matrices: [[[f32; 4]; 4]; 6],
    pub light_pos: [f32; 3],
    pub light_far: f32,
}

impl PointLightUniform {
    pub fn new(light_pos: Vec3, light_far: f32, faces: &[Mat4; 6]) -> Self {
        Self {
            shadow_matrices: faces.map(|m| m.to_cols_array_2d()),
            light_pos: light_pos.to_array(),
            light_far,
        }
    }
}

/// Projection times view for each cube face seen from `light_pos`.
///
/// 90 degree field of view and a square aspect, so the six frusta tile the
/// full sphere of directions.
pub fn cube_face_transforms(light_pos: Vec3, near: f32, far: f32) -> [Mat4; 6] {
    let proj = Mat4::perspective_rh_gl(90f32.to_radians(), 1.0, near, far);
    CUBE_FACES.map(|(dir, up)| proj * Mat4::look_at_rh(light_pos, light_pos + dir, up))
}

/// Counters of one [`PointLightDepthMaps::generate`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GenerationStats {
    pub lights_registered: usize,
    pub lights_pruned: usize,
    pub lights_rendered: usize,
    pub draws: usize,
}

pub struct PointLightDepthMaps<B: DepthBackend + 'static> {
    backend: B,
    config: DepthMapConfig,
    dispatcher: Dispatcher<Self>,
    shader: Option<ShaderId>,
    /// Model matrices; the top is the current object's world matrix
    transforms: Vec<Mat4>,
    /// Tracked lights, in registration order
    lights: Vec<(LightRef, CubeDepthTarget)>,
    draws: usize,
}

impl<B: DepthBackend + 'static> PointLightDepthMaps<B> {
    pub fn new(backend: B, config: DepthMapConfig) -> Self {
        let mut dispatcher = Dispatcher::new();
        dispatcher
            .register::<SceneObject>(Self::visit_object)
            .register::<Sphere>(Self::visit_sphere)
            .register::<Plane>(Self::visit_plane)
            .register::<TriMesh>(Self::visit_trimesh);

        Self {
            backend,
            config,
            dispatcher,
            shader: None,
            transforms: vec![Mat4::IDENTITY],
            lights: Vec::new(),
            draws: 0,
        }
    }

    /// Validate the config and load the depth shader. Needs a current
    /// graphics context.
    pub fn init(&mut self) -> Result<(), DepthMapError> {
        self.config.validate()?;
        let paths = self.config.shader_paths();
        let shader = self.backend.load_shader(&paths)?;
        self.backend.bind_uniform_block(shader, "Camera", 0);
        self.backend
            .set_uniform(shader, "lightFar", Uniform::Float(self.config.light_far));
        self.shader = Some(shader);

        log::debug!("Loaded point light depth shader from {:?}", paths.vertex);
        Ok(())
    }

    pub fn config(&self) -> &DepthMapConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Render the cube depth map of every point light in `scene`.
    ///
    /// Holds the scene write lock for the whole pass. The caller's framebuffer
    /// and viewport are restored before returning. A missing scene or root is
    /// rejected before any backend state is touched.
    pub fn generate(&mut self, scene: Option<&Scene>) -> Result<GenerationStats, DepthMapError> {
        let Some(scene) = scene else {
            log::error!("Point light depth maps: scene is missing");
            return Err(DepthMapError::MissingScene);
        };
        let Some(root) = scene.root().cloned() else {
            log::error!("Point light depth maps: scene '{}' has no root", scene.name());
            return Err(DepthMapError::MissingRoot(scene.name().to_string()));
        };
        let Some(shader) = self.shader else {
            log::error!("Point light depth maps: generate() called before init()");
            return Err(DepthMapError::NotInitialized);
        };
        let _lock = scene.lock_for_write().map_err(|err| {
            log::error!("Point light depth maps: {err}");
            DepthMapError::SceneLocked(scene.name().to_string())
        })?;

        let saved_framebuffer = self.backend.bound_framebuffer();
        let saved_viewport = self.backend.viewport();

        self.transforms.clear();
        self.transforms.push(Mat4::IDENTITY);
        self.draws = 0;

        let mut stats = GenerationStats {
            lights_registered: self.register_lights(scene),
            lights_pruned: self.prune_expired(),
            ..GenerationStats::default()
        };

        let tracked: Vec<(LightRef, CubeDepthTarget)> = self.lights.clone();
        for (handle, target) in tracked {
            let Some(light) = handle.resolve() else {
                continue;
            };
            let Some(light_pos) = light.world_position() else {
                log::warn!("Point light depth maps: light has no owning object, skipped");
                continue;
            };

            self.backend.bind_framebuffer(target.framebuffer);
            self.backend.enable_depth_test();
            self.backend.set_viewport(Viewport::square(target.size));
            self.backend.clear_depth();

            let faces = cube_face_transforms(light_pos, self.config.light_near, self.config.light_far);
            let uniform = PointLightUniform::new(light_pos, self.config.light_far, &faces);
            self.backend
                .upload_uniform_block(shader, POINT_LIGHT_BLOCK, bytemuck::bytes_of(&uniform));

            root.accept(self);
            stats.lights_rendered += 1;
        }
        stats.draws = self.draws;

        self.backend.bind_framebuffer(saved_framebuffer);
        self.backend.set_viewport(saved_viewport);

        log::info!(
            "Point light depth maps for '{}': {} lights, {} draws ({} new, {} pruned)",
            scene.name(),
            stats.lights_rendered,
            stats.draws,
            stats.lights_registered,
            stats.lights_pruned
        );
        Ok(stats)
    }

    /// Cube depth texture rendered for `light`, or [`TextureId::INVALID`] if
    /// the light has not been through [`Self::generate`].
    pub fn depth_cube_map(&self, light: &Arc<LightComponent>) -> TextureId {
        self.lights
            .iter()
            .find(|(handle, _)| handle.refers_to(light))
            .map_or(TextureId::INVALID, |(_, target)| target.texture)
    }

    pub fn tracked_light_count(&self) -> usize {
        self.lights.len()
    }

    /// Release every cube target and forget all lights.
    pub fn release_all(&mut self) {
        for (_, target) in self.lights.drain(..) {
            self.backend.release_cube_depth_target(target);
        }
    }

    fn register_lights(&mut self, scene: &Scene) -> usize {
        let mut registered = 0;
        for light in scene.light_components() {
            if !light.is_point() || self.lights.iter().any(|(handle, _)| handle.refers_to(&light)) {
                continue;
            }
            let target = self.backend.create_cube_depth_target(self.config.depth_map_size);
            self.lights.push((LightRef::new(&light), target));
            registered += 1;
        }
        if registered > 0 {
            log::debug!("Registered {registered} point lights for depth maps");
        }
        registered
    }

    fn prune_expired(&mut self) -> usize {
        let mut pruned = Vec::new();
        self.lights.retain(|(handle, target)| {
            let expired = handle.is_expired();
            if expired {
                pruned.push(*target);
            }
            !expired
        });
        for target in &pruned {
            self.backend.release_cube_depth_target(*target);
        }
        if !pruned.is_empty() {
            log::debug!("Pruned {} expired point lights", pruned.len());
        }
        pruned.len()
    }

    fn model(&self) -> Mat4 {
        self.transforms.last().copied().unwrap_or(Mat4::IDENTITY)
    }

    /// Run `f` with `local` applied on top of the transform stack.
    fn with_local_transform(&mut self, local: Option<Mat4>, f: impl FnOnce(&mut Self)) {
        let Some(local) = local else {
            return f(self);
        };
        let model = self.model() * local;
        self.transforms.push(model);
        f(self);
        self.transforms.pop();
    }

    fn draw(&mut self, target: DrawTarget) {
        let Some(shader) = self.shader else {
            return;
        };
        let model = self.model();
        self.backend.draw(shader, target, model);
        self.draws += 1;
    }

    fn visit_object(&mut self, object: &SceneObject) {
        let primitive = object.primitive();
        let children = object.children();
        if primitive.is_none() && children.is_empty() {
            return;
        }

        let local = object.transform().map(|t| t.to_matrix());
        self.with_local_transform(local, |this| {
            if let Some(primitive) = &primitive {
                primitive.accept(this);
            }
            for child in &children {
                child.accept(this);
            }
        });
    }

    fn visit_sphere(&mut self, _sphere: &Sphere) {
        self.draw(DrawTarget::Shape(ShapeKind::Sphere));
    }

    fn visit_plane(&mut self, _plane: &Plane) {
        self.draw(DrawTarget::Shape(ShapeKind::Plane));
    }

    fn visit_trimesh(&mut self, mesh: &TriMesh) {
        self.draw(DrawTarget::Mesh(mesh.id()));
    }
}

impl<B: DepthBackend + 'static> Visitor for PointLightDepthMaps<B> {
    fn dispatcher(&self) -> &Dispatcher<Self> {
        &self.dispatcher
    }
}

impl<B: DepthBackend + 'static> Drop for PointLightDepthMaps<B> {
    fn drop(&mut self) {
        self.release_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::FramebufferId;
    use crate::headless::{DepthCommand, HeadlessBackend};
    use cinder_core::{
        DirectionalLight, Geometry, Light, Mesh, PointLight, Transform,
    };

    fn generator() -> PointLightDepthMaps<HeadlessBackend> {
        let _ = env_logger::builder().is_test(true).try_init();
        let config = DepthMapConfig {
            depth_map_size: 256,
            ..DepthMapConfig::default()
        };
        let mut pldm = PointLightDepthMaps::new(HeadlessBackend::new(800, 600), config);
        pldm.init().unwrap();
        pldm.backend_mut().clear_commands();
        pldm
    }

    fn point_light() -> Light {
        Light::Point(PointLight::default())
    }

    fn lamp(name: &str, position: Vec3) -> (Arc<SceneObject>, Arc<LightComponent>) {
        let object = SceneObject::new(name);
        object.set_transform(Transform::from_translation(position));
        let light = object.add_light(point_light());
        (object, light)
    }

    #[test]
    fn test_missing_scene_touches_nothing() {
        let mut pldm = generator();

        assert!(matches!(pldm.generate(None), Err(DepthMapError::MissingScene)));
        assert!(pldm.backend().commands().is_empty());

        let scene = Scene::empty("void");
        assert!(matches!(
            pldm.generate(Some(&scene)),
            Err(DepthMapError::MissingRoot(_))
        ));
        assert!(pldm.backend().commands().is_empty());
        assert!(!scene.is_write_locked());
    }

    #[test]
    fn test_generate_requires_init() {
        let mut pldm = PointLightDepthMaps::new(HeadlessBackend::new(1, 1), DepthMapConfig::default());
        let scene = Scene::new("s", SceneObject::new("root"));

        assert!(matches!(
            pldm.generate(Some(&scene)),
            Err(DepthMapError::NotInitialized)
        ));
        assert!(!scene.is_write_locked());
    }

    #[test]
    fn test_init_loads_depth_shader() {
        let config = DepthMapConfig::new("/srv/cinder");
        let mut pldm = PointLightDepthMaps::new(HeadlessBackend::new(1, 1), config.clone());
        pldm.init().unwrap();

        let commands = pldm.backend().commands();
        assert_eq!(commands[0], DepthCommand::LoadShader(config.shader_paths()));
        assert!(commands.contains(&DepthCommand::SetUniform {
            name: "lightFar".into(),
            value: Uniform::Float(25.0),
        }));
    }

    #[test]
    fn test_invalid_config_rejected_before_backend() {
        let config = DepthMapConfig {
            depth_map_size: 0,
            light_near: 5.0,
            light_far: 5.0,
            ..DepthMapConfig::default()
        };
        let mut pldm = PointLightDepthMaps::new(HeadlessBackend::new(1, 1), config);
        let (root, _light) = lamp("root", Vec3::ZERO);
        let scene = Scene::new("s", root);

        assert!(matches!(pldm.init(), Err(DepthMapError::Config(_))));
        assert!(matches!(
            pldm.generate(Some(&scene)),
            Err(DepthMapError::NotInitialized)
        ));
        assert!(pldm.backend().commands().is_empty());
        assert!(pldm.backend().live_targets().is_empty());
    }

    #[test]
    fn test_init_propagates_backend_error() {
        let backend = HeadlessBackend::new(1, 1).with_source_check();
        let mut pldm = PointLightDepthMaps::new(backend, DepthMapConfig::new("/nonexistent"));

        assert!(matches!(pldm.init(), Err(DepthMapError::Backend(_))));
    }

    #[test]
    fn test_locked_scene_is_rejected() {
        let mut pldm = generator();
        let (root, _light) = lamp("root", Vec3::ZERO);
        let scene = Scene::new("busy", root);

        let guard = scene.lock_for_write().unwrap();
        assert!(matches!(
            pldm.generate(Some(&scene)),
            Err(DepthMapError::SceneLocked(_))
        ));
        assert!(pldm.backend().commands().is_empty());
        assert!(scene.is_write_locked());

        drop(guard);
        assert!(pldm.generate(Some(&scene)).is_ok());
        assert!(!scene.is_write_locked());
    }

    #[test]
    fn test_restores_framebuffer_and_viewport() {
        let caller_fbo = FramebufferId(42);
        let caller_viewport = Viewport::new(5, 6, 300, 200);

        for light_count in [0, 3] {
            let mut pldm = generator();
            pldm.backend_mut().bind_framebuffer(caller_fbo);
            pldm.backend_mut().set_viewport(caller_viewport);

            let root = SceneObject::new("root");
            for i in 0..light_count {
                root.add_light(point_light());
                let (child, _) = lamp(&format!("lamp{i}"), Vec3::splat(i as f32));
                root.add_child(child).unwrap();
            }
            let scene = Scene::new("restore", root);

            let stats = pldm.generate(Some(&scene)).unwrap();
            assert_eq!(stats.lights_rendered, light_count * 2);

            let backend = pldm.backend();
            assert_eq!(backend.bound_framebuffer(), caller_fbo);
            assert_eq!(backend.viewport(), caller_viewport);
            assert!(!scene.is_write_locked());
        }
    }

    #[test]
    fn test_face_transforms_order_and_up_vectors() {
        let pos = Vec3::new(1.0, 2.0, 3.0);
        let faces = cube_face_transforms(pos, 0.1, 25.0);
        let proj = Mat4::perspective_rh_gl(90f32.to_radians(), 1.0, 0.1, 25.0);

        let expected = [
            (Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, -1.0, 0.0)),
            (Vec3::new(-1.0, 0.0, 0.0), Vec3::new(0.0, -1.0, 0.0)),
            (Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, 0.0, 1.0)),
            (Vec3::new(0.0, -1.0, 0.0), Vec3::new(0.0, 0.0, -1.0)),
            (Vec3::new(0.0, 0.0, 1.0), Vec3::new(0.0, -1.0, 0.0)),
            (Vec3::new(0.0, 0.0, -1.0), Vec3::new(0.0, -1.0, 0.0)),
        ];
        for (face, (dir, up)) in faces.iter().zip(expected) {
            assert_eq!(*face, proj * Mat4::look_at_rh(pos, pos + dir, up));

            // The face's look direction lands in the middle of its image
            let ndc = face.project_point3(pos + dir * 5.0);
            assert!(ndc.x.abs() < 1e-5 && ndc.y.abs() < 1e-5);
        }
    }

    #[test]
    fn test_uniform_uploaded_per_light() {
        let mut pldm = generator();
        let (root, _light) = lamp("root", Vec3::new(0.0, 4.0, 0.0));
        let scene = Scene::new("s", root);

        pldm.generate(Some(&scene)).unwrap();

        let data = pldm.backend().last_block(POINT_LIGHT_BLOCK).unwrap();
        let uniform: PointLightUniform = bytemuck::pod_read_unaligned(data);
        let faces = cube_face_transforms(Vec3::new(0.0, 4.0, 0.0), 0.1, 25.0);

        assert_eq!(uniform.light_pos, [0.0, 4.0, 0.0]);
        assert_eq!(uniform.light_far, 25.0);
        assert_eq!(uniform.shadow_matrices[3], faces[3].to_cols_array_2d());
    }

    #[test]
    fn test_target_bound_and_cleared_before_draws() {
        let mut pldm = generator();
        let (root, light) = lamp("root", Vec3::ZERO);
        root.set_geometry(Geometry::new(Arc::new(Sphere)));
        let scene = Scene::new("s", root);

        pldm.generate(Some(&scene)).unwrap();

        let target = pldm.backend().live_targets()[0];
        assert_eq!(target.size, 256);
        assert_eq!(pldm.depth_cube_map(&light), target.texture);

        let commands = pldm.backend().commands();
        let bind = commands
            .iter()
            .position(|c| *c == DepthCommand::BindFramebuffer(target.framebuffer))
            .unwrap();
        assert_eq!(commands[bind + 1], DepthCommand::EnableDepthTest);
        assert_eq!(commands[bind + 2], DepthCommand::SetViewport(Viewport::square(256)));
        assert_eq!(commands[bind + 3], DepthCommand::ClearDepth);
        assert!(matches!(commands[bind + 5], DepthCommand::Draw { .. }));
    }

    #[test]
    fn test_draws_use_accumulated_transforms() {
        let mut pldm = generator();
        let mesh = Arc::new(Mesh::new(vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![0, 1, 2]));
        let trimesh = TriMesh::new(mesh);
        let mesh_id = trimesh.id();

        let (root, _light) = lamp("root", Vec3::new(0.0, 10.0, 0.0));
        let ball = SceneObject::new("ball");
        ball.set_transform(Transform::from_translation(Vec3::new(1.0, 0.0, 0.0)));
        ball.set_geometry(Geometry::new(Arc::new(Sphere)));
        let floor = SceneObject::new("floor");
        floor.set_geometry(Geometry::new(Arc::new(Plane)));
        let statue = SceneObject::new("statue");
        statue.set_transform(Transform::from_scale(Vec3::splat(2.0)));
        statue.set_geometry(Geometry::new(Arc::new(trimesh)));
        let empty = SceneObject::new("empty");
        empty.set_transform(Transform::from_translation(Vec3::splat(100.0)));

        root.add_child(ball.clone()).unwrap();
        ball.add_child(statue).unwrap();
        root.add_child(floor).unwrap();
        root.add_child(empty).unwrap();
        let scene = Scene::new("s", root);

        let stats = pldm.generate(Some(&scene)).unwrap();
        let draws: Vec<_> = pldm.backend().draws().collect();

        let root_m = Mat4::from_translation(Vec3::new(0.0, 10.0, 0.0));
        let ball_m = root_m * Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(stats.draws, 3);
        assert_eq!(
            draws,
            vec![
                (DrawTarget::Shape(ShapeKind::Sphere), ball_m),
                (DrawTarget::Mesh(mesh_id), ball_m * Mat4::from_scale(Vec3::splat(2.0))),
                (DrawTarget::Shape(ShapeKind::Plane), root_m),
            ]
        );
    }

    #[test]
    fn test_only_point_lights_registered() {
        let mut pldm = generator();
        let root = SceneObject::new("root");
        let sun = root.add_light(Light::Directional(DirectionalLight {
            color: Vec3::ONE,
            intensity: 1.0,
            direction: Vec3::NEG_Y,
        }));
        let bulb = root.add_light(point_light());
        let scene = Scene::new("s", root);

        let stats = pldm.generate(Some(&scene)).unwrap();

        assert_eq!(stats.lights_registered, 1);
        assert_eq!(pldm.tracked_light_count(), 1);
        assert_eq!(pldm.depth_cube_map(&sun), TextureId::INVALID);
        assert!(pldm.depth_cube_map(&bulb).is_valid());
    }

    #[test]
    fn test_registration_is_kept_across_passes() {
        let mut pldm = generator();
        let (root, light) = lamp("root", Vec3::ZERO);
        let scene = Scene::new("s", root);

        pldm.generate(Some(&scene)).unwrap();
        let texture = pldm.depth_cube_map(&light);
        let stats = pldm.generate(Some(&scene)).unwrap();

        assert_eq!(stats.lights_registered, 0);
        assert_eq!(pldm.depth_cube_map(&light), texture);
        assert_eq!(pldm.backend().live_targets().len(), 1);
    }

    #[test]
    fn test_expired_light_pruned_then_replaced() {
        let mut pldm = generator();
        let (root, light) = lamp("root", Vec3::ZERO);
        let scene = Scene::new("s", root.clone());

        pldm.generate(Some(&scene)).unwrap();
        let old_texture = pldm.depth_cube_map(&light);
        assert!(old_texture.is_valid());

        assert!(root.remove_light(&light));
        drop(light);
        let stats = pldm.generate(Some(&scene)).unwrap();

        assert_eq!(stats.lights_pruned, 1);
        assert_eq!(stats.lights_rendered, 0);
        assert_eq!(pldm.tracked_light_count(), 0);
        assert!(pldm.backend().live_targets().is_empty());

        let replacement = root.add_light(point_light());
        let stats = pldm.generate(Some(&scene)).unwrap();

        assert_eq!(stats.lights_registered, 1);
        assert_eq!(pldm.tracked_light_count(), 1);
        let new_texture = pldm.depth_cube_map(&replacement);
        assert!(new_texture.is_valid());
        assert_ne!(new_texture, old_texture);
    }

    #[test]
    fn test_unknown_light_has_invalid_map() {
        let pldm = generator();
        let stranger = SceneObject::new("stranger").add_light(point_light());

        assert_eq!(pldm.depth_cube_map(&stranger), TextureId::INVALID);
    }
}
