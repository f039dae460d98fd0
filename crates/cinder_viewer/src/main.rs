//! Batch driver: builds a small demo scene, runs the point light shadow pass
//! against the headless backend and writes a ray cast depth image.
//!
//! Usage: cinder_viewer [config.json] [output.png]

use std::env;
use std::sync::Arc;

use anyhow::{Context, Result};

use cinder_core::{Geometry, Light, Material, Mesh, Plane, PointLight, Scene, SceneObject, Sphere, Transform, TriMesh};
use cinder_math::{Quat, Vec3};
use cinder_rtx::{build_world, Camera, CastConfig, DepthCaster, Hitable};
use cinder_viewport::{DepthMapConfig, HeadlessBackend, PointLightDepthMaps};

const IMAGE_WIDTH: u32 = 640;
const IMAGE_HEIGHT: u32 = 360;

fn pyramid() -> Mesh {
    let positions = vec![
        Vec3::new(-1.0, 0.0, -1.0),
        Vec3::new(1.0, 0.0, -1.0),
        Vec3::new(1.0, 0.0, 1.0),
        Vec3::new(-1.0, 0.0, 1.0),
        Vec3::new(0.0, 1.5, 0.0),
    ];
    let indices = vec![0, 4, 1, 1, 4, 2, 2, 4, 3, 3, 4, 0, 0, 1, 2, 0, 2, 3];
    Mesh::new(positions, indices)
}

fn demo_scene() -> Result<Scene> {
    let root = SceneObject::new("root");
    root.set_geometry(Geometry {
        primitive: None,
        material: Some(Arc::new(Material::new("grey", Vec3::splat(0.6)))),
    });

    let floor = SceneObject::new("floor");
    floor.set_transform(Transform::from_scale(Vec3::new(20.0, 1.0, 20.0)));
    floor.set_geometry(Geometry::new(Arc::new(Plane)));
    root.add_child(floor)?;

    let ball = SceneObject::new("ball");
    ball.set_transform(Transform::from_translation(Vec3::new(-1.5, 1.0, 0.0)));
    ball.set_geometry(
        Geometry::new(Arc::new(Sphere))
            .with_material(Arc::new(Material::new("red", Vec3::new(0.8, 0.1, 0.1)))),
    );
    root.add_child(ball)?;

    let mesh = Arc::new(pyramid());
    for (i, x) in [1.5, 4.0].into_iter().enumerate() {
        let statue = SceneObject::new(format!("pyramid{i}"));
        statue.set_transform(
            Transform::from_translation(Vec3::new(x, 0.0, -1.0))
                .with_rotation(Quat::from_rotation_y(0.4 * i as f32)),
        );
        statue.set_geometry(Geometry::new(Arc::new(TriMesh::new(mesh.clone()))));
        root.add_child(statue)?;
    }

    let lamp = SceneObject::new("lamp");
    lamp.set_transform(Transform::from_translation(Vec3::new(0.0, 5.0, 2.0)));
    lamp.add_light(Light::Point(PointLight::default()));
    root.add_child(lamp)?;

    Ok(Scene::new("demo", root))
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args: Vec<String> = env::args().collect();
    let config = match args.get(1) {
        Some(path) => DepthMapConfig::from_json_file(path)
            .with_context(|| format!("loading depth map config from {path}"))?,
        None => DepthMapConfig::default(),
    };
    let output = args.get(2).map_or("depth.png", String::as_str);

    log::info!("Starting Cinder viewer");
    let scene = demo_scene()?;

    let mut shadows =
        PointLightDepthMaps::new(HeadlessBackend::new(IMAGE_WIDTH, IMAGE_HEIGHT), config);
    shadows.init()?;
    let stats = shadows.generate(Some(&scene))?;
    log::info!(
        "Shadow pass: {} cube maps, {} draws, {} backend calls",
        stats.lights_rendered,
        stats.draws,
        shadows.backend_mut().take_commands().len()
    );

    let world = build_world(&scene).context("demo scene has nothing to ray cast")?;
    log::info!("World bounds: {:?}", world.bounding_box());

    let camera = Camera::new()
        .with_resolution(IMAGE_WIDTH, IMAGE_HEIGHT)
        .with_position(Vec3::new(0.0, 4.0, 9.0), Vec3::new(0.0, 0.5, 0.0), Vec3::Y)
        .with_fov(45.0);
    let caster = DepthCaster::new(
        camera,
        CastConfig {
            samples_per_pixel: 4,
            seed: 1,
        },
    );
    let depth = caster.cast(&world);
    log::info!(
        "Ray cast {} of {} pixels",
        depth.hit_count(),
        IMAGE_WIDTH * IMAGE_HEIGHT
    );

    depth
        .to_image()
        .save(output)
        .with_context(|| format!("writing {output}"))?;
    log::info!("Wrote depth image to {output}");

    Ok(())
}
