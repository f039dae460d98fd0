//! Primary-ray depth caster.
//!
//! Casts camera rays at a [`Hitable`] world in parallel, one row per rayon
//! task, and records how far each pixel's surface is. Good for checking a
//! hierarchy without any shading.

use image::{GrayImage, Luma};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::camera::Camera;
use crate::hitable::Hitable;

#[derive(Debug, Clone)]
pub struct CastConfig {
    /// Rays per pixel. One ray goes through the pixel centre; more are
    /// jittered inside the pixel.
    pub samples_per_pixel: u32,
    /// Seed for the jitter, so casts are reproducible
    pub seed: u64,
}

impl Default for CastConfig {
    fn default() -> Self {
        Self {
            samples_per_pixel: 1,
            seed: 0,
        }
    }
}

/// Result of casting one pixel.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DepthSample {
    /// Mean hit distance over the samples that hit
    pub depth: Option<f32>,
    /// Fraction of samples that hit something
    pub coverage: f32,
}

/// Per-pixel depths, row-major from the top-left.
#[derive(Debug, Clone)]
pub struct DepthBuffer {
    pub width: u32,
    pub height: u32,
    pub samples: Vec<DepthSample>,
}

impl DepthBuffer {
    pub fn get(&self, x: u32, y: u32) -> DepthSample {
        self.samples[y as usize * self.width as usize + x as usize]
    }

    pub fn hit_count(&self) -> usize {
        self.samples.iter().filter(|s| s.depth.is_some()).count()
    }

    /// Nearest and farthest depth in the buffer.
    pub fn depth_range(&self) -> Option<(f32, f32)> {
        self.samples
            .iter()
            .filter_map(|s| s.depth)
            .fold(None, |range, d| match range {
                None => Some((d, d)),
                Some((lo, hi)) => Some((lo.min(d), hi.max(d))),
            })
    }

    /// Grey image: near surfaces bright, far surfaces dark, misses black.
    pub fn to_image(&self) -> GrayImage {
        let (near, far) = self.depth_range().unwrap_or((0.0, 1.0));
        let span = (far - near).max(f32::EPSILON);

        GrayImage::from_fn(self.width, self.height, |x, y| {
            let sample = self.get(x, y);
            let level = match sample.depth {
                Some(d) => (1.0 - (d - near) / span) * 0.8 + 0.2,
                None => 0.0,
            };
            Luma([(level * sample.coverage * 255.0).round() as u8])
        })
    }
}

pub struct DepthCaster {
    camera: Camera,
    config: CastConfig,
}

impl DepthCaster {
    /// `camera` is initialized here.
    pub fn new(mut camera: Camera, config: CastConfig) -> Self {
        camera.initialize();
        Self { camera, config }
    }

    pub fn cast(&self, world: &dyn Hitable) -> DepthBuffer {
        let width = self.camera.image_width();
        let height = self.camera.image_height();
        let mut samples = vec![DepthSample::default(); width as usize * height as usize];

        samples
            .par_chunks_mut(width as usize)
            .enumerate()
            .for_each(|(y, row)| {
                let mut rng = StdRng::seed_from_u64(self.config.seed ^ y as u64);
                for (x, pixel) in row.iter_mut().enumerate() {
                    *pixel = self.cast_pixel(world, x as u32, y as u32, &mut rng);
                }
            });

        log::debug!(
            "Cast {}x{} pixels at {} spp",
            width,
            height,
            self.config.samples_per_pixel
        );

        DepthBuffer {
            width,
            height,
            samples,
        }
    }

    fn cast_pixel(&self, world: &dyn Hitable, x: u32, y: u32, rng: &mut StdRng) -> DepthSample {
        let spp = self.config.samples_per_pixel.max(1);
        let mut hits = 0u32;
        let mut depth_sum = 0.0;

        for s in 0..spp {
            let (dx, dy) = if s == 0 {
                (0.0, 0.0)
            } else {
                (rng.gen::<f32>() - 0.5, rng.gen::<f32>() - 0.5)
            };
            let mut ray = self.camera.get_ray(x, y, dx, dy);
            let rst = world.ray_in(&mut ray);
            if rst.hit {
                hits += 1;
                // Direction is not unit length; report a real distance
                depth_sum += rst.record.t * ray.direction.length();
            }
        }

        DepthSample {
            depth: (hits > 0).then(|| depth_sum / hits as f32),
            coverage: hits as f32 / spp as f32,
        }
    }
}
