//! Multi-bounce light solve
//!
//! The solver runs `bounces` outer iterations of `surface_samples` inner
//! dispatches each. All dispatches of the surface solve add into one write
//! buffer that is never cleared. From the second bounce on, the write buffer
//! is drained, resolved and used as the seed of the next bounce. Light is
//! therefore counted again on every bounce and the result grows with the
//! bounce count instead of converging.

use rand::Rng;

use crate::bake::{sample_seeds, BakeContext, BufferCombinator, DirectLight, EnvironmentLight, SceneVolumes};
use crate::compute::{slots, DispatchContext, KernelParams, Uniforms};
use crate::core::{BakeResult, BakeStage};
use crate::kernels::sampling::HemisphereMode;
use crate::kernels::{BOUNCE_SURFACE, BOUNCE_VOLUMETRIC, COMBINE_ADD};
use crate::volume::{AccumulationBuffer, TexelFormat, Volume, VolumeRole};

/// Format seeds are resolved to between bounces
const SEED_FORMAT: TexelFormat = TexelFormat::RgbaHalf;

/// Output of the bounce solve
#[derive(Debug, Clone, PartialEq)]
pub struct BounceLight {
    /// Bounced light on surfaces
    pub surface: Volume,
    /// Bounced light through the whole volume, when enabled
    pub volumetric: Option<Volume>,
}

/// Iterative stochastic redistribution of light already in the volume
#[derive(Debug, Clone, Copy)]
pub struct BounceLightSolver {
    /// Outer iterations
    pub bounces: u32,
    /// Dispatches per bounce on surfaces
    pub surface_samples: u32,
    /// Dispatches of the volumetric pass, zero skips it
    pub volumetric_samples: u32,
    /// Direction distribution on surfaces
    pub hemisphere: HemisphereMode,
    /// RNG seed
    pub seed: u64,
}

impl Default for BounceLightSolver {
    fn default() -> Self {
        Self {
            bounces: 1,
            surface_samples: 64,
            volumetric_samples: 0,
            hemisphere: HemisphereMode::default(),
            seed: 0,
        }
    }
}

impl BounceLightSolver {
    /// Bounce the direct light, optionally lit by the environment on the
    /// first bounce
    pub fn solve(
        &self,
        cx: &mut BakeContext,
        volumes: &SceneVolumes,
        direct: &DirectLight,
        environment: Option<&EnvironmentLight>,
    ) -> BakeResult<BounceLight> {
        let surface_kernel = cx.kernel(BOUNCE_SURFACE)?;
        let volumetric_kernel = if self.volumetric_samples > 0 {
            Some(cx.kernel(BOUNCE_VOLUMETRIC)?)
        } else {
            None
        };
        if environment.is_some() || volumetric_kernel.is_some() {
            cx.kernel(COMBINE_ADD)?;
        }

        let combinator = BufferCombinator::new(volumes.grid);
        let mut seed = match environment {
            Some(env) => combinator.add(cx, &direct.surface, &env.surface)?,
            None => direct.surface.clone(),
        }
        .quantized(SEED_FORMAT);

        let total = (self.bounces * self.surface_samples + self.volumetric_samples) as usize;
        let mut done = 0;
        let mut seeds = sample_seeds(self.seed, BOUNCE_SURFACE);
        let params = KernelParams {
            hemisphere: self.hemisphere,
            ..KernelParams::default()
        };
        let mut write = AccumulationBuffer::new(volumes.grid.resolution);

        for bounce in 0..self.bounces {
            if bounce > 0 {
                cx.drain()?;
                seed = write.resolve(SEED_FORMAT);
            }
            for _ in 0..self.surface_samples {
                let uniforms = Uniforms::for_grid(&volumes.grid)
                    .with_seed(seeds.gen())
                    .with_max_samples(self.surface_samples);
                let mut ctx = DispatchContext::new(uniforms, &mut write)
                    .bind(slots::SCENE_ALBEDO, &volumes.albedo)
                    .bind(slots::SCENE_NORMAL, &volumes.normal)
                    .bind(slots::SEED, &seed)
                    .with_params(params);
                cx.submit(surface_kernel.as_ref(), &mut ctx)?;
                done += 1;
                cx.progress(BakeStage::Bounce, done, total);
            }
            log::debug!("Bounce {}/{} done", bounce + 1, self.bounces);
        }
        cx.drain()?;
        let surface = write.resolve(VolumeRole::BounceSurface.format());

        let volumetric = match volumetric_kernel {
            Some(kernel) => {
                let mut seed = combinator.add(cx, &direct.surface, &surface)?;
                if let Some(env) = environment {
                    seed = combinator.add(cx, &seed, &env.surface)?;
                }
                let seed = seed.quantized(SEED_FORMAT);

                let mut seeds = sample_seeds(self.seed, BOUNCE_VOLUMETRIC);
                let mut write = AccumulationBuffer::new(volumes.grid.resolution);
                for _ in 0..self.volumetric_samples {
                    let uniforms = Uniforms::for_grid(&volumes.grid)
                        .with_seed(seeds.gen())
                        .with_max_samples(self.volumetric_samples);
                    let mut ctx = DispatchContext::new(uniforms, &mut write)
                        .bind(slots::SCENE_ALBEDO, &volumes.albedo)
                        .bind(slots::SEED, &seed);
                    cx.submit(kernel.as_ref(), &mut ctx)?;
                    done += 1;
                    cx.progress(BakeStage::Bounce, done, total);
                }
                cx.drain()?;
                Some(write.resolve(VolumeRole::BounceVolumetric.format()))
            }
            None => None,
        };

        Ok(BounceLight { surface, volumetric })
    }
}
