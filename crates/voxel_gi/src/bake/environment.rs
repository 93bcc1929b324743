//! Environment light solve

use rand::Rng;

use crate::bake::{sample_seeds, BakeContext, SceneVolumes};
use crate::compute::{slots, ComputeKernel, DispatchContext, KernelParams, Uniforms};
use crate::core::{BakeResult, BakeStage};
use crate::kernels::sampling::HemisphereMode;
use crate::kernels::{ENVIRONMENT_SURFACE, ENVIRONMENT_VOLUMETRIC};
use crate::scene::EnvironmentMap;
use crate::volume::{AccumulationBuffer, Volume, VolumeRole};

/// Output of the environment light solve
#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentLight {
    /// Sky light on surfaces
    pub surface: Volume,
    /// Sky light through the whole volume, when enabled
    pub volumetric: Option<Volume>,
}

/// Monte-Carlo sky lighting
///
/// Every sample is one dispatch with a fresh `RandomSeed`, throttled through
/// the bake context like the bounce passes.
#[derive(Debug, Clone, Copy)]
pub struct EnvironmentLightSolver {
    /// Samples per voxel on surfaces
    pub surface_samples: u32,
    /// Samples per voxel of the volumetric variant, zero skips it
    pub volumetric_samples: u32,
    /// Direction distribution on surfaces
    pub hemisphere: HemisphereMode,
    /// Radiance multiplier
    pub intensity: f32,
    /// RNG seed
    pub seed: u64,
}

impl Default for EnvironmentLightSolver {
    fn default() -> Self {
        Self {
            surface_samples: 64,
            volumetric_samples: 0,
            hemisphere: HemisphereMode::default(),
            intensity: 1.0,
            seed: 0,
        }
    }
}

impl EnvironmentLightSolver {
    /// Sample `environment` for every voxel of `volumes`
    pub fn solve(
        &self,
        cx: &mut BakeContext,
        volumes: &SceneVolumes,
        environment: &EnvironmentMap,
    ) -> BakeResult<EnvironmentLight> {
        let surface_kernel = cx.kernel(ENVIRONMENT_SURFACE)?;
        let volumetric_kernel = if self.volumetric_samples > 0 {
            Some(cx.kernel(ENVIRONMENT_VOLUMETRIC)?)
        } else {
            None
        };
        let total = (self.surface_samples + self.volumetric_samples) as usize;

        let surface = self.accumulate(
            cx,
            surface_kernel.as_ref(),
            volumes,
            environment,
            self.surface_samples,
            0,
            total,
        )?;
        let volumetric = match volumetric_kernel {
            Some(kernel) => Some(self.accumulate(
                cx,
                kernel.as_ref(),
                volumes,
                environment,
                self.volumetric_samples,
                self.surface_samples as usize,
                total,
            )?),
            None => None,
        };

        Ok(EnvironmentLight {
            surface: surface.resolve(VolumeRole::EnvironmentSurface.format()),
            volumetric: volumetric.map(|b| b.resolve(VolumeRole::EnvironmentVolumetric.format())),
        })
    }

    fn accumulate(
        &self,
        cx: &mut BakeContext,
        kernel: &dyn ComputeKernel,
        volumes: &SceneVolumes,
        environment: &EnvironmentMap,
        samples: u32,
        done: usize,
        total: usize,
    ) -> BakeResult<AccumulationBuffer> {
        let mut seeds = sample_seeds(self.seed, kernel.name());
        let mut write = AccumulationBuffer::new(volumes.grid.resolution);
        let params = KernelParams {
            hemisphere: self.hemisphere,
            intensity: self.intensity,
            ..KernelParams::default()
        };

        for sample in 0..samples {
            let uniforms = Uniforms::for_grid(&volumes.grid)
                .with_seed(seeds.gen())
                .with_max_samples(samples);
            let mut ctx = DispatchContext::new(uniforms, &mut write)
                .bind(slots::SCENE_ALBEDO, &volumes.albedo)
                .bind(slots::SCENE_NORMAL, &volumes.normal)
                .with_environment(environment)
                .with_params(params);
            cx.submit(kernel, &mut ctx)?;
            cx.progress(BakeStage::Environment, done + sample as usize + 1, total);
        }
        cx.drain()?;
        log::debug!("{}: {} samples", kernel.name(), samples);
        Ok(write)
    }
}
