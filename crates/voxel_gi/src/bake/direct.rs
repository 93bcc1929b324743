//! Direct light solve

use crate::bake::{BakeContext, SceneVolumes};
use crate::compute::{slots, DispatchContext, KernelParams, Uniforms};
use crate::core::BakeResult;
use crate::kernels::{DIRECT_SURFACE, DIRECT_VOLUMETRIC};
use crate::lighting::{EncodedLights, LightBatch};
use crate::volume::{AccumulationBuffer, Volume, VolumeRole};

/// Output of the direct light solve
#[derive(Debug, Clone, PartialEq)]
pub struct DirectLight {
    /// Direct light plus emission on surfaces
    pub surface: Volume,
    /// Direct light through the whole volume, when enabled
    pub volumetric: Option<Volume>,
}

/// Evaluates every light once per voxel
///
/// One dispatch per variant; no sampling and no iteration. The light batch
/// lives for the duration of [`DirectLightSolver::solve`] and is released
/// on every return path.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectLightSolver {
    /// Also produce the volumetric variant
    pub volumetric: bool,
    /// Occupancy shadows in the volumetric variant
    pub volumetric_shadows: bool,
}

impl DirectLightSolver {
    /// Solver for the surface variant only
    pub fn surface_only() -> Self {
        Self::default()
    }

    /// Solve direct light for `volumes` lit by `lights`
    pub fn solve(&self, cx: &mut BakeContext, volumes: &SceneVolumes, lights: &EncodedLights) -> BakeResult<DirectLight> {
        let surface_kernel = cx.kernel(DIRECT_SURFACE)?;
        let volumetric_kernel = if self.volumetric {
            Some(cx.kernel(DIRECT_VOLUMETRIC)?)
        } else {
            None
        };

        let batch = LightBatch::upload(lights, cx.memory());
        log::debug!(
            "Uploaded {} lights ({} bytes, features {:?})",
            lights.len(),
            batch.byte_size(),
            batch.features()
        );
        let uniforms = Uniforms::for_grid(&volumes.grid);

        let mut surface = AccumulationBuffer::new(volumes.grid.resolution);
        let mut ctx = DispatchContext::new(uniforms, &mut surface)
            .bind(slots::SCENE_ALBEDO, &volumes.albedo)
            .bind(slots::SCENE_NORMAL, &volumes.normal)
            .bind(slots::SCENE_EMISSIVE, &volumes.emissive)
            .with_lights(&batch);
        cx.submit(surface_kernel.as_ref(), &mut ctx)?;

        let mut volumetric = None;
        if let Some(kernel) = volumetric_kernel {
            let mut buffer = AccumulationBuffer::new(volumes.grid.resolution);
            let params = KernelParams {
                volumetric_shadows: self.volumetric_shadows,
                ..KernelParams::default()
            };
            let mut ctx = DispatchContext::new(uniforms, &mut buffer)
                .bind(slots::SCENE_ALBEDO, &volumes.albedo)
                .with_lights(&batch)
                .with_params(params);
            cx.submit(kernel.as_ref(), &mut ctx)?;
            volumetric = Some(buffer);
        }
        cx.drain()?;

        Ok(DirectLight {
            surface: surface.resolve(VolumeRole::DirectSurface.format()),
            volumetric: volumetric.map(|b| b.resolve(VolumeRole::DirectVolumetric.format())),
        })
    }
}
