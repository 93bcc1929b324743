//! Environment light kernels
//!
//! Same sampling scheme as the bounce kernels, but radiance comes from the
//! environment map along directions that leave the volume unobstructed.

use crate::compute::{slots, ComputeKernel, DispatchContext};
use crate::core::BakeResult;
use crate::foundation::math::Vec3;
use crate::kernels::march::{MarchHit, VoxelRay};
use crate::kernels::sampling::{voxel_rng, HemisphereMode};
use crate::kernels::{ENVIRONMENT_SURFACE, ENVIRONMENT_VOLUMETRIC};

/// One hemisphere sample of the sky for every occupied voxel
///
/// Bindings: `SceneAlbedo`, `SceneNormal` and the environment map.
pub struct EnvironmentSurfaceKernel;

impl ComputeKernel for EnvironmentSurfaceKernel {
    fn name(&self) -> &'static str {
        ENVIRONMENT_SURFACE
    }

    fn execute(&self, ctx: &mut DispatchContext<'_>) -> BakeResult<()> {
        ctx.check_write_shape()?;
        let albedo = ctx.input(ENVIRONMENT_SURFACE, slots::SCENE_ALBEDO)?;
        let normal = ctx.input(ENVIRONMENT_SURFACE, slots::SCENE_NORMAL)?;
        let environment = ctx.environment(ENVIRONMENT_SURFACE)?;
        albedo.ensure_same_shape(normal)?;

        let uniforms = ctx.uniforms;
        let params = ctx.params;
        let voxel_size = uniforms.voxel_size();
        let scale = params.intensity / uniforms.max_bounce_samples.max(1) as f32;
        let out = ctx.write().volume_mut();
        out.ensure_same_shape(albedo)?;

        for (index, texel) in out.texels_mut().iter_mut().enumerate() {
            let surface = albedo.texels()[index];
            if surface.w <= 0.0 {
                continue;
            }
            let mut rng = voxel_rng(uniforms.random_seed, index);
            let n = normal.texels()[index].xyz();
            let sample = params.hemisphere.sample(&n, &mut rng);
            let ray = VoxelRay::from_surface(&albedo.coord(index), &n, sample.direction);

            if ray.march(albedo, &voxel_size, f32::INFINITY) == MarchHit::Escaped {
                let sky = environment.sample(&sample.direction) * (sample.weight * scale);
                let gathered = surface.xyz().component_mul(&sky);
                texel.x += gathered.x;
                texel.y += gathered.y;
                texel.z += gathered.z;
            }
            texel.w = surface.w;
        }
        Ok(())
    }
}

/// One uniform-sphere sample of the sky for every voxel
///
/// Bindings: `SceneAlbedo` (occupancy) and the environment map. Output
/// alpha is 1.
pub struct EnvironmentVolumetricKernel;

impl ComputeKernel for EnvironmentVolumetricKernel {
    fn name(&self) -> &'static str {
        ENVIRONMENT_VOLUMETRIC
    }

    fn execute(&self, ctx: &mut DispatchContext<'_>) -> BakeResult<()> {
        ctx.check_write_shape()?;
        let occupancy = ctx.input(ENVIRONMENT_VOLUMETRIC, slots::SCENE_ALBEDO)?;
        let environment = ctx.environment(ENVIRONMENT_VOLUMETRIC)?;

        let uniforms = ctx.uniforms;
        let voxel_size = uniforms.voxel_size();
        let scale = ctx.params.intensity / uniforms.max_bounce_samples.max(1) as f32;
        let out = ctx.write().volume_mut();
        out.ensure_same_shape(occupancy)?;

        for (index, texel) in out.texels_mut().iter_mut().enumerate() {
            let mut rng = voxel_rng(uniforms.random_seed, index);
            let sample = HemisphereMode::UniformSphere.sample(&Vec3::zeros(), &mut rng);
            let ray = VoxelRay::from_voxel(&occupancy.coord(index), sample.direction);

            if ray.march(occupancy, &voxel_size, f32::INFINITY) == MarchHit::Escaped {
                let sky = environment.sample(&sample.direction) * scale;
                texel.x += sky.x;
                texel.y += sky.y;
                texel.z += sky.z;
            }
            texel.w = 1.0;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::{KernelParams, Uniforms};
    use crate::foundation::math::{UVec3, Vec4};
    use crate::scene::EnvironmentMap;
    use crate::volume::{AccumulationBuffer, Volume, VolumeGrid};
    use approx::assert_relative_eq;

    fn grid() -> VolumeGrid {
        VolumeGrid::with_resolution(Vec3::zeros(), Vec3::repeat(3.0), UVec3::repeat(3)).unwrap()
    }

    #[test]
    fn test_open_surface_sees_uniform_sky() {
        let grid = grid();
        let mut albedo = Volume::new(grid.resolution);
        let mut normal = Volume::new(grid.resolution);
        let top = UVec3::new(1, 2, 1);
        albedo.set(&top, Vec4::new(0.5, 0.5, 0.5, 1.0));
        normal.set(&top, Vec4::new(0.0, 1.0, 0.0, 1.0));
        let sky = EnvironmentMap::uniform(Vec3::new(1.0, 1.0, 1.0));

        let samples = 16;
        let mut out = AccumulationBuffer::new(grid.resolution);
        for s in 0..samples {
            let uniforms = Uniforms::for_grid(&grid)
                .with_seed(s as f32 + 1.0)
                .with_max_samples(samples);
            let params = KernelParams {
                intensity: 2.0,
                ..KernelParams::default()
            };
            let mut ctx = DispatchContext::new(uniforms, &mut out)
                .bind(slots::SCENE_ALBEDO, &albedo)
                .bind(slots::SCENE_NORMAL, &normal)
                .with_environment(&sky)
                .with_params(params);
            EnvironmentSurfaceKernel.execute(&mut ctx).unwrap();
        }

        // every upward sample escapes: albedo * sky * intensity
        assert_relative_eq!(out.as_volume().get(&top), Vec4::new(1.0, 1.0, 1.0, 1.0), epsilon = 1e-4);
        assert_eq!(out.as_volume().occupied_count(), 1);
    }

    #[test]
    fn test_flat_floor_is_not_shadowed_by_itself() {
        let grid = VolumeGrid::with_resolution(Vec3::zeros(), Vec3::new(8.0, 3.0, 8.0), UVec3::new(8, 3, 8)).unwrap();
        let mut albedo = Volume::new(grid.resolution);
        let mut normal = Volume::new(grid.resolution);
        for x in 0..8 {
            for z in 0..8 {
                albedo.set(&UVec3::new(x, 0, z), Vec4::new(1.0, 1.0, 1.0, 1.0));
                normal.set(&UVec3::new(x, 0, z), Vec4::new(0.0, 1.0, 0.0, 1.0));
            }
        }
        let sky = EnvironmentMap::uniform(Vec3::new(1.0, 1.0, 1.0));

        let samples = 32;
        let mut out = AccumulationBuffer::new(grid.resolution);
        for s in 0..samples {
            let uniforms = Uniforms::for_grid(&grid)
                .with_seed(s as f32 + 0.25)
                .with_max_samples(samples);
            let mut ctx = DispatchContext::new(uniforms, &mut out)
                .bind(slots::SCENE_ALBEDO, &albedo)
                .bind(slots::SCENE_NORMAL, &normal)
                .with_environment(&sky);
            EnvironmentSurfaceKernel.execute(&mut ctx).unwrap();
        }

        for coord in [UVec3::new(4, 0, 4), UVec3::new(0, 0, 0), UVec3::new(7, 0, 3)] {
            assert_relative_eq!(out.as_volume().get(&coord), Vec4::new(1.0, 1.0, 1.0, 1.0), epsilon = 1e-4);
        }
    }

    #[test]
    fn test_enclosed_voxel_sees_no_sky() {
        let grid = grid();
        let mut albedo = Volume::filled(grid.resolution, Vec4::new(1.0, 1.0, 1.0, 1.0));
        let center = UVec3::new(1, 1, 1);
        albedo.set(&center, Vec4::zeros());
        let sky = EnvironmentMap::uniform(Vec3::new(1.0, 1.0, 1.0));

        let mut out = AccumulationBuffer::new(grid.resolution);
        let mut ctx = DispatchContext::new(Uniforms::for_grid(&grid).with_seed(0.7), &mut out)
            .bind(slots::SCENE_ALBEDO, &albedo)
            .with_environment(&sky);
        EnvironmentVolumetricKernel.execute(&mut ctx).unwrap();
        assert_eq!(out.as_volume().get(&center), Vec4::new(0.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn test_missing_environment_binding() {
        let grid = grid();
        let albedo = Volume::new(grid.resolution);
        let mut out = AccumulationBuffer::new(grid.resolution);
        let mut ctx = DispatchContext::new(Uniforms::for_grid(&grid), &mut out).bind(slots::SCENE_ALBEDO, &albedo);
        assert!(EnvironmentVolumetricKernel.execute(&mut ctx).is_err());
    }
}
