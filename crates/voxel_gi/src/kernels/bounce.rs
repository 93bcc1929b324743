//! Bounce light kernels
//!
//! One dispatch draws one direction per voxel and adds the radiance found
//! where that direction hits the scene, scaled by `1 / MaxBounceSamples`.
//! The write target is never cleared here: a bounce is the sum of
//! `MaxBounceSamples` dispatches with different `RandomSeed`s.

use crate::compute::{slots, ComputeKernel, DispatchContext};
use crate::core::BakeResult;
use crate::foundation::math::Vec3;
use crate::kernels::march::{MarchHit, VoxelRay};
use crate::kernels::sampling::{voxel_rng, HemisphereMode};
use crate::kernels::{BOUNCE_SURFACE, BOUNCE_VOLUMETRIC};

/// One hemisphere sample of the seed radiance for every occupied voxel
///
/// Bindings: `SceneAlbedo`, `SceneNormal`, `Seed`. Unoccupied voxels are
/// left untouched; occupied ones get alpha equal to their occupancy.
pub struct BounceSurfaceKernel;

impl ComputeKernel for BounceSurfaceKernel {
    fn name(&self) -> &'static str {
        BOUNCE_SURFACE
    }

    fn execute(&self, ctx: &mut DispatchContext<'_>) -> BakeResult<()> {
        ctx.check_write_shape()?;
        let albedo = ctx.input(BOUNCE_SURFACE, slots::SCENE_ALBEDO)?;
        let normal = ctx.input(BOUNCE_SURFACE, slots::SCENE_NORMAL)?;
        let seed = ctx.input(BOUNCE_SURFACE, slots::SEED)?;
        albedo.ensure_same_shape(normal)?;
        albedo.ensure_same_shape(seed)?;

        let uniforms = ctx.uniforms;
        let mode = ctx.params.hemisphere;
        let voxel_size = uniforms.voxel_size();
        let scale = 1.0 / uniforms.max_bounce_samples.max(1) as f32;
        let out = ctx.write().volume_mut();
        out.ensure_same_shape(albedo)?;

        for (index, texel) in out.texels_mut().iter_mut().enumerate() {
            let surface = albedo.texels()[index];
            if surface.w <= 0.0 {
                continue;
            }
            let mut rng = voxel_rng(uniforms.random_seed, index);
            let n = normal.texels()[index].xyz();
            let sample = mode.sample(&n, &mut rng);
            let ray = VoxelRay::from_surface(&albedo.coord(index), &n, sample.direction);

            if let MarchHit::Occupied(hit) = ray.march(albedo, &voxel_size, f32::INFINITY) {
                let incoming = seed.get(&hit).xyz() * (sample.weight * scale);
                let gathered = surface.xyz().component_mul(&incoming);
                texel.x += gathered.x;
                texel.y += gathered.y;
                texel.z += gathered.z;
            }
            texel.w = surface.w;
        }
        Ok(())
    }
}

/// One uniform-sphere sample of the seed radiance for every voxel
///
/// Bindings: `SceneAlbedo` (occupancy), `Seed`. Output alpha is 1.
pub struct BounceVolumetricKernel;

impl ComputeKernel for BounceVolumetricKernel {
    fn name(&self) -> &'static str {
        BOUNCE_VOLUMETRIC
    }

    fn execute(&self, ctx: &mut DispatchContext<'_>) -> BakeResult<()> {
        ctx.check_write_shape()?;
        let occupancy = ctx.input(BOUNCE_VOLUMETRIC, slots::SCENE_ALBEDO)?;
        let seed = ctx.input(BOUNCE_VOLUMETRIC, slots::SEED)?;
        occupancy.ensure_same_shape(seed)?;

        let uniforms = ctx.uniforms;
        let voxel_size = uniforms.voxel_size();
        let scale = 1.0 / uniforms.max_bounce_samples.max(1) as f32;
        let out = ctx.write().volume_mut();
        out.ensure_same_shape(occupancy)?;

        for (index, texel) in out.texels_mut().iter_mut().enumerate() {
            let mut rng = voxel_rng(uniforms.random_seed, index);
            let sample = HemisphereMode::UniformSphere.sample(&Vec3::zeros(), &mut rng);
            let ray = VoxelRay::from_voxel(&occupancy.coord(index), sample.direction);

            if let MarchHit::Occupied(hit) = ray.march(occupancy, &voxel_size, f32::INFINITY) {
                let gathered = seed.get(&hit).xyz() * scale;
                texel.x += gathered.x;
                texel.y += gathered.y;
                texel.z += gathered.z;
            }
            texel.w = 1.0;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::Uniforms;
    use crate::foundation::math::{UVec3, Vec4};
    use crate::volume::{AccumulationBuffer, Volume, VolumeGrid};
    use approx::assert_relative_eq;

    /// Two facing walls: x = 0 lit with radiance 1, x = 3 unlit
    fn corridor() -> (VolumeGrid, Volume, Volume, Volume) {
        let grid = VolumeGrid::with_resolution(Vec3::zeros(), Vec3::repeat(4.0), UVec3::repeat(4)).unwrap();
        let mut albedo = Volume::new(grid.resolution);
        let mut normal = Volume::new(grid.resolution);
        let mut seed = Volume::new(grid.resolution);
        for y in 0..4 {
            for z in 0..4 {
                let lit = UVec3::new(0, y, z);
                let dark = UVec3::new(3, y, z);
                albedo.set(&lit, Vec4::new(1.0, 1.0, 1.0, 1.0));
                albedo.set(&dark, Vec4::new(0.5, 0.5, 0.5, 1.0));
                normal.set(&lit, Vec4::new(1.0, 0.0, 0.0, 1.0));
                normal.set(&dark, Vec4::new(-1.0, 0.0, 0.0, 1.0));
                seed.set(&lit, Vec4::new(1.0, 1.0, 1.0, 1.0));
            }
        }
        (grid, albedo, normal, seed)
    }

    #[test]
    fn test_surface_bounce_gathers_from_seed() {
        let (grid, albedo, normal, seed) = corridor();
        let mut out = AccumulationBuffer::new(grid.resolution);
        let samples = 64;
        for s in 0..samples {
            let uniforms = Uniforms::for_grid(&grid)
                .with_seed(s as f32 / samples as f32)
                .with_max_samples(samples);
            let mut ctx = DispatchContext::new(uniforms, &mut out)
                .bind(slots::SCENE_ALBEDO, &albedo)
                .bind(slots::SCENE_NORMAL, &normal)
                .bind(slots::SEED, &seed);
            BounceSurfaceKernel.execute(&mut ctx).unwrap();
        }

        let out = out.into_volume();
        let dark = out.get(&UVec3::new(3, 1, 1));
        assert!(dark.x > 0.0 && dark.x <= 0.5 + 1e-5, "dark wall {dark:?}");
        assert_relative_eq!(dark.w, 1.0);
        // the lit wall only sees the unlit wall
        assert_eq!(out.get(&UVec3::new(0, 1, 1)).x, 0.0);
        // empty space is never written
        assert_eq!(out.get(&UVec3::new(1, 1, 1)), Vec4::zeros());
    }

    #[test]
    fn test_surface_bounce_accumulates_across_dispatches() {
        let (grid, albedo, normal, seed) = corridor();
        let mut out = AccumulationBuffer::new(grid.resolution);
        let uniforms = Uniforms::for_grid(&grid).with_seed(0.5).with_max_samples(1);
        for _ in 0..2 {
            let mut ctx = DispatchContext::new(uniforms, &mut out)
                .bind(slots::SCENE_ALBEDO, &albedo)
                .bind(slots::SCENE_NORMAL, &normal)
                .bind(slots::SEED, &seed);
            BounceSurfaceKernel.execute(&mut ctx).unwrap();
        }
        // identical seeds draw identical directions, so the second pass doubles the first
        let mut single = AccumulationBuffer::new(grid.resolution);
        let mut ctx = DispatchContext::new(uniforms, &mut single)
            .bind(slots::SCENE_ALBEDO, &albedo)
            .bind(slots::SCENE_NORMAL, &normal)
            .bind(slots::SEED, &seed);
        BounceSurfaceKernel.execute(&mut ctx).unwrap();
        for (a, b) in out.as_volume().texels().iter().zip(single.as_volume().texels()) {
            assert_relative_eq!(a.xyz(), b.xyz() * 2.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_volumetric_bounce_writes_every_voxel() {
        let (grid, albedo, _, seed) = corridor();
        let mut out = AccumulationBuffer::new(grid.resolution);
        let mut ctx = DispatchContext::new(Uniforms::for_grid(&grid).with_seed(0.3), &mut out)
            .bind(slots::SCENE_ALBEDO, &albedo)
            .bind(slots::SEED, &seed);
        BounceVolumetricKernel.execute(&mut ctx).unwrap();
        assert!(out.as_volume().texels().iter().all(|t| t.w == 1.0));
        assert!(out.as_volume().texels().iter().all(|t| t.x <= 1.0));
    }

    #[test]
    fn test_missing_seed_binding() {
        let (grid, albedo, normal, _) = corridor();
        let mut out = AccumulationBuffer::new(grid.resolution);
        let mut ctx = DispatchContext::new(Uniforms::for_grid(&grid), &mut out)
            .bind(slots::SCENE_ALBEDO, &albedo)
            .bind(slots::SCENE_NORMAL, &normal);
        assert!(BounceSurfaceKernel.execute(&mut ctx).is_err());
    }
}
