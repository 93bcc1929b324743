//! Direct light kernels
//!
//! Both kernels evaluate every present light type per voxel. A light type
//! whose [`LightFeatures`] flag is cleared is never visited, so no kernel loop
//! tests for a missing buffer. The surface kernel only lights occupied voxels
//! and adds their emission; the volumetric kernel lights every voxel and has
//! no notion of a surface.

use crate::compute::{slots, ComputeKernel, DispatchContext, LightFeatures, Uniforms};
use crate::core::BakeResult;
use crate::foundation::math::{utils, UVec3, Vec3, Vec4};
use crate::kernels::march::{MarchHit, VoxelRay};
use crate::kernels::{DIRECT_SURFACE, DIRECT_VOLUMETRIC};
use crate::lighting::EncodedLights;
use crate::volume::Volume;

/// Distances below this are treated as this for inverse-square falloff
const MIN_DISTANCE_SQUARED: f32 = 1e-4;

/// Per-axis sample offsets of the 4x4 area light grid, in units of its size
const AREA_OFFSETS: [f32; 4] = [-0.375, -0.125, 0.125, 0.375];

/// Where and how a voxel is lit
struct Receiver<'v> {
    coord: UVec3,
    position: Vec3,
    /// `None` (volumetric, or no usable normal) lights with `N.L = 1`
    normal: Option<Vec3>,
    /// `None` disables shadow marching
    occupancy: Option<&'v Volume>,
    voxel_size: Vec3,
}

impl Receiver<'_> {
    fn n_dot_l(&self, to_light: &Vec3) -> f32 {
        self.normal.map_or(1.0, |n| n.dot(to_light).max(0.0))
    }

    fn visible(&self, to_light: &Vec3, distance: f32) -> bool {
        let Some(occupancy) = self.occupancy else {
            return true;
        };
        let ray = match &self.normal {
            Some(normal) => VoxelRay::from_surface(&self.coord, normal, *to_light),
            None => VoxelRay::from_voxel(&self.coord, *to_light),
        };
        !matches!(ray.march(occupancy, &self.voxel_size, distance), MarchHit::Occupied(_))
    }
}

fn directional(lights: &EncodedLights, receiver: &Receiver<'_>) -> Vec3 {
    let mut sum = Vec3::zeros();
    for light in &lights.directional {
        let Some(to_light) = (-light.direction()).try_normalize(f32::EPSILON) else {
            continue;
        };
        let n_dot_l = receiver.n_dot_l(&to_light);
        if n_dot_l <= 0.0 || !receiver.visible(&to_light, f32::INFINITY) {
            continue;
        }
        sum += light.color() * n_dot_l;
    }
    sum
}

/// Unit direction, distance and inverse-square falloff towards a light
fn towards(receiver: &Receiver<'_>, position: &Vec3, range: f32) -> Option<(Vec3, f32, f32)> {
    let offset = position - receiver.position;
    let distance = offset.norm();
    if distance > range || distance <= f32::EPSILON {
        return None;
    }
    let falloff = 1.0 / (distance * distance).max(MIN_DISTANCE_SQUARED);
    Some((offset / distance, distance, falloff))
}

fn point(lights: &EncodedLights, receiver: &Receiver<'_>) -> Vec3 {
    let mut sum = Vec3::zeros();
    for light in &lights.point {
        let Some((to_light, distance, falloff)) = towards(receiver, &light.position(), light.range) else {
            continue;
        };
        let n_dot_l = receiver.n_dot_l(&to_light);
        if n_dot_l <= 0.0 || !receiver.visible(&to_light, distance) {
            continue;
        }
        sum += light.color() * (n_dot_l * falloff);
    }
    sum
}

/// Linear ramp from the cone edge (0) to the axis (1)
fn cone_factor(axis: &Vec3, from_light: &Vec3, angle_degrees: f32) -> f32 {
    let cos_half = utils::deg_to_rad(angle_degrees * 0.5).cos();
    let cos_theta = axis.dot(from_light);
    if cos_half >= 1.0 {
        return 0.0;
    }
    utils::saturate((cos_theta - cos_half) / (1.0 - cos_half))
}

fn spot(lights: &EncodedLights, receiver: &Receiver<'_>) -> Vec3 {
    let mut sum = Vec3::zeros();
    for light in &lights.spot {
        let Some((to_light, distance, falloff)) = towards(receiver, &light.position(), light.range) else {
            continue;
        };
        let Some(axis) = light.direction().try_normalize(f32::EPSILON) else {
            continue;
        };
        let cone = cone_factor(&axis, &-to_light, light.angle);
        let n_dot_l = receiver.n_dot_l(&to_light);
        if cone <= 0.0 || n_dot_l <= 0.0 || !receiver.visible(&to_light, distance) {
            continue;
        }
        sum += light.color() * (n_dot_l * falloff * cone);
    }
    sum
}

fn area(lights: &EncodedLights, receiver: &Receiver<'_>) -> Vec3 {
    let mut sum = Vec3::zeros();
    for light in &lights.area {
        let size = light.size();
        let sample_area = size.x * size.y / (AREA_OFFSETS.len() * AREA_OFFSETS.len()) as f32;
        let forward = light.forward();
        let (right, up) = (light.right(), light.up());

        for sx in AREA_OFFSETS {
            for sy in AREA_OFFSETS {
                let position = light.position() + right * (sx * size.x) + up * (sy * size.y);
                let Some((to_light, distance, falloff)) = towards(receiver, &position, light.range) else {
                    continue;
                };
                // one-sided emitter
                let emit = forward.dot(&-to_light);
                let n_dot_l = receiver.n_dot_l(&to_light);
                if emit <= 0.0 || n_dot_l <= 0.0 || !receiver.visible(&to_light, distance) {
                    continue;
                }
                sum += light.color() * (n_dot_l * emit * sample_area * falloff);
            }
        }
    }
    sum
}

/// Sum of every light type enabled in `features`
fn incoming(features: LightFeatures, lights: &EncodedLights, receiver: &Receiver<'_>) -> Vec3 {
    let mut sum = Vec3::zeros();
    if features.contains(LightFeatures::DIRECTIONAL_LIGHTS) {
        sum += directional(lights, receiver);
    }
    if features.contains(LightFeatures::POINT_LIGHTS) {
        sum += point(lights, receiver);
    }
    if features.contains(LightFeatures::SPOT_LIGHTS) {
        sum += spot(lights, receiver);
    }
    if features.contains(LightFeatures::AREA_LIGHTS) {
        sum += area(lights, receiver);
    }
    sum
}

/// Light records of the bound batch, empty without one
fn bound_lights(ctx: &DispatchContext<'_>) -> BakeResult<(LightFeatures, EncodedLights)> {
    match ctx.lights() {
        Some(batch) => Ok((ctx.uniforms.features & batch.features(), batch.decode()?)),
        None => Ok((LightFeatures::empty(), EncodedLights::default())),
    }
}

fn voxel_receiver(uniforms: &Uniforms, volume: &Volume, index: usize) -> (UVec3, Vec3) {
    let coord = volume.coord(index);
    (coord, uniforms.voxel_center(&coord))
}

/// Direct light on occupied voxels plus their emission
///
/// Bindings: `SceneAlbedo`, `SceneNormal`, `SceneEmissive`. The output
/// alpha is the albedo occupancy.
pub struct DirectSurfaceKernel;

impl ComputeKernel for DirectSurfaceKernel {
    fn name(&self) -> &'static str {
        DIRECT_SURFACE
    }

    fn execute(&self, ctx: &mut DispatchContext<'_>) -> BakeResult<()> {
        ctx.check_write_shape()?;
        let albedo = ctx.input(DIRECT_SURFACE, slots::SCENE_ALBEDO)?;
        let normal = ctx.input(DIRECT_SURFACE, slots::SCENE_NORMAL)?;
        let emissive = ctx.input(DIRECT_SURFACE, slots::SCENE_EMISSIVE)?;
        albedo.ensure_same_shape(normal)?;
        albedo.ensure_same_shape(emissive)?;

        let (features, lights) = bound_lights(ctx)?;
        let uniforms = ctx.uniforms;
        let voxel_size = uniforms.voxel_size();
        let out = ctx.write().volume_mut();
        out.ensure_same_shape(albedo)?;

        for (index, texel) in out.texels_mut().iter_mut().enumerate() {
            let surface = albedo.texels()[index];
            if surface.w <= 0.0 {
                *texel = Vec4::zeros();
                continue;
            }
            let (coord, position) = voxel_receiver(&uniforms, albedo, index);
            let receiver = Receiver {
                coord,
                position,
                normal: normal.texels()[index].xyz().try_normalize(f32::EPSILON),
                occupancy: Some(albedo),
                voxel_size,
            };
            let light = incoming(features, &lights, &receiver);
            let radiance = surface.xyz().component_mul(&light) + emissive.texels()[index].xyz();
            *texel = radiance.push(surface.w);
        }
        Ok(())
    }
}

/// Direct light at every voxel of the volume
///
/// Binding: `SceneAlbedo` (occupancy, only read with volumetric shadows).
/// The output alpha is 1.
pub struct DirectVolumetricKernel;

impl ComputeKernel for DirectVolumetricKernel {
    fn name(&self) -> &'static str {
        DIRECT_VOLUMETRIC
    }

    fn execute(&self, ctx: &mut DispatchContext<'_>) -> BakeResult<()> {
        ctx.check_write_shape()?;
        let occupancy = ctx.input(DIRECT_VOLUMETRIC, slots::SCENE_ALBEDO)?;
        let shadows = ctx.params.volumetric_shadows;

        let (features, lights) = bound_lights(ctx)?;
        let uniforms = ctx.uniforms;
        let voxel_size = uniforms.voxel_size();
        let out = ctx.write().volume_mut();
        out.ensure_same_shape(occupancy)?;

        for (index, texel) in out.texels_mut().iter_mut().enumerate() {
            let (coord, position) = voxel_receiver(&uniforms, occupancy, index);
            let receiver = Receiver {
                coord,
                position,
                normal: None,
                occupancy: shadows.then_some(occupancy),
                voxel_size,
            };
            *texel = incoming(features, &lights, &receiver).push(1.0);
        }
        Ok(())
    }
}
