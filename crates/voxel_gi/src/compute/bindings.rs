//! Dispatch inputs: uniforms, named volume bindings and the write target
//!
//! Names follow the binding contract of the light kernels:
//!
//! | uniform              | type       |
//! |----------------------|------------|
//! | `VolumeResolution`   | int3       |
//! | `VolumePosition`     | float3     |
//! | `VolumeSize`         | float3     |
//! | `RandomSeed`         | float      |
//! | `MaxBounceSamples`   | int        |
//!
//! Volume bindings are `SceneAlbedo`, `SceneNormal`, `SceneEmissive`,
//! `DirectLightSurface` and `Write`, plus `Seed`, `InputA` and `InputB` for
//! the bounce and combine kernels.

use bitflags::bitflags;

use crate::capture::{CaptureAxis, OverdrawPolicy, SliceBuffer, SliceChannel};
use crate::core::{BakeError, BakeResult};
use crate::foundation::math::{IVec3, UVec3, Vec3};
use crate::kernels::sampling::HemisphereMode;
use crate::lighting::LightBatch;
use crate::scene::EnvironmentMap;
use crate::volume::{AccumulationBuffer, Volume, VolumeGrid};

/// Uniform names
pub mod names {
    /// Voxel counts per axis
    pub const VOLUME_RESOLUTION: &str = "VolumeResolution";
    /// World-space volume center
    pub const VOLUME_POSITION: &str = "VolumePosition";
    /// World-space volume size
    pub const VOLUME_SIZE: &str = "VolumeSize";
    /// Per-dispatch random seed
    pub const RANDOM_SEED: &str = "RandomSeed";
    /// Samples per bounce, the accumulation divisor
    pub const MAX_BOUNCE_SAMPLES: &str = "MaxBounceSamples";
}

/// Volume binding names
pub mod slots {
    /// Scene albedo, alpha is occupancy
    pub const SCENE_ALBEDO: &str = "SceneAlbedo";
    /// Scene normals
    pub const SCENE_NORMAL: &str = "SceneNormal";
    /// Scene emission
    pub const SCENE_EMISSIVE: &str = "SceneEmissive";
    /// Direct surface light
    pub const DIRECT_LIGHT_SURFACE: &str = "DirectLightSurface";
    /// Radiance being redistributed by a bounce
    pub const SEED: &str = "Seed";
    /// First combine operand
    pub const INPUT_A: &str = "InputA";
    /// Second combine operand
    pub const INPUT_B: &str = "InputB";
    /// Write target
    pub const WRITE: &str = "Write";
}

bitflags! {
    /// Which light buffers are bound to a dispatch
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct LightFeatures: u32 {
        /// Directional light buffer present
        const DIRECTIONAL_LIGHTS = 1 << 0;
        /// Point light buffer present
        const POINT_LIGHTS = 1 << 1;
        /// Spot light buffer present
        const SPOT_LIGHTS = 1 << 2;
        /// Area light buffer present
        const AREA_LIGHTS = 1 << 3;
    }
}

/// Value of a named uniform
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    /// `int`
    Int(i32),
    /// `float`
    Float(f32),
    /// `int3`
    Int3(IVec3),
    /// `float3`
    Float3(Vec3),
}

/// Scalar inputs of a dispatch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Uniforms {
    /// `VolumeResolution`
    pub volume_resolution: IVec3,
    /// `VolumePosition`
    pub volume_position: Vec3,
    /// `VolumeSize`
    pub volume_size: Vec3,
    /// `RandomSeed`
    pub random_seed: f32,
    /// `MaxBounceSamples`
    pub max_bounce_samples: i32,
    /// Capability flags of the bound light batch
    pub features: LightFeatures,
}

impl Uniforms {
    /// Uniforms describing a grid, seed zero, one sample
    pub fn for_grid(grid: &VolumeGrid) -> Self {
        Self {
            volume_resolution: grid.resolution.map(|r| r as i32),
            volume_position: grid.center,
            volume_size: grid.size,
            random_seed: 0.0,
            max_bounce_samples: 1,
            features: LightFeatures::empty(),
        }
    }

    /// Builder: set `RandomSeed`
    pub fn with_seed(mut self, seed: f32) -> Self {
        self.random_seed = seed;
        self
    }

    /// Builder: set `MaxBounceSamples`
    pub fn with_max_samples(mut self, samples: u32) -> Self {
        self.max_bounce_samples = samples.max(1) as i32;
        self
    }

    /// Builder: set the light capability flags
    pub fn with_features(mut self, features: LightFeatures) -> Self {
        self.features = features;
        self
    }

    /// Look up a uniform by its binding name
    pub fn get(&self, name: &str) -> Option<UniformValue> {
        match name {
            names::VOLUME_RESOLUTION => Some(UniformValue::Int3(self.volume_resolution)),
            names::VOLUME_POSITION => Some(UniformValue::Float3(self.volume_position)),
            names::VOLUME_SIZE => Some(UniformValue::Float3(self.volume_size)),
            names::RANDOM_SEED => Some(UniformValue::Float(self.random_seed)),
            names::MAX_BOUNCE_SAMPLES => Some(UniformValue::Int(self.max_bounce_samples)),
            _ => None,
        }
    }

    /// Resolution as unsigned voxel counts
    pub fn resolution(&self) -> UVec3 {
        self.volume_resolution.map(|r| r.max(1) as u32)
    }

    /// Edge lengths of one voxel
    pub fn voxel_size(&self) -> Vec3 {
        self.volume_size.component_div(&self.resolution().cast::<f32>())
    }

    /// World-space center of a voxel
    pub fn voxel_center(&self, coord: &UVec3) -> Vec3 {
        let min = self.volume_position - self.volume_size * 0.5;
        min + coord.cast::<f32>().add_scalar(0.5).component_mul(&self.voxel_size())
    }
}

/// Kernel-specific switches that are not part of the shared uniform block
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KernelParams {
    /// Direction distribution of sampling kernels
    pub hemisphere: HemisphereMode,
    /// March occupancy shadows in volumetric light kernels
    pub volumetric_shadows: bool,
    /// Radiance multiplier of environment kernels
    pub intensity: f32,
    /// Axis (0 = X, 1 = Y, 2 = Z) of a blur pass
    pub blur_axis: usize,
    /// Tap radius of a blur pass
    pub blur_radius: u32,
    /// Share of `InputB` in an average pass
    pub blend_weight: f32,
    /// Capture axis of a voxelize pass
    pub capture_axis: CaptureAxis,
    /// Depth layer along the capture axis written by a voxelize pass
    pub capture_layer: u32,
    /// Overdraw policy of a voxelize pass
    pub overdraw: OverdrawPolicy,
    /// Slice attribute written by a voxelize pass
    pub channel: SliceChannel,
}

impl Default for KernelParams {
    fn default() -> Self {
        Self {
            hemisphere: HemisphereMode::default(),
            volumetric_shadows: false,
            intensity: 1.0,
            blur_axis: 0,
            blur_radius: 0,
            blend_weight: 0.5,
            capture_axis: CaptureAxis::PositiveX,
            capture_layer: 0,
            overdraw: OverdrawPolicy::default(),
            channel: SliceChannel::default(),
        }
    }
}

/// Everything one dispatch reads and writes
pub struct DispatchContext<'a> {
    /// Shared uniforms
    pub uniforms: Uniforms,
    /// Kernel switches
    pub params: KernelParams,
    inputs: Vec<(&'static str, &'a Volume)>,
    lights: Option<&'a LightBatch>,
    environment: Option<&'a EnvironmentMap>,
    slice: Option<&'a SliceBuffer>,
    write: &'a mut AccumulationBuffer,
    write_counts: Option<&'a mut [u32]>,
}

impl<'a> DispatchContext<'a> {
    /// Context writing into `write`
    pub fn new(uniforms: Uniforms, write: &'a mut AccumulationBuffer) -> Self {
        Self {
            uniforms,
            params: KernelParams::default(),
            inputs: Vec::new(),
            lights: None,
            environment: None,
            slice: None,
            write,
            write_counts: None,
        }
    }

    /// Bind a read-only volume under `name`
    pub fn bind(mut self, name: &'static str, volume: &'a Volume) -> Self {
        self.inputs.retain(|(n, _)| *n != name);
        self.inputs.push((name, volume));
        self
    }

    /// Builder: set kernel switches
    pub fn with_params(mut self, params: KernelParams) -> Self {
        self.params = params;
        self
    }

    /// Bind a light batch; its flags replace the uniform flags
    pub fn with_lights(mut self, lights: &'a LightBatch) -> Self {
        self.uniforms.features = lights.features();
        self.lights = Some(lights);
        self
    }

    /// Bind an environment map
    pub fn with_environment(mut self, environment: &'a EnvironmentMap) -> Self {
        self.environment = Some(environment);
        self
    }

    /// Bind a captured slice
    pub fn with_slice(mut self, slice: &'a SliceBuffer) -> Self {
        self.slice = Some(slice);
        self
    }

    /// Bind per-voxel write counters
    pub fn with_write_counts(mut self, counts: &'a mut [u32]) -> Self {
        self.write_counts = Some(counts);
        self
    }

    /// Whether a volume is bound under `name`
    pub fn has_input(&self, name: &str) -> bool {
        self.inputs.iter().any(|(n, _)| *n == name)
    }

    /// Volume bound under `name`
    pub fn input(&self, kernel: &'static str, name: &'static str) -> BakeResult<&'a Volume> {
        self.inputs
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| *v)
            .ok_or(BakeError::MissingBinding { kernel, binding: name })
    }

    /// Bound light batch
    pub fn lights(&self) -> Option<&'a LightBatch> {
        self.lights
    }

    /// Bound environment map
    pub fn environment(&self, kernel: &'static str) -> BakeResult<&'a EnvironmentMap> {
        self.environment.ok_or(BakeError::MissingBinding {
            kernel,
            binding: "EnvironmentMap",
        })
    }

    /// Bound capture slice
    pub fn slice(&self, kernel: &'static str) -> BakeResult<&'a SliceBuffer> {
        self.slice.ok_or(BakeError::MissingBinding {
            kernel,
            binding: "Slice",
        })
    }

    /// Write target
    pub fn write(&mut self) -> &mut AccumulationBuffer {
        &mut *self.write
    }

    /// Write target together with its counters, when bound
    pub fn write_with_counts(&mut self) -> (&mut AccumulationBuffer, Option<&mut [u32]>) {
        (&mut *self.write, self.write_counts.as_deref_mut())
    }

    /// Fail unless the write target matches the dispatch resolution
    pub fn check_write_shape(&self) -> BakeResult<()> {
        let expected = self.uniforms.resolution();
        let found = self.write.resolution();
        if expected != found {
            return Err(crate::volume::VolumeError::ShapeMismatch { expected, found }.into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_contract_names() {
        let grid = VolumeGrid::with_resolution(
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(4.0, 2.0, 2.0),
            UVec3::new(4, 2, 2),
        )
        .unwrap();
        let uniforms = Uniforms::for_grid(&grid).with_seed(0.25).with_max_samples(16);
        assert_eq!(
            uniforms.get("VolumeResolution"),
            Some(UniformValue::Int3(IVec3::new(4, 2, 2)))
        );
        assert_eq!(
            uniforms.get("VolumePosition"),
            Some(UniformValue::Float3(Vec3::new(1.0, 0.0, 0.0)))
        );
        assert_eq!(uniforms.get("VolumeSize"), Some(UniformValue::Float3(grid.size)));
        assert_eq!(uniforms.get("RandomSeed"), Some(UniformValue::Float(0.25)));
        assert_eq!(uniforms.get("MaxBounceSamples"), Some(UniformValue::Int(16)));
        assert_eq!(uniforms.get("Unknown"), None);
        assert_eq!(uniforms.voxel_center(&UVec3::new(0, 0, 0)), grid.voxel_center(&UVec3::new(0, 0, 0)));
    }

    #[test]
    fn test_missing_binding_is_reported() {
        let grid = VolumeGrid::with_resolution(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0), UVec3::new(1, 1, 1)).unwrap();
        let albedo = Volume::new(grid.resolution);
        let mut write = AccumulationBuffer::new(grid.resolution);
        let ctx = DispatchContext::new(Uniforms::for_grid(&grid), &mut write).bind(slots::SCENE_ALBEDO, &albedo);
        assert!(ctx.has_input(slots::SCENE_ALBEDO));
        assert!(ctx.input("test", slots::SCENE_ALBEDO).is_ok());
        let err = ctx.input("test", slots::SCENE_NORMAL).unwrap_err();
        assert!(matches!(err, BakeError::MissingBinding { binding: "SceneNormal", .. }));
    }
}
