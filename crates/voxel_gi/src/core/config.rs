//! # Bake Settings
//!
//! Every knob of a bake, grouped by the stage that reads it. The groups are
//! plain serde structs so a whole [`BakeSettings`] can be stored as TOML or
//! RON through the [`Config`] trait.
//!
//! ## Groups
//!
//! - **Volume**: placement and density of the voxel grid
//! - **Voxelize**: overdraw policy per channel and meta texture size
//! - **Lighting**: bounce and environment sample counts, sampling mode, seed
//! - **Device**: dispatch throttle and the emulated driver watchdog
//! - **Combine**: how final volumes are merged and blurred
//! - **Output**: where and under which name volumes are written

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub use crate::config::{Config, ConfigError};

use crate::capture::{OverdrawPolicy, SliceChannel};
use crate::core::{BakeError, BakeResult};
use crate::foundation::math::{Aabb, Vec3};
use crate::kernels::sampling::HemisphereMode;
use crate::volume::{VolumeError, VolumeGrid};

/// # Volume Settings
///
/// World-space placement of the voxel grid. With `fit_to_scene` the center
/// and size come from the scene bounds grown by `padding` on every side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeSettings {
    /// World-space center
    pub center: Vec3,
    /// World-space size
    pub size: Vec3,
    /// Edge length of one voxel
    pub voxel_density: f32,
    /// Derive center and size from the scene bounds
    pub fit_to_scene: bool,
    /// Margin added around the scene bounds when fitting
    pub padding: f32,
}

impl VolumeSettings {
    /// Volume of `size` centered at `center`
    pub fn new(center: Vec3, size: Vec3, voxel_density: f32) -> Self {
        Self {
            center,
            size,
            voxel_density,
            fit_to_scene: false,
            padding: 0.0,
        }
    }

    /// Set voxel density
    pub fn with_density(mut self, density: f32) -> Self {
        self.voxel_density = density;
        self
    }

    /// Fit to scene bounds with a margin
    pub fn with_fit_to_scene(mut self, padding: f32) -> Self {
        self.fit_to_scene = true;
        self.padding = padding;
        self
    }

    /// Grid for these settings
    ///
    /// `scene_bounds` is only consulted with `fit_to_scene`; fitting an empty
    /// scene falls back to the configured center and size.
    pub fn grid(&self, scene_bounds: Option<&Aabb>) -> Result<VolumeGrid, VolumeError> {
        let (center, size) = match scene_bounds.filter(|_| self.fit_to_scene) {
            Some(bounds) => (bounds.center(), bounds.size().add_scalar(2.0 * self.padding)),
            None => (self.center, self.size),
        };
        VolumeGrid::from_density(center, size, self.voxel_density)
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<(), String> {
        if !(self.voxel_density > 0.0 && self.voxel_density.is_finite()) {
            return Err(format!("Voxel density must be positive, got {}", self.voxel_density));
        }
        if !self.fit_to_scene && self.size.iter().any(|s| !(*s > 0.0)) {
            return Err(format!("Volume size must be positive, got {:?}", self.size));
        }
        if self.padding < 0.0 {
            return Err("Volume padding cannot be negative".to_string());
        }
        if !self.fit_to_scene {
            self.grid(None).map_err(|err| err.to_string())?;
        }
        Ok(())
    }
}

impl Default for VolumeSettings {
    fn default() -> Self {
        Self::new(Vec3::zeros(), Vec3::repeat(10.0), 0.25)
    }
}

/// # Voxelize Settings
///
/// Overdraw is resolved per channel, so e.g. albedo can keep the first hit
/// while normals are averaged across capture axes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoxelizeSettings {
    /// Overdraw policy of the albedo volume
    pub albedo_overdraw: OverdrawPolicy,
    /// Overdraw policy of the normal volume
    pub normal_overdraw: OverdrawPolicy,
    /// Overdraw policy of the emissive volume
    pub emissive_overdraw: OverdrawPolicy,
    /// Texel size of the meta textures built by the surface provider
    pub meta_texture_resolution: u32,
}

impl VoxelizeSettings {
    /// Use one policy for every channel
    pub fn with_overdraw(mut self, policy: OverdrawPolicy) -> Self {
        self.albedo_overdraw = policy;
        self.normal_overdraw = policy;
        self.emissive_overdraw = policy;
        self
    }

    /// Policy of one channel
    pub fn overdraw(&self, channel: SliceChannel) -> OverdrawPolicy {
        match channel {
            SliceChannel::Albedo => self.albedo_overdraw,
            SliceChannel::Normal => self.normal_overdraw,
            SliceChannel::Emissive => self.emissive_overdraw,
        }
    }
}

impl Default for VoxelizeSettings {
    fn default() -> Self {
        Self {
            albedo_overdraw: OverdrawPolicy::FirstWriteWins,
            normal_overdraw: OverdrawPolicy::FirstWriteWins,
            emissive_overdraw: OverdrawPolicy::FirstWriteWins,
            meta_texture_resolution: crate::meta::DEFAULT_META_RESOLUTION,
        }
    }
}

/// # Lighting Settings
///
/// Sample counts are per voxel; each sample is one dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingSettings {
    /// Bounce iterations, zero skips the bounce stage
    pub bounces: u32,
    /// Samples per bounce on surfaces
    pub bounce_surface_samples: u32,
    /// Samples of the volumetric bounce
    pub bounce_volumetric_samples: u32,
    /// Sky samples on surfaces
    pub environment_surface_samples: u32,
    /// Sky samples everywhere
    pub environment_volumetric_samples: u32,
    /// Direction distribution of surface sampling
    pub hemisphere_mode: HemisphereMode,
    /// Add environment light to the first bounce seed
    pub bounce_environment_light: bool,
    /// Bake the volumetric variants
    pub volumetric: bool,
    /// March occupancy shadows in the volumetric variants
    pub volumetric_shadows: bool,
    /// Environment radiance multiplier
    pub environment_intensity: f32,
    /// Seed of the per-dispatch random seeds
    pub seed: u64,
}

impl LightingSettings {
    /// Set the number of bounces
    pub fn with_bounces(mut self, bounces: u32) -> Self {
        self.bounces = bounces;
        self
    }

    /// Set every surface and volumetric sample count
    pub fn with_samples(mut self, samples: u32) -> Self {
        self.bounce_surface_samples = samples;
        self.bounce_volumetric_samples = samples;
        self.environment_surface_samples = samples;
        self.environment_volumetric_samples = samples;
        self
    }

    /// Set the RNG seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the hemisphere mode
    pub fn with_hemisphere_mode(mut self, mode: HemisphereMode) -> Self {
        self.hemisphere_mode = mode;
        self
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<(), String> {
        if self.bounces > 0 && self.bounce_surface_samples == 0 {
            return Err("Bounce surface samples must be at least 1".to_string());
        }
        if self.environment_intensity < 0.0 || !self.environment_intensity.is_finite() {
            return Err(format!(
                "Environment intensity must be finite and non-negative, got {}",
                self.environment_intensity
            ));
        }
        Ok(())
    }
}

impl Default for LightingSettings {
    fn default() -> Self {
        Self {
            bounces: 2,
            bounce_surface_samples: 64,
            bounce_volumetric_samples: 32,
            environment_surface_samples: 64,
            environment_volumetric_samples: 32,
            hemisphere_mode: HemisphereMode::CosineNormal,
            bounce_environment_light: true,
            volumetric: true,
            volumetric_shadows: false,
            environment_intensity: 1.0,
            seed: 0,
        }
    }
}

/// # Device Settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceSettings {
    /// Dispatches between two forced synchronizations
    pub gpu_readback_limit: usize,
    /// Pending dispatches at which the CPU device gives up, `None` disables
    pub watchdog_limit: Option<usize>,
}

impl DeviceSettings {
    /// Set the throttle window
    pub fn with_readback_limit(mut self, limit: usize) -> Self {
        self.gpu_readback_limit = limit;
        self
    }

    /// Set the watchdog limit
    pub fn with_watchdog(mut self, limit: Option<usize>) -> Self {
        self.watchdog_limit = limit;
        self
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<(), String> {
        if self.gpu_readback_limit == 0 {
            return Err("GPU readback limit must be at least 1".to_string());
        }
        if let Some(watchdog) = self.watchdog_limit {
            if watchdog < self.gpu_readback_limit {
                log::warn!(
                    "Watchdog limit {} is below the readback limit {}; long passes will abort",
                    watchdog,
                    self.gpu_readback_limit
                );
            }
        }
        Ok(())
    }
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            gpu_readback_limit: 8,
            watchdog_limit: None,
        }
    }
}

/// How the light volumes are merged into the final volumes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CombineMode {
    /// Sum of every contribution
    #[default]
    Add,
    /// Mean of every contribution
    Average,
}

/// # Combine Settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombineSettings {
    /// Merge operator
    pub mode: CombineMode,
    /// Gaussian blur radius in voxels, zero disables the blur
    pub blur_radius: u32,
    /// Merge the environment volume into the surface output
    pub include_environment: bool,
}

impl CombineSettings {
    /// Set the merge operator
    pub fn with_mode(mut self, mode: CombineMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the blur radius
    pub fn with_blur_radius(mut self, radius: u32) -> Self {
        self.blur_radius = radius;
        self
    }
}

impl Default for CombineSettings {
    fn default() -> Self {
        Self {
            mode: CombineMode::Add,
            blur_radius: 0,
            include_environment: true,
        }
    }
}

/// # Output Settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Directory receiving the volumes and the manifest
    pub directory: PathBuf,
    /// Base name of every file
    pub name: String,
    /// Write direct, bounce and environment volumes too
    pub persist_intermediates: bool,
}

impl OutputSettings {
    /// Output into `directory` under `name`
    pub fn new(directory: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            name: name.into(),
            persist_intermediates: true,
        }
    }

    /// Check that volumes can be written, creating the directory if needed
    pub fn validate_destination(&self) -> BakeResult<()> {
        if self.name.trim().is_empty() {
            return Err(BakeError::InvalidDestination("bake name is empty".to_string()));
        }
        if self.name.contains(['/', '\\']) || self.name == "." || self.name == ".." {
            return Err(BakeError::InvalidDestination(format!(
                "bake name '{}' must not contain path separators",
                self.name
            )));
        }
        if self.directory.is_file() {
            return Err(BakeError::InvalidDestination(format!(
                "{} is a file",
                self.directory.display()
            )));
        }
        std::fs::create_dir_all(&self.directory).map_err(|e| {
            BakeError::InvalidDestination(format!("cannot create {}: {}", self.directory.display(), e))
        })
    }

    /// Path of a file inside the output directory
    pub fn path(&self, file_name: &str) -> PathBuf {
        Path::new(&self.directory).join(file_name)
    }
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self::new("baked", "scene")
    }
}

/// # Complete Bake Settings
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BakeSettings {
    /// Grid placement
    pub volume: VolumeSettings,
    /// Capture
    pub voxelize: VoxelizeSettings,
    /// Light transport
    pub lighting: LightingSettings,
    /// Dispatch throttling
    pub device: DeviceSettings,
    /// Final merge
    pub combine: CombineSettings,
    /// Persistence
    pub output: OutputSettings,
}

impl BakeSettings {
    /// Default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set volume settings
    pub fn with_volume(mut self, volume: VolumeSettings) -> Self {
        self.volume = volume;
        self
    }

    /// Set voxelize settings
    pub fn with_voxelize(mut self, voxelize: VoxelizeSettings) -> Self {
        self.voxelize = voxelize;
        self
    }

    /// Set lighting settings
    pub fn with_lighting(mut self, lighting: LightingSettings) -> Self {
        self.lighting = lighting;
        self
    }

    /// Set device settings
    pub fn with_device(mut self, device: DeviceSettings) -> Self {
        self.device = device;
        self
    }

    /// Set combine settings
    pub fn with_combine(mut self, combine: CombineSettings) -> Self {
        self.combine = combine;
        self
    }

    /// Set output settings
    pub fn with_output(mut self, output: OutputSettings) -> Self {
        self.output = output;
        self
    }

    /// Validate every group
    pub fn validate(&self) -> Result<(), String> {
        self.volume.validate()?;
        self.lighting.validate()?;
        self.device.validate()?;
        Ok(())
    }
}

impl Config for BakeSettings {}
