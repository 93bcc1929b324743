//! # Bake Pipeline
//!
//! One method per stage, each callable on its own once the stages it reads
//! from have run:
//!
//! ```text
//! voxelize ─┬─> solve_direct ──────┬─> solve_bounce ─┬─> combine ─> persist
//!           └─> solve_environment ─┘                 │
//!                        └───────────────────────────┘
//! ```
//!
//! [`BakePipeline::run`] chains every stage. A stage invoked before its input
//! exists fails with [`BakeError::MissingStageInput`].

use std::path::PathBuf;

use crate::bake::{
    BakeContext, BakeObserver, BounceLight, BounceLightSolver, BufferCombinator, DirectLight, DirectLightSolver,
    EnvironmentLight, EnvironmentLightSolver, SceneVolumes, SceneVoxelizer, VolumeWriter,
};
use crate::compute::KernelLibrary;
use crate::core::{BakeError, BakeResult, BakeSettings, BakeStage};
use crate::foundation::time::Stopwatch;
use crate::lighting::LightEncoder;
use crate::meta::MetaBufferProvider;
use crate::scene::Scene;
use crate::volume::{Volume, VolumeRole};

/// Final volumes of a bake
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedLight {
    /// All surface light, alpha is occupancy
    pub surface: Volume,
    /// All volumetric light, alpha is 1
    pub volumetric: Option<Volume>,
}

/// Stage driver holding the settings, the bake context and every stage result
#[derive(Debug)]
pub struct BakePipeline {
    settings: BakeSettings,
    context: BakeContext,
    volumes: Option<SceneVolumes>,
    direct: Option<DirectLight>,
    environment: Option<EnvironmentLight>,
    bounce: Option<BounceLight>,
    combined: Option<CombinedLight>,
}

impl BakePipeline {
    /// Pipeline on the CPU device with the built-in kernels
    pub fn new(settings: BakeSettings) -> BakeResult<Self> {
        settings.validate().map_err(BakeError::InvalidSettings)?;
        let context = BakeContext::from_settings(&settings.device);
        Ok(Self {
            settings,
            context,
            volumes: None,
            direct: None,
            environment: None,
            bounce: None,
            combined: None,
        })
    }

    /// Replace the bake context (device, throttle and kernels)
    pub fn with_context(mut self, context: BakeContext) -> Self {
        self.context = context;
        self
    }

    /// Replace the kernel library
    pub fn with_library(mut self, library: KernelLibrary) -> Self {
        self.context.set_library(library);
        self
    }

    /// Replace the progress observer
    pub fn with_observer(mut self, observer: Box<dyn BakeObserver>) -> Self {
        self.context.set_observer(observer);
        self
    }

    /// Settings of this bake
    pub fn settings(&self) -> &BakeSettings {
        &self.settings
    }

    /// Bake context, for device statistics
    pub fn context(&self) -> &BakeContext {
        &self.context
    }

    /// Scene volumes, once voxelized
    pub fn volumes(&self) -> Option<&SceneVolumes> {
        self.volumes.as_ref()
    }

    /// Direct light, once solved
    pub fn direct(&self) -> Option<&DirectLight> {
        self.direct.as_ref()
    }

    /// Environment light, once solved
    pub fn environment(&self) -> Option<&EnvironmentLight> {
        self.environment.as_ref()
    }

    /// Bounce light, once solved
    pub fn bounce(&self) -> Option<&BounceLight> {
        self.bounce.as_ref()
    }

    /// Final volumes, once combined
    pub fn combined(&self) -> Option<&CombinedLight> {
        self.combined.as_ref()
    }

    /// Capture `scene` into the albedo, normal and emissive volumes
    ///
    /// Invalidates every later stage result.
    pub fn voxelize(&mut self, scene: &Scene, provider: &dyn MetaBufferProvider) -> BakeResult<&SceneVolumes> {
        let grid = self.settings.volume.grid(scene.bounds().as_ref())?;
        let voxelizer = SceneVoxelizer::new(self.settings.voxelize.clone());
        let volumes = self.timed(BakeStage::Voxelize, |cx| voxelizer.voxelize(cx, &grid, scene, provider))?;

        self.direct = None;
        self.environment = None;
        self.bounce = None;
        self.combined = None;
        Ok(self.volumes.insert(volumes))
    }

    /// Light the scene volumes with the enabled lights of `scene`
    pub fn solve_direct(&mut self, scene: &Scene) -> BakeResult<&DirectLight> {
        let volumes = Self::require(&self.volumes, BakeStage::Direct, BakeStage::Voxelize)?;
        let lights = LightEncoder::encode(scene.active_lights())?;
        let solver = DirectLightSolver {
            volumetric: self.settings.lighting.volumetric,
            volumetric_shadows: self.settings.lighting.volumetric_shadows,
        };
        let direct = Self::timed_with(&mut self.context, BakeStage::Direct, |cx| solver.solve(cx, volumes, &lights))?;
        Ok(self.direct.insert(direct))
    }

    /// Light the scene volumes with the environment of `scene`
    ///
    /// A scene without environment leaves the result empty.
    pub fn solve_environment(&mut self, scene: &Scene) -> BakeResult<Option<&EnvironmentLight>> {
        let volumes = Self::require(&self.volumes, BakeStage::Environment, BakeStage::Voxelize)?;
        let Some(map) = scene.environment.as_ref() else {
            log::info!("Scene has no environment, skipping {}", BakeStage::Environment);
            self.environment = None;
            return Ok(None);
        };
        let lighting = &self.settings.lighting;
        let solver = EnvironmentLightSolver {
            surface_samples: lighting.environment_surface_samples,
            volumetric_samples: if lighting.volumetric {
                lighting.environment_volumetric_samples
            } else {
                0
            },
            hemisphere: lighting.hemisphere_mode,
            intensity: lighting.environment_intensity,
            seed: lighting.seed,
        };
        let environment = Self::timed_with(&mut self.context, BakeStage::Environment, |cx| {
            solver.solve(cx, volumes, map)
        })?;
        self.environment = Some(environment);
        Ok(self.environment.as_ref())
    }

    /// Bounce the direct light, seeded with environment light when enabled
    ///
    /// Zero bounces leaves the result empty.
    pub fn solve_bounce(&mut self) -> BakeResult<Option<&BounceLight>> {
        let volumes = Self::require(&self.volumes, BakeStage::Bounce, BakeStage::Voxelize)?;
        let direct = Self::require(&self.direct, BakeStage::Bounce, BakeStage::Direct)?;
        let lighting = &self.settings.lighting;
        if lighting.bounces == 0 {
            log::info!("Zero bounces, skipping {}", BakeStage::Bounce);
            self.bounce = None;
            return Ok(None);
        }
        let environment = self.environment.as_ref().filter(|_| lighting.bounce_environment_light);
        let solver = BounceLightSolver {
            bounces: lighting.bounces,
            surface_samples: lighting.bounce_surface_samples,
            volumetric_samples: if lighting.volumetric {
                lighting.bounce_volumetric_samples
            } else {
                0
            },
            hemisphere: lighting.hemisphere_mode,
            seed: lighting.seed,
        };
        let bounce = Self::timed_with(&mut self.context, BakeStage::Bounce, |cx| {
            solver.solve(cx, volumes, direct, environment)
        })?;
        self.bounce = Some(bounce);
        Ok(self.bounce.as_ref())
    }

    /// Merge direct, bounce and environment light into the final volumes
    ///
    /// Stages that did not run contribute nothing. Surface alpha is reset to
    /// the scene occupancy and volumetric alpha to 1 after merging.
    pub fn combine(&mut self) -> BakeResult<&CombinedLight> {
        let volumes = Self::require(&self.volumes, BakeStage::Combine, BakeStage::Voxelize)?;
        let direct = Self::require(&self.direct, BakeStage::Combine, BakeStage::Direct)?;
        let combine = &self.settings.combine;
        let environment = self.environment.as_ref().filter(|_| combine.include_environment);
        let bounce = self.bounce.as_ref();
        let combinator = BufferCombinator::new(volumes.grid);

        let combined = Self::timed_with(&mut self.context, BakeStage::Combine, |cx| {
            let mut surfaces = vec![&direct.surface];
            surfaces.extend(bounce.map(|b| &b.surface));
            surfaces.extend(environment.map(|e| &e.surface));
            let surface = combinator.combine_all(cx, combine.mode, &surfaces)?;
            let mut surface = combinator.blur(cx, &surface, combine.blur_radius)?;
            restore_occupancy(&mut surface, &volumes.albedo);

            let volumetric = match direct.volumetric.as_ref() {
                Some(first) => {
                    let mut parts = vec![first];
                    parts.extend(bounce.and_then(|b| b.volumetric.as_ref()));
                    parts.extend(environment.and_then(|e| e.volumetric.as_ref()));
                    let volumetric = combinator.combine_all(cx, combine.mode, &parts)?;
                    let mut volumetric = combinator.blur(cx, &volumetric, combine.blur_radius)?;
                    for texel in volumetric.texels_mut() {
                        texel.w = 1.0;
                    }
                    Some(volumetric)
                }
                None => None,
            };
            Ok(CombinedLight { surface, volumetric })
        })?;
        Ok(self.combined.insert(combined))
    }

    /// Write the volumes and the manifest, returning the manifest path
    ///
    /// Scene attributes and intermediate light volumes are written only with
    /// `persist_intermediates`.
    pub fn persist(&mut self) -> BakeResult<PathBuf> {
        let volumes = Self::require(&self.volumes, BakeStage::Persist, BakeStage::Voxelize)?;
        let combined = Self::require(&self.combined, BakeStage::Persist, BakeStage::Combine)?;
        let output = &self.settings.output;
        let direct = self.direct.as_ref();
        let environment = self.environment.as_ref();
        let bounce = self.bounce.as_ref();

        Self::timed_with(&mut self.context, BakeStage::Persist, |_| {
            let mut writer = VolumeWriter::new(output, volumes.grid)?;
            if output.persist_intermediates {
                writer.write(VolumeRole::Albedo, &volumes.albedo)?;
                writer.write(VolumeRole::Normal, &volumes.normal)?;
                writer.write(VolumeRole::Emissive, &volumes.emissive)?;
                if let Some(direct) = direct {
                    writer.write(VolumeRole::DirectSurface, &direct.surface)?;
                    writer.write_optional(VolumeRole::DirectVolumetric, direct.volumetric.as_ref())?;
                }
                if let Some(environment) = environment {
                    writer.write(VolumeRole::EnvironmentSurface, &environment.surface)?;
                    writer.write_optional(VolumeRole::EnvironmentVolumetric, environment.volumetric.as_ref())?;
                }
                if let Some(bounce) = bounce {
                    writer.write(VolumeRole::BounceSurface, &bounce.surface)?;
                    writer.write_optional(VolumeRole::BounceVolumetric, bounce.volumetric.as_ref())?;
                }
            }
            writer.write(VolumeRole::CombinedSurface, &combined.surface)?;
            writer.write_optional(VolumeRole::CombinedVolumetric, combined.volumetric.as_ref())?;
            writer.finish()
        })
    }

    /// Run every stage in order and persist the result
    ///
    /// The destination is validated before the first dispatch.
    pub fn run(&mut self, scene: &Scene, provider: &dyn MetaBufferProvider) -> BakeResult<PathBuf> {
        self.settings.output.validate_destination()?;
        let total = Stopwatch::start_new();

        self.voxelize(scene, provider)?;
        self.solve_direct(scene)?;
        self.solve_environment(scene)?;
        self.solve_bounce()?;
        self.combine()?;
        let manifest = self.persist()?;

        let stats = self.context.device_stats();
        log::info!(
            "Bake '{}' finished in {:.1} ms ({} dispatches, {} synchronizations, peak {} bytes)",
            self.settings.output.name,
            total.elapsed_millis(),
            stats.dispatches,
            stats.synchronizations,
            stats.memory.peak_bytes
        );
        Ok(manifest)
    }

    fn require<T>(slot: &Option<T>, stage: BakeStage, requires: BakeStage) -> BakeResult<&T> {
        slot.as_ref().ok_or(BakeError::MissingStageInput { stage, requires })
    }

    fn timed<T>(&mut self, stage: BakeStage, f: impl FnOnce(&mut BakeContext) -> BakeResult<T>) -> BakeResult<T> {
        Self::timed_with(&mut self.context, stage, f)
    }

    fn timed_with<T>(
        cx: &mut BakeContext,
        stage: BakeStage,
        f: impl FnOnce(&mut BakeContext) -> BakeResult<T>,
    ) -> BakeResult<T> {
        let stopwatch = Stopwatch::start_new();
        cx.started(stage);
        let result = f(cx);
        match &result {
            Ok(_) => cx.finished(stage, stopwatch.elapsed()),
            Err(e) => log::error!("{} failed after {:.1} ms: {}", stage, stopwatch.elapsed_millis(), e),
        }
        result
    }
}

/// Set alpha to the occupancy of the albedo volume
fn restore_occupancy(volume: &mut Volume, albedo: &Volume) {
    for (texel, scene) in volume.texels_mut().iter_mut().zip(albedo.texels()) {
        texel.w = if scene.w > 0.0 { scene.w } else { 0.0 };
    }
}
