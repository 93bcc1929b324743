//! Six-axis scene voxelization

use crate::bake::BakeContext;
use crate::capture::{CaptureAxis, OverdrawPolicy, SliceChannel, SliceRasterizer};
use crate::compute::{DispatchContext, KernelParams, Uniforms};
use crate::core::{BakeResult, BakeStage, VoxelizeSettings};
use crate::kernels::VOXELIZE_SLICE;
use crate::meta::{MetaBufferProvider, ObjectMetaBuffer};
use crate::scene::Scene;
use crate::volume::{AccumulationBuffer, Volume, VolumeGrid, VolumeRole};

/// Albedo, normal and emissive volumes of a scene
#[derive(Debug, Clone, PartialEq)]
pub struct SceneVolumes {
    /// Grid of all three volumes
    pub grid: VolumeGrid,
    /// Albedo, alpha is occupancy
    pub albedo: Volume,
    /// World-space normals
    pub normal: Volume,
    /// Emission
    pub emissive: Volume,
}

impl SceneVolumes {
    /// Occupied voxels
    pub fn occupied_count(&self) -> usize {
        self.albedo.occupied_count()
    }
}

/// Write target and blend counters of one channel
struct ChannelTarget {
    channel: SliceChannel,
    policy: OverdrawPolicy,
    buffer: AccumulationBuffer,
    counts: Option<Vec<u32>>,
}

impl ChannelTarget {
    fn new(channel: SliceChannel, policy: OverdrawPolicy, grid: &VolumeGrid) -> Self {
        let counts = (policy == OverdrawPolicy::Blend).then(|| vec![0; grid.voxel_count()]);
        Self {
            channel,
            policy,
            buffer: AccumulationBuffer::new(grid.resolution),
            counts,
        }
    }
}

/// Captures a scene along the six signed axes into three volumes
///
/// Each capture axis walks the grid one voxel layer at a time. A layer is
/// rendered into a slice and one `VoxelizeSlice` dispatch per channel writes
/// it into the volumes. Axes run in [`CaptureAxis::ALL`] order, which decides
/// the winner under [`OverdrawPolicy::FirstWriteWins`].
#[derive(Debug, Clone, Default)]
pub struct SceneVoxelizer {
    settings: VoxelizeSettings,
}

impl SceneVoxelizer {
    /// Voxelizer with explicit settings
    pub fn new(settings: VoxelizeSettings) -> Self {
        Self { settings }
    }

    /// Capture `scene` into `grid`
    ///
    /// Fails before any work when the slice kernel is missing. Renderables
    /// without meta data contribute nothing.
    pub fn voxelize(
        &self,
        cx: &mut BakeContext,
        grid: &VolumeGrid,
        scene: &Scene,
        provider: &dyn MetaBufferProvider,
    ) -> BakeResult<SceneVolumes> {
        let kernel = cx.kernel(VOXELIZE_SLICE)?;
        let metas = self.extract(grid, scene, provider);

        let mut targets = SliceChannel::ALL
            .map(|channel| ChannelTarget::new(channel, self.settings.overdraw(channel), grid));

        let uniforms = Uniforms::for_grid(grid);
        let total_layers: u32 = CaptureAxis::ALL.iter().map(|a| a.layers(&grid.resolution)).sum();
        let mut done_layers = 0;

        for axis in CaptureAxis::ALL {
            let rasterizer = SliceRasterizer::new(axis, grid, &metas);
            let mut slice = rasterizer.new_slice();
            let layers = axis.layers(&grid.resolution);

            for layer in 0..layers {
                done_layers += 1;
                rasterizer.render(layer, &mut slice);
                if slice.covered_count() == 0 {
                    continue;
                }
                for target in &mut targets {
                    let params = KernelParams {
                        capture_axis: axis,
                        capture_layer: layer,
                        overdraw: target.policy,
                        channel: target.channel,
                        ..KernelParams::default()
                    };
                    let mut ctx = DispatchContext::new(uniforms, &mut target.buffer)
                        .with_params(params)
                        .with_slice(&slice);
                    if let Some(counts) = target.counts.as_deref_mut() {
                        ctx = ctx.with_write_counts(counts);
                    }
                    cx.submit(kernel.as_ref(), &mut ctx)?;
                }
                cx.progress(BakeStage::Voxelize, done_layers as usize, total_layers as usize);
            }
            log::debug!("Captured {:?} ({} layers)", axis, layers);
        }
        cx.drain()?;
        drop(metas);

        let [albedo, normal, emissive] = targets;
        let volumes = SceneVolumes {
            grid: *grid,
            albedo: albedo.buffer.resolve(VolumeRole::Albedo.format()),
            normal: normal.buffer.resolve(VolumeRole::Normal.format()),
            emissive: emissive.buffer.resolve(VolumeRole::Emissive.format()),
        };
        log::info!(
            "Voxelized {} of {} voxels ({}x{}x{})",
            volumes.occupied_count(),
            grid.voxel_count(),
            grid.resolution.x,
            grid.resolution.y,
            grid.resolution.z
        );
        Ok(volumes)
    }

    /// Meta buffers of every enabled renderable that touches the grid
    fn extract(&self, grid: &VolumeGrid, scene: &Scene, provider: &dyn MetaBufferProvider) -> Vec<ObjectMetaBuffer> {
        let bounds = grid.bounds();
        let mut metas = Vec::new();
        for renderable in scene.active_renderables() {
            let Some(meta) = provider.extract(renderable) else {
                log::debug!("'{}' has no meta data, skipped", renderable.name);
                continue;
            };
            if !meta.bounds.intersects(&bounds) {
                log::debug!("'{}' lies outside the volume, skipped", renderable.name);
                continue;
            }
            metas.push(meta);
        }
        log::debug!("{} renderables contribute to the capture", metas.len());
        metas
    }
}
