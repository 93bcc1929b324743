//! Writes one captured slice into a depth layer of a scene volume

use crate::capture::OverdrawPolicy;
use crate::compute::{ComputeKernel, DispatchContext};
use crate::core::{BakeError, BakeResult};
use crate::kernels::VOXELIZE_SLICE;

/// Slice-to-volume write with the capture-axis swizzle
///
/// Reads the slice channel selected by the params and writes every covered
/// pixel into the voxel given by [`crate::capture::CaptureAxis::voxel_coord`]
/// for the params' axis and layer. `Blend` requires write counters.
pub struct VoxelizeSliceKernel;

impl ComputeKernel for VoxelizeSliceKernel {
    fn name(&self) -> &'static str {
        VOXELIZE_SLICE
    }

    fn execute(&self, ctx: &mut DispatchContext<'_>) -> BakeResult<()> {
        ctx.check_write_shape()?;
        let slice = ctx.slice(VOXELIZE_SLICE)?;
        let params = ctx.params;
        let resolution = ctx.uniforms.resolution();
        let axis = params.capture_axis;

        let (write, counts) = ctx.write_with_counts();
        let volume = write.volume_mut();
        let values = slice.channel(params.channel);

        let mut counts = match params.overdraw {
            OverdrawPolicy::FirstWriteWins => None,
            OverdrawPolicy::Blend => Some(counts.ok_or(BakeError::MissingBinding {
                kernel: VOXELIZE_SLICE,
                binding: "WriteCount",
            })?),
        };

        for v in 0..slice.height() {
            for u in 0..slice.width() {
                let pixel = (v * slice.width() + u) as usize;
                if !slice.is_covered(pixel) {
                    continue;
                }
                let value = values[pixel];
                if value.w <= 0.0 {
                    continue;
                }

                let coord = axis.voxel_coord(&resolution, params.capture_layer, u, v);
                let index = volume.index(&coord);
                let texel = volume.texel_mut(&coord);
                match counts.as_deref_mut() {
                    None => {
                        if texel.w <= 0.0 {
                            *texel = value;
                        }
                    }
                    Some(counts) => {
                        let n = counts[index] as f32;
                        *texel = (*texel * n + value) / (n + 1.0);
                        counts[index] += 1;
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{CaptureAxis, SliceBuffer, SliceChannel};
    use crate::compute::{KernelParams, Uniforms};
    use crate::foundation::math::{UVec3, Vec3, Vec4};
    use crate::volume::{AccumulationBuffer, VolumeGrid};

    fn grid() -> VolumeGrid {
        VolumeGrid::with_resolution(Vec3::zeros(), Vec3::new(2.0, 2.0, 2.0), UVec3::new(2, 2, 2)).unwrap()
    }

    fn slice_with(value: Vec4) -> SliceBuffer {
        let mut slice = SliceBuffer::new(2, 2);
        slice.albedo[0] = value;
        slice
    }

    fn write(
        target: &mut AccumulationBuffer,
        counts: Option<&mut [u32]>,
        slice: &SliceBuffer,
        axis: CaptureAxis,
        overdraw: OverdrawPolicy,
    ) -> BakeResult<()> {
        let params = KernelParams {
            capture_axis: axis,
            capture_layer: 0,
            overdraw,
            channel: SliceChannel::Albedo,
            ..KernelParams::default()
        };
        let mut ctx = DispatchContext::new(Uniforms::for_grid(&grid()), target)
            .with_params(params)
            .with_slice(slice);
        if let Some(counts) = counts {
            ctx = ctx.with_write_counts(counts);
        }
        VoxelizeSliceKernel.execute(&mut ctx)
    }

    #[test]
    fn test_first_write_wins_keeps_first_axis() {
        let mut target = AccumulationBuffer::new(grid().resolution);
        let red = slice_with(Vec4::new(1.0, 0.0, 0.0, 1.0));
        let blue = slice_with(Vec4::new(0.0, 0.0, 1.0, 1.0));
        // pixel (0, 0) of layer 0 is voxel (0, 0, 0) for both +X and +Y
        write(&mut target, None, &red, CaptureAxis::PositiveX, OverdrawPolicy::FirstWriteWins).unwrap();
        write(&mut target, None, &blue, CaptureAxis::PositiveY, OverdrawPolicy::FirstWriteWins).unwrap();
        let origin = UVec3::new(0, 0, 0);
        assert_eq!(target.as_volume().get(&origin), Vec4::new(1.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn test_blend_averages_writes() {
        let mut target = AccumulationBuffer::new(grid().resolution);
        let mut counts = vec![0u32; 8];
        let red = slice_with(Vec4::new(1.0, 0.0, 0.0, 1.0));
        let blue = slice_with(Vec4::new(0.0, 0.0, 1.0, 1.0));
        write(&mut target, Some(&mut counts), &red, CaptureAxis::PositiveX, OverdrawPolicy::Blend).unwrap();
        write(&mut target, Some(&mut counts), &blue, CaptureAxis::PositiveY, OverdrawPolicy::Blend).unwrap();
        let origin = UVec3::new(0, 0, 0);
        assert_eq!(target.as_volume().get(&origin), Vec4::new(0.5, 0.0, 0.5, 1.0));
        assert_eq!(counts[0], 2);
    }

    #[test]
    fn test_blend_without_counters_is_an_error() {
        let mut target = AccumulationBuffer::new(grid().resolution);
        let red = slice_with(Vec4::new(1.0, 0.0, 0.0, 1.0));
        let err = write(&mut target, None, &red, CaptureAxis::PositiveX, OverdrawPolicy::Blend).unwrap_err();
        assert!(matches!(err, BakeError::MissingBinding { binding: "WriteCount", .. }));
    }

    #[test]
    fn test_missing_slice_is_an_error() {
        let mut target = AccumulationBuffer::new(grid().resolution);
        let mut ctx = DispatchContext::new(Uniforms::for_grid(&grid()), &mut target);
        assert!(VoxelizeSliceKernel.execute(&mut ctx).is_err());
    }
}
