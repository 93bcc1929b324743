//! Elementwise combine kernels and the 1D Gaussian blur pass
//!
//! All three overwrite the write target. Every channel, alpha included, goes
//! through the same arithmetic.

use crate::compute::{slots, ComputeKernel, DispatchContext};
use crate::core::{BakeError, BakeResult};
use crate::foundation::math::{IVec3, Vec4};
use crate::kernels::{COMBINE_ADD, COMBINE_AVERAGE, GAUSSIAN_BLUR};
use crate::volume::Volume;

fn combine(
    ctx: &mut DispatchContext<'_>,
    kernel: &'static str,
    op: impl Fn(&Vec4, &Vec4) -> Vec4,
) -> BakeResult<()> {
    ctx.check_write_shape()?;
    let a = ctx.input(kernel, slots::INPUT_A)?;
    let b = ctx.input(kernel, slots::INPUT_B)?;
    a.ensure_same_shape(b)?;

    let out = ctx.write().volume_mut();
    out.ensure_same_shape(a)?;
    for ((texel, a), b) in out.texels_mut().iter_mut().zip(a.texels()).zip(b.texels()) {
        *texel = op(a, b);
    }
    Ok(())
}

/// `Write = InputA + InputB`
pub struct CombineAddKernel;

impl ComputeKernel for CombineAddKernel {
    fn name(&self) -> &'static str {
        COMBINE_ADD
    }

    fn execute(&self, ctx: &mut DispatchContext<'_>) -> BakeResult<()> {
        combine(ctx, COMBINE_ADD, |a, b| a + b)
    }
}

/// `Write = InputA * (1 - w) + InputB * w` with `w` the blend weight
///
/// The default weight of one half is the plain mean of both inputs.
pub struct CombineAverageKernel;

impl ComputeKernel for CombineAverageKernel {
    fn name(&self) -> &'static str {
        COMBINE_AVERAGE
    }

    fn execute(&self, ctx: &mut DispatchContext<'_>) -> BakeResult<()> {
        let w = ctx.params.blend_weight;
        combine(ctx, COMBINE_AVERAGE, |a, b| a * (1.0 - w) + b * w)
    }
}

/// Normalized Gaussian taps for `radius`, sigma = radius / 2
pub fn gaussian_weights(radius: u32) -> Vec<f32> {
    if radius == 0 {
        return vec![1.0];
    }
    let sigma = radius as f32 * 0.5;
    let r = radius as i32;
    let weights: Vec<f32> = (-r..=r)
        .map(|i| (-(i * i) as f32 / (2.0 * sigma * sigma)).exp())
        .collect();
    let total: f32 = weights.iter().sum();
    weights.into_iter().map(|w| w / total).collect()
}

/// One axis of the separable Gaussian blur
///
/// Reads `InputA`, blurs along `params.blur_axis` with `params.blur_radius`
/// and clamp-to-edge addressing. Radius zero copies the input.
pub struct GaussianBlurKernel;

impl ComputeKernel for GaussianBlurKernel {
    fn name(&self) -> &'static str {
        GAUSSIAN_BLUR
    }

    fn execute(&self, ctx: &mut DispatchContext<'_>) -> BakeResult<()> {
        ctx.check_write_shape()?;
        let input = ctx.input(GAUSSIAN_BLUR, slots::INPUT_A)?;
        let axis = ctx.params.blur_axis;
        if axis > 2 {
            return Err(BakeError::InvalidSettings(format!("blur axis {axis} is not 0, 1 or 2")));
        }
        let weights = gaussian_weights(ctx.params.blur_radius);
        let radius = ctx.params.blur_radius as i32;

        let out = ctx.write().volume_mut();
        out.ensure_same_shape(input)?;
        if radius == 0 {
            out.texels_mut().copy_from_slice(input.texels());
            return Ok(());
        }

        let last = input.resolution()[axis] as i32 - 1;
        for (index, texel) in out.texels_mut().iter_mut().enumerate() {
            let coord = input.coord(index);
            let mut sum = Vec4::zeros();
            for (tap, weight) in (-radius..=radius).zip(&weights) {
                let mut at: IVec3 = coord.cast::<i32>();
                at[axis] = (at[axis] + tap).clamp(0, last);
                sum += sample(input, &at) * *weight;
            }
            *texel = sum;
        }
        Ok(())
    }
}

fn sample(volume: &Volume, coord: &IVec3) -> Vec4 {
    volume.get_checked(coord).unwrap_or_else(Vec4::zeros)
}
