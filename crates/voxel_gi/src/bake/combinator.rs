//! Volume add, average and separable blur

use crate::bake::BakeContext;
use crate::compute::{slots, DispatchContext, KernelParams, Uniforms};
use crate::core::{BakeError, BakeResult, CombineMode};
use crate::kernels::{COMBINE_ADD, COMBINE_AVERAGE, GAUSSIAN_BLUR};
use crate::volume::{AccumulationBuffer, TexelFormat, Volume, VolumeGrid};

/// Stateless elementwise operations over volumes of one grid
///
/// Results are resolved at full float precision; rounding to a storage
/// format happens only when a volume is persisted.
#[derive(Debug, Clone, Copy)]
pub struct BufferCombinator {
    grid: VolumeGrid,
}

impl BufferCombinator {
    /// Combinator for volumes of `grid`
    pub fn new(grid: VolumeGrid) -> Self {
        Self { grid }
    }

    /// `a + b`
    pub fn add(&self, cx: &mut BakeContext, a: &Volume, b: &Volume) -> BakeResult<Volume> {
        self.binary(cx, COMBINE_ADD, a, b, KernelParams::default())
    }

    /// `(a + b) / 2`
    pub fn average(&self, cx: &mut BakeContext, a: &Volume, b: &Volume) -> BakeResult<Volume> {
        self.weighted_average(cx, a, b, 0.5)
    }

    /// `a * (1 - weight) + b * weight`
    pub fn weighted_average(&self, cx: &mut BakeContext, a: &Volume, b: &Volume, weight: f32) -> BakeResult<Volume> {
        let params = KernelParams {
            blend_weight: weight,
            ..KernelParams::default()
        };
        self.binary(cx, COMBINE_AVERAGE, a, b, params)
    }

    /// `a` and `b` merged with `mode`
    pub fn combine(&self, cx: &mut BakeContext, mode: CombineMode, a: &Volume, b: &Volume) -> BakeResult<Volume> {
        match mode {
            CombineMode::Add => self.add(cx, a, b),
            CombineMode::Average => self.average(cx, a, b),
        }
    }

    /// Merge every volume with `mode`
    ///
    /// `Add` sums all of them. `Average` keeps a running mean, so every input
    /// carries weight `1 / volumes.len()`. A single volume is returned as is.
    pub fn combine_all(&self, cx: &mut BakeContext, mode: CombineMode, volumes: &[&Volume]) -> BakeResult<Volume> {
        let (first, rest) = volumes
            .split_first()
            .ok_or_else(|| BakeError::InvalidSettings("nothing to combine".to_string()))?;
        let mut acc = (*first).clone();
        for (index, volume) in rest.iter().enumerate() {
            acc = match mode {
                CombineMode::Add => self.add(cx, &acc, volume)?,
                CombineMode::Average => {
                    let weight = 1.0 / (index + 2) as f32;
                    self.weighted_average(cx, &acc, volume, weight)?
                }
            };
        }
        Ok(acc)
    }

    /// Separable Gaussian blur: X, then Y, then Z
    ///
    /// Each pass is drained and resolved before the next one reads it.
    /// Radius zero returns the input unchanged.
    pub fn blur(&self, cx: &mut BakeContext, volume: &Volume, radius: u32) -> BakeResult<Volume> {
        if radius == 0 {
            return Ok(volume.clone());
        }
        let kernel = cx.kernel(GAUSSIAN_BLUR)?;

        let mut current = volume.clone();
        for axis in 0..3 {
            let mut write = AccumulationBuffer::new(self.grid.resolution);
            let params = KernelParams {
                blur_axis: axis,
                blur_radius: radius,
                ..KernelParams::default()
            };
            let mut ctx = DispatchContext::new(Uniforms::for_grid(&self.grid), &mut write)
                .bind(slots::INPUT_A, &current)
                .with_params(params);
            cx.submit(kernel.as_ref(), &mut ctx)?;
            cx.drain()?;
            current = write.resolve(TexelFormat::RgbaFloat);
        }
        Ok(current)
    }

    fn binary(
        &self,
        cx: &mut BakeContext,
        name: &str,
        a: &Volume,
        b: &Volume,
        params: KernelParams,
    ) -> BakeResult<Volume> {
        let kernel = cx.kernel(name)?;
        let mut write = AccumulationBuffer::new(self.grid.resolution);
        let mut ctx = DispatchContext::new(Uniforms::for_grid(&self.grid), &mut write)
            .bind(slots::INPUT_A, a)
            .bind(slots::INPUT_B, b)
            .with_params(params);
        cx.submit(kernel.as_ref(), &mut ctx)?;
        cx.drain()?;
        Ok(write.resolve(TexelFormat::RgbaFloat))
    }
}
