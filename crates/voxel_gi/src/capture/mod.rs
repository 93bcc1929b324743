//! Six-axis orthographic scene capture
//!
//! The scene is rendered one voxel-thick slab at a time along each of the six
//! signed world axes. [`SliceRasterizer`] produces the 2D slices and the
//! voxelize kernel writes them into the volume through the [`CaptureAxis`]
//! swizzle table.

mod axis;
mod raster;

pub use axis::{AxisMapping, AxisRef, CaptureAxis};
pub use raster::{SliceBuffer, SliceRasterizer};

use serde::{Deserialize, Serialize};

/// How a voxel already written by an earlier capture treats later writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OverdrawPolicy {
    /// Keep the first non-empty write, discard the rest
    #[default]
    FirstWriteWins,
    /// Arithmetic mean of every non-empty write
    Blend,
}

/// Which slice attribute a voxelize pass writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SliceChannel {
    /// Albedo and coverage
    #[default]
    Albedo,
    /// Surface normal
    Normal,
    /// Emission
    Emissive,
}

impl SliceChannel {
    /// Every channel, in write order
    pub const ALL: [Self; 3] = [Self::Albedo, Self::Normal, Self::Emissive];
}

impl SliceBuffer {
    /// Pixels of one channel
    pub fn channel(&self, channel: SliceChannel) -> &[crate::foundation::math::Vec4] {
        match channel {
            SliceChannel::Albedo => &self.albedo,
            SliceChannel::Normal => &self.normal,
            SliceChannel::Emissive => &self.emissive,
        }
    }
}
