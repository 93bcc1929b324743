//! Six-axis capture table
//!
//! Each capture axis looks along one signed world axis with an orthographic
//! camera. Camera right is `forward x up`; slice pixel `u` runs along right,
//! `v` along up and the depth layer along forward. Every entry records which
//! world axis (and sign) each of the three slice coordinates maps to, and
//! one kernel consumes the table for all six directions.

use crate::foundation::math::{UVec3, Vec3};

/// Signed world axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisRef {
    /// 0 = X, 1 = Y, 2 = Z
    pub axis: usize,
    /// Walks the world axis backwards when true
    pub negative: bool,
}

impl AxisRef {
    const fn pos(axis: usize) -> Self {
        Self { axis, negative: false }
    }

    const fn neg(axis: usize) -> Self {
        Self { axis, negative: true }
    }

    /// Unit world vector of this axis
    pub fn vector(self) -> Vec3 {
        let mut v = Vec3::zeros();
        v[self.axis] = if self.negative { -1.0 } else { 1.0 };
        v
    }

    /// Voxel index along the world axis for step `index` along this axis
    pub fn voxel_index(self, index: u32, resolution: u32) -> u32 {
        if self.negative {
            resolution - 1 - index
        } else {
            index
        }
    }

    /// Capture-space coordinate of a continuous voxel-space coordinate
    pub fn capture_coord(self, voxel_space: f32, resolution: u32) -> f32 {
        if self.negative {
            resolution as f32 - voxel_space
        } else {
            voxel_space
        }
    }
}

/// Orientation and swizzle of one capture direction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisMapping {
    /// World axis walked by the depth layers (the view direction)
    pub depth: AxisRef,
    /// World axis of slice `u` (camera right)
    pub u: AxisRef,
    /// World axis of slice `v` (camera up)
    pub v: AxisRef,
}

/// The six capture directions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaptureAxis {
    /// Looking along +X
    PositiveX,
    /// Looking along -X
    NegativeX,
    /// Looking along +Y
    PositiveY,
    /// Looking along -Y
    NegativeY,
    /// Looking along +Z
    PositiveZ,
    /// Looking along -Z
    NegativeZ,
}

const CAPTURE_TABLE: [AxisMapping; 6] = [
    AxisMapping { depth: AxisRef::pos(0), u: AxisRef::pos(2), v: AxisRef::pos(1) },
    AxisMapping { depth: AxisRef::neg(0), u: AxisRef::neg(2), v: AxisRef::pos(1) },
    AxisMapping { depth: AxisRef::pos(1), u: AxisRef::pos(0), v: AxisRef::pos(2) },
    AxisMapping { depth: AxisRef::neg(1), u: AxisRef::neg(0), v: AxisRef::pos(2) },
    AxisMapping { depth: AxisRef::pos(2), u: AxisRef::neg(0), v: AxisRef::pos(1) },
    AxisMapping { depth: AxisRef::neg(2), u: AxisRef::pos(0), v: AxisRef::pos(1) },
];

impl CaptureAxis {
    /// Capture order used by the voxelizer
    pub const ALL: [Self; 6] = [
        Self::PositiveX,
        Self::NegativeX,
        Self::PositiveY,
        Self::NegativeY,
        Self::PositiveZ,
        Self::NegativeZ,
    ];

    /// Swizzle entry of this direction
    pub fn mapping(self) -> &'static AxisMapping {
        &CAPTURE_TABLE[self as usize]
    }

    /// View direction
    pub fn forward(self) -> Vec3 {
        self.mapping().depth.vector()
    }

    /// Camera up vector (+Z for the Y axes, +Y otherwise)
    pub fn up(self) -> Vec3 {
        match self {
            Self::PositiveY | Self::NegativeY => Vec3::z(),
            _ => Vec3::y(),
        }
    }

    /// Camera right vector
    pub fn right(self) -> Vec3 {
        self.forward().cross(&self.up())
    }

    /// Slice size in pixels for a volume resolution
    pub fn slice_size(self, resolution: &UVec3) -> (u32, u32) {
        let m = self.mapping();
        (resolution[m.u.axis], resolution[m.v.axis])
    }

    /// Number of depth layers for a volume resolution
    pub fn layers(self, resolution: &UVec3) -> u32 {
        resolution[self.mapping().depth.axis]
    }

    /// Voxel written by slice pixel `(u, v)` of depth layer `layer`
    pub fn voxel_coord(self, resolution: &UVec3, layer: u32, u: u32, v: u32) -> UVec3 {
        let m = self.mapping();
        let mut coord = UVec3::zeros();
        coord[m.depth.axis] = m.depth.voxel_index(layer, resolution[m.depth.axis]);
        coord[m.u.axis] = m.u.voxel_index(u, resolution[m.u.axis]);
        coord[m.v.axis] = m.v.voxel_index(v, resolution[m.v.axis]);
        coord
    }

    /// Capture-space `(u, v, depth)` of a continuous voxel-space position
    ///
    /// Pixel `i` covers `[i, i + 1)` in `u` and `v`; layer `k` covers
    /// `[k, k + 1)` in depth.
    pub fn to_capture_space(self, voxel_space: &Vec3, resolution: &UVec3) -> Vec3 {
        let m = self.mapping();
        let project = |a: AxisRef| a.capture_coord(voxel_space[a.axis], resolution[a.axis]);
        Vec3::new(project(m.u), project(m.v), project(m.depth))
    }
}
