//! World-space placement and resolution of a voxel volume

use serde::{Deserialize, Serialize};

use super::VolumeError;
use crate::foundation::math::{Aabb, IVec3, UVec3, Vec3};

/// Slack added before flooring `size / density` so that exact multiples
/// survive float rounding (e.g. `1.0 / 0.1`).
const RESOLUTION_EPSILON: f32 = 1e-5;

/// Largest voxel count of a single grid (2 GiB of `f32` RGBA texels)
pub const MAX_VOXELS: usize = 1 << 27;

/// Placement of a dense voxel grid in world space
///
/// The grid is anchored at `center` and spans `size` world units. Voxels are
/// addressed `x` fastest, then `y`, then `z`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeGrid {
    /// World-space center of the volume
    pub center: Vec3,
    /// World-space edge lengths of the volume
    pub size: Vec3,
    /// Voxel counts per axis, never zero
    pub resolution: UVec3,
}

impl VolumeGrid {
    /// Resolution for a volume of `size` sampled every `density` world units
    ///
    /// `floor(size / density)` componentwise, clamped to at least one voxel
    /// per axis.
    pub fn resolution_for(size: &Vec3, density: f32) -> Result<UVec3, VolumeError> {
        if !(density.is_finite() && density > 0.0) {
            return Err(VolumeError::InvalidDensity(density));
        }
        if size.iter().any(|s| !(s.is_finite() && *s > 0.0)) {
            return Err(VolumeError::InvalidSize(*size));
        }
        let cells = size.map(|s| (s / density + RESOLUTION_EPSILON).floor().max(1.0));
        if cells.iter().any(|c| *c > u32::MAX as f32) {
            return Err(VolumeError::TooLarge {
                resolution: cells.map(|c| c.min(u32::MAX as f32) as u32),
                limit: MAX_VOXELS,
            });
        }
        let resolution = cells.map(|c| c as u32);
        Self::checked_voxel_count(&resolution)?;
        Ok(resolution)
    }

    /// Voxel count of `resolution`, failing above [`MAX_VOXELS`]
    pub fn checked_voxel_count(resolution: &UVec3) -> Result<usize, VolumeError> {
        resolution
            .iter()
            .try_fold(1usize, |count, r| count.checked_mul(*r as usize))
            .filter(|count| *count <= MAX_VOXELS)
            .ok_or(VolumeError::TooLarge {
                resolution: *resolution,
                limit: MAX_VOXELS,
            })
    }

    /// Build a grid from a voxel density (world units per voxel)
    pub fn from_density(center: Vec3, size: Vec3, density: f32) -> Result<Self, VolumeError> {
        let resolution = Self::resolution_for(&size, density)?;
        Ok(Self {
            center,
            size,
            resolution,
        })
    }

    /// Build a grid with an explicit resolution
    pub fn with_resolution(center: Vec3, size: Vec3, resolution: UVec3) -> Result<Self, VolumeError> {
        if resolution.iter().any(|r| *r == 0) {
            return Err(VolumeError::InvalidResolution(resolution));
        }
        Self::checked_voxel_count(&resolution)?;
        if size.iter().any(|s| !(s.is_finite() && *s > 0.0)) {
            return Err(VolumeError::InvalidSize(size));
        }
        Ok(Self {
            center,
            size,
            resolution,
        })
    }

    /// Edge lengths of one voxel
    pub fn voxel_size(&self) -> Vec3 {
        self.size.component_div(&self.resolution.cast::<f32>())
    }

    /// Minimum world-space corner
    pub fn min(&self) -> Vec3 {
        self.center - self.size * 0.5
    }

    /// Maximum world-space corner
    pub fn max(&self) -> Vec3 {
        self.center + self.size * 0.5
    }

    /// World-space bounds
    pub fn bounds(&self) -> Aabb {
        Aabb::new(self.min(), self.max())
    }

    /// Total number of voxels, at most [`MAX_VOXELS`]
    pub fn voxel_count(&self) -> usize {
        self.resolution.iter().fold(1usize, |count, r| count.saturating_mul(*r as usize))
    }

    /// World-space center of a voxel
    pub fn voxel_center(&self, coord: &UVec3) -> Vec3 {
        let cell = coord.cast::<f32>().add_scalar(0.5);
        self.min() + cell.component_mul(&self.voxel_size())
    }

    /// Continuous voxel-space position (voxel `i` spans `[i, i + 1)`)
    pub fn world_to_voxel_space(&self, point: &Vec3) -> Vec3 {
        (point - self.min()).component_div(&self.voxel_size())
    }

    /// Voxel containing a world-space point, `None` outside the grid
    pub fn world_to_voxel(&self, point: &Vec3) -> Option<UVec3> {
        let local = self.world_to_voxel_space(point);
        let coord = IVec3::new(
            local.x.floor() as i32,
            local.y.floor() as i32,
            local.z.floor() as i32,
        );
        self.checked_coord(&coord)
    }

    /// Convert a signed coordinate into an in-bounds voxel coordinate
    pub fn checked_coord(&self, coord: &IVec3) -> Option<UVec3> {
        let inside = coord
            .iter()
            .zip(self.resolution.iter())
            .all(|(c, r)| *c >= 0 && (*c as u32) < *r);
        inside.then(|| coord.map(|c| c as u32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_oversized_grid_is_rejected() {
        let err = VolumeGrid::from_density(Vec3::zeros(), Vec3::repeat(1e6), 1e-3).unwrap_err();
        assert!(matches!(err, VolumeError::TooLarge { limit: MAX_VOXELS, .. }), "{err}");

        let err = VolumeGrid::with_resolution(Vec3::zeros(), Vec3::repeat(1.0), UVec3::repeat(u32::MAX)).unwrap_err();
        assert!(matches!(err, VolumeError::TooLarge { .. }));

        // one voxel short of the limit along a single axis is fine
        let grid = VolumeGrid::with_resolution(Vec3::zeros(), Vec3::repeat(1.0), UVec3::new(1 << 27, 1, 1)).unwrap();
        assert_eq!(grid.voxel_count(), MAX_VOXELS);
        assert!(VolumeGrid::with_resolution(Vec3::zeros(), Vec3::repeat(1.0), UVec3::new(1 << 27, 2, 1)).is_err());
    }

    #[test]
    fn test_resolution_is_floor_of_size_over_density() {
        let cases = [
            (Vec3::new(10.0, 5.0, 2.5), 1.0, UVec3::new(10, 5, 2)),
            (Vec3::new(1.0, 1.0, 1.0), 0.1, UVec3::new(10, 10, 10)),
            (Vec3::new(4.0, 3.9, 0.5), 0.5, UVec3::new(8, 7, 1)),
            (Vec3::new(7.3, 2.2, 9.9), 0.75, UVec3::new(9, 2, 13)),
        ];
        for (size, density, expected) in cases {
            assert_eq!(VolumeGrid::resolution_for(&size, density).unwrap(), expected);
        }
    }

    #[test]
    fn test_resolution_clamps_to_one() {
        let res = VolumeGrid::resolution_for(&Vec3::new(0.1, 10.0, 0.2), 1.0).unwrap();
        assert_eq!(res, UVec3::new(1, 10, 1));
    }

    #[test]
    fn test_invalid_density_rejected() {
        let size = Vec3::new(1.0, 1.0, 1.0);
        assert!(matches!(
            VolumeGrid::resolution_for(&size, 0.0),
            Err(VolumeError::InvalidDensity(_))
        ));
        assert!(VolumeGrid::resolution_for(&size, f32::NAN).is_err());
        assert!(VolumeGrid::resolution_for(&Vec3::new(-1.0, 1.0, 1.0), 0.5).is_err());
    }

    #[test]
    fn test_world_voxel_round_trip() {
        let grid = VolumeGrid::from_density(Vec3::new(1.0, 0.0, -1.0), Vec3::new(4.0, 2.0, 2.0), 0.5)
            .unwrap();
        assert_eq!(grid.resolution, UVec3::new(8, 4, 4));
        for coord in [UVec3::new(0, 0, 0), UVec3::new(7, 3, 3), UVec3::new(3, 1, 2)] {
            let center = grid.voxel_center(&coord);
            assert_eq!(grid.world_to_voxel(&center), Some(coord));
        }
        assert_eq!(grid.world_to_voxel(&Vec3::new(10.0, 0.0, 0.0)), None);
        assert_relative_eq!(grid.voxel_size(), Vec3::new(0.5, 0.5, 0.5));
    }
}
