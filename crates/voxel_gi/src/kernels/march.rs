//! Occupancy ray marching
//!
//! Rays walk the voxel grid cell by cell (3D DDA). A cell blocks the ray when
//! the alpha of the occupancy volume is above zero. The starting cell never
//! blocks, so a voxel does not shadow itself. Surface rays start one voxel
//! above the surface so that coplanar neighbours do not block them either.

use crate::foundation::math::{IVec3, UVec3, Vec3};
use crate::volume::Volume;

/// Distance in voxels a surface ray is lifted along its normal
pub const SURFACE_LIFT: f32 = 1.0;

/// Outcome of a march
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarchHit {
    /// Stopped in an occupied voxel
    Occupied(UVec3),
    /// Left the volume without hitting anything
    Escaped,
    /// Travelled `max_distance` without hitting anything
    Reached,
}

/// Ray through a voxel grid
#[derive(Debug, Clone, Copy)]
pub struct VoxelRay {
    /// Origin in continuous voxel space
    pub origin: Vec3,
    /// World-space unit direction
    pub direction: Vec3,
}

impl VoxelRay {
    /// Ray leaving the center of `voxel`
    pub fn from_voxel(voxel: &UVec3, direction: Vec3) -> Self {
        Self {
            origin: voxel.cast::<f32>().add_scalar(0.5),
            direction,
        }
    }

    /// Ray leaving the surface of `voxel`, lifted [`SURFACE_LIFT`] voxels
    /// along `normal`
    ///
    /// A zero normal starts at the voxel center.
    pub fn from_surface(voxel: &UVec3, normal: &Vec3, direction: Vec3) -> Self {
        let lift = normal
            .try_normalize(f32::EPSILON)
            .map_or_else(Vec3::zeros, |n| n * SURFACE_LIFT);
        Self {
            origin: voxel.cast::<f32>().add_scalar(0.5) + lift,
            direction,
        }
    }

    /// March through `occupancy` for at most `max_distance` world units
    ///
    /// `voxel_size` converts world distances into voxel steps.
    pub fn march(&self, occupancy: &Volume, voxel_size: &Vec3, max_distance: f32) -> MarchHit {
        let resolution = occupancy.resolution();
        let dir = self.direction.component_div(voxel_size);
        if dir.norm_squared() <= f32::EPSILON * f32::EPSILON {
            return MarchHit::Reached;
        }

        let mut cell = IVec3::new(
            self.origin.x.floor() as i32,
            self.origin.y.floor() as i32,
            self.origin.z.floor() as i32,
        );
        let mut step = IVec3::zeros();
        let mut t_max = Vec3::repeat(f32::INFINITY);
        let mut t_delta = Vec3::repeat(f32::INFINITY);

        for axis in 0..3 {
            let d = dir[axis];
            if d > 0.0 {
                step[axis] = 1;
                t_delta[axis] = 1.0 / d;
                t_max[axis] = ((cell[axis] + 1) as f32 - self.origin[axis]) / d;
            } else if d < 0.0 {
                step[axis] = -1;
                t_delta[axis] = -1.0 / d;
                t_max[axis] = (cell[axis] as f32 - self.origin[axis]) / d;
            }
        }

        loop {
            let axis = t_max.imin();
            let t = t_max[axis];
            if t > max_distance {
                return MarchHit::Reached;
            }
            cell[axis] += step[axis];
            t_max[axis] += t_delta[axis];

            let inside = cell
                .iter()
                .zip(resolution.iter())
                .all(|(c, r)| *c >= 0 && (*c as u32) < *r);
            if !inside {
                return MarchHit::Escaped;
            }
            let coord = cell.map(|c| c as u32);
            if occupancy.is_occupied(&coord) {
                return MarchHit::Occupied(coord);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec4;

    fn volume_with(occupied: &[UVec3]) -> Volume {
        let mut volume = Volume::new(UVec3::new(8, 8, 8));
        for coord in occupied {
            volume.set(coord, Vec4::new(1.0, 1.0, 1.0, 1.0));
        }
        volume
    }

    #[test]
    fn test_hits_first_occupied_cell() {
        let volume = volume_with(&[UVec3::new(5, 2, 2), UVec3::new(7, 2, 2)]);
        let ray = VoxelRay::from_voxel(&UVec3::new(1, 2, 2), Vec3::x());
        let hit = ray.march(&volume, &Vec3::repeat(1.0), f32::INFINITY);
        assert_eq!(hit, MarchHit::Occupied(UVec3::new(5, 2, 2)));
    }

    #[test]
    fn test_start_cell_never_blocks() {
        let volume = volume_with(&[UVec3::new(1, 2, 2)]);
        let ray = VoxelRay::from_voxel(&UVec3::new(1, 2, 2), -Vec3::y());
        assert_eq!(ray.march(&volume, &Vec3::repeat(1.0), f32::INFINITY), MarchHit::Escaped);
    }

    #[test]
    fn test_max_distance_stops_before_blocker() {
        let volume = volume_with(&[UVec3::new(6, 2, 2)]);
        let ray = VoxelRay::from_voxel(&UVec3::new(1, 2, 2), Vec3::x());
        // voxels are 0.5 world units: the blocker is 2.5 units away
        let voxel_size = Vec3::repeat(0.5);
        assert_eq!(ray.march(&volume, &voxel_size, 1.5), MarchHit::Reached);
        assert_eq!(
            ray.march(&volume, &voxel_size, 3.0),
            MarchHit::Occupied(UVec3::new(6, 2, 2))
        );
    }

    #[test]
    fn test_surface_ray_clears_coplanar_neighbours() {
        let floor: Vec<UVec3> = (0..8).flat_map(|x| (0..8).map(move |z| UVec3::new(x, 0, z))).collect();
        let volume = volume_with(&floor);
        let grazing = Vec3::new(1.0, 0.05, 0.3).normalize();

        let centered = VoxelRay::from_voxel(&UVec3::new(2, 0, 2), grazing);
        assert!(matches!(
            centered.march(&volume, &Vec3::repeat(1.0), f32::INFINITY),
            MarchHit::Occupied(_)
        ));

        let lifted = VoxelRay::from_surface(&UVec3::new(2, 0, 2), &Vec3::y(), grazing);
        assert_eq!(lifted.march(&volume, &Vec3::repeat(1.0), f32::INFINITY), MarchHit::Escaped);
    }

    #[test]
    fn test_surface_ray_still_hits_blockers_above() {
        let volume = volume_with(&[UVec3::new(2, 0, 2), UVec3::new(2, 4, 2)]);
        let ray = VoxelRay::from_surface(&UVec3::new(2, 0, 2), &Vec3::y(), Vec3::y());
        assert_eq!(
            ray.march(&volume, &Vec3::repeat(1.0), f32::INFINITY),
            MarchHit::Occupied(UVec3::new(2, 4, 2))
        );
        // zero normal keeps the center origin
        let ray = VoxelRay::from_surface(&UVec3::new(2, 0, 2), &Vec3::zeros(), Vec3::y());
        assert_eq!(ray.origin, Vec3::new(2.5, 0.5, 2.5));
    }

    #[test]
    fn test_diagonal_march_escapes() {
        let volume = volume_with(&[]);
        let ray = VoxelRay::from_voxel(&UVec3::new(3, 3, 3), Vec3::new(1.0, 1.0, 1.0).normalize());
        assert_eq!(ray.march(&volume, &Vec3::repeat(1.0), f32::INFINITY), MarchHit::Escaped);
    }
}
