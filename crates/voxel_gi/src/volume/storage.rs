//! Dense RGBA voxel storage

use super::{TexelFormat, VolumeError};
use crate::foundation::math::{IVec3, UVec3, Vec4};

/// Dense 3D grid of RGBA texels
///
/// Channels depend on the role of the volume (albedo RGBA, signed normal RGB,
/// emissive RGB or radiance RGB). In every role `alpha > 0` marks a voxel that
/// contains a surface.
#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    resolution: UVec3,
    texels: Vec<Vec4>,
}

impl Volume {
    /// Create a zero-filled volume
    pub fn new(resolution: UVec3) -> Self {
        Self::filled(resolution, Vec4::zeros())
    }

    /// Create a volume with every texel set to `value`
    pub fn filled(resolution: UVec3, value: Vec4) -> Self {
        let len = resolution.iter().map(|r| *r as usize).product();
        Self {
            resolution,
            texels: vec![value; len],
        }
    }

    /// Wrap existing texel data, which must be `x`-fastest ordered
    pub fn from_texels(resolution: UVec3, texels: Vec<Vec4>) -> Result<Self, VolumeError> {
        let expected: usize = resolution.iter().map(|r| *r as usize).product();
        if texels.len() != expected {
            return Err(VolumeError::TexelCount {
                expected,
                found: texels.len(),
            });
        }
        Ok(Self { resolution, texels })
    }

    /// Voxel counts per axis
    pub fn resolution(&self) -> UVec3 {
        self.resolution
    }

    /// Number of texels
    pub fn len(&self) -> usize {
        self.texels.len()
    }

    /// Whether the volume holds no texels
    pub fn is_empty(&self) -> bool {
        self.texels.is_empty()
    }

    /// Texels in storage order
    pub fn texels(&self) -> &[Vec4] {
        &self.texels
    }

    /// Mutable texels in storage order
    pub fn texels_mut(&mut self) -> &mut [Vec4] {
        &mut self.texels
    }

    /// Linear index of a voxel
    pub fn index(&self, coord: &UVec3) -> usize {
        let r = self.resolution;
        (coord.z as usize * r.y as usize + coord.y as usize) * r.x as usize + coord.x as usize
    }

    /// Voxel coordinate of a linear index
    pub fn coord(&self, index: usize) -> UVec3 {
        let rx = self.resolution.x as usize;
        let ry = self.resolution.y as usize;
        UVec3::new((index % rx) as u32, ((index / rx) % ry) as u32, (index / (rx * ry)) as u32)
    }

    /// Read a texel
    pub fn get(&self, coord: &UVec3) -> Vec4 {
        self.texels[self.index(coord)]
    }

    /// Read a texel at a signed coordinate, `None` outside the volume
    pub fn get_checked(&self, coord: &IVec3) -> Option<Vec4> {
        self.contains(coord).then(|| self.texels[self.index(&coord.map(|c| c as u32))])
    }

    /// Write a texel
    pub fn set(&mut self, coord: &UVec3, value: Vec4) {
        let index = self.index(coord);
        self.texels[index] = value;
    }

    /// Mutable access to a texel
    pub fn texel_mut(&mut self, coord: &UVec3) -> &mut Vec4 {
        let index = self.index(coord);
        &mut self.texels[index]
    }

    /// Whether a signed coordinate is inside the volume
    pub fn contains(&self, coord: &IVec3) -> bool {
        coord
            .iter()
            .zip(self.resolution.iter())
            .all(|(c, r)| *c >= 0 && (*c as u32) < *r)
    }

    /// Whether a voxel holds a surface
    pub fn is_occupied(&self, coord: &UVec3) -> bool {
        self.get(coord).w > 0.0
    }

    /// Number of occupied voxels
    pub fn occupied_count(&self) -> usize {
        self.texels.iter().filter(|t| t.w > 0.0).count()
    }

    /// Overwrite every texel
    pub fn fill(&mut self, value: Vec4) {
        self.texels.fill(value);
    }

    /// Whether two volumes have the same resolution
    pub fn same_shape(&self, other: &Self) -> bool {
        self.resolution == other.resolution
    }

    /// Fail unless `other` has the same resolution
    pub fn ensure_same_shape(&self, other: &Self) -> Result<(), VolumeError> {
        if self.same_shape(other) {
            Ok(())
        } else {
            Err(VolumeError::ShapeMismatch {
                expected: self.resolution,
                found: other.resolution,
            })
        }
    }

    /// Round every texel through a storage format
    pub fn quantized(&self, format: TexelFormat) -> Self {
        Self {
            resolution: self.resolution,
            texels: self.texels.iter().map(|t| format.quantize(t)).collect(),
        }
    }

    /// Largest absolute channel difference against another volume
    pub fn max_abs_difference(&self, other: &Self) -> Result<f32, VolumeError> {
        self.ensure_same_shape(other)?;
        Ok(self
            .texels
            .iter()
            .zip(other.texels.iter())
            .map(|(a, b)| (a - b).amax())
            .fold(0.0, f32::max))
    }
}

/// Mutable radiance target written across many dispatches
///
/// Solvers add into the buffer sample after sample. Before the contents can be
/// read back as an input of another dispatch the buffer must be resolved into
/// a readable [`Volume`], which rounds it through the storage format exactly
/// like a copy into a persisted texture would.
#[derive(Debug, Clone)]
pub struct AccumulationBuffer {
    volume: Volume,
}

impl AccumulationBuffer {
    /// Create a zeroed accumulation buffer
    pub fn new(resolution: UVec3) -> Self {
        Self {
            volume: Volume::new(resolution),
        }
    }

    /// Start accumulation from existing contents
    pub fn from_volume(volume: Volume) -> Self {
        Self { volume }
    }

    /// Voxel counts per axis
    pub fn resolution(&self) -> UVec3 {
        self.volume.resolution()
    }

    /// Current contents
    pub fn as_volume(&self) -> &Volume {
        &self.volume
    }

    /// Mutable contents, for kernels
    pub fn volume_mut(&mut self) -> &mut Volume {
        &mut self.volume
    }

    /// Reset every texel to zero
    pub fn clear(&mut self) {
        self.volume.fill(Vec4::zeros());
    }

    /// Snapshot the buffer into a readable volume
    ///
    /// Callers must have drained outstanding dispatches first.
    pub fn resolve(&self, format: TexelFormat) -> Volume {
        self.volume.quantized(format)
    }

    /// Consume the buffer, returning the raw contents
    pub fn into_volume(self) -> Volume {
        self.volume
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_coord_round_trip() {
        let volume = Volume::new(UVec3::new(3, 4, 5));
        for index in 0..volume.len() {
            let coord = volume.coord(index);
            assert_eq!(volume.index(&coord), index);
        }
        assert_eq!(volume.index(&UVec3::new(1, 0, 0)), 1);
        assert_eq!(volume.index(&UVec3::new(0, 1, 0)), 3);
        assert_eq!(volume.index(&UVec3::new(0, 0, 1)), 12);
    }

    #[test]
    fn test_from_texels_rejects_wrong_length() {
        let result = Volume::from_texels(UVec3::new(2, 2, 2), vec![Vec4::zeros(); 7]);
        assert!(matches!(
            result,
            Err(VolumeError::TexelCount { expected: 8, found: 7 })
        ));
    }

    #[test]
    fn test_get_checked_outside() {
        let volume = Volume::filled(UVec3::new(2, 2, 2), Vec4::new(1.0, 0.0, 0.0, 1.0));
        assert!(volume.get_checked(&IVec3::new(1, 1, 1)).is_some());
        assert!(volume.get_checked(&IVec3::new(-1, 0, 0)).is_none());
        assert!(volume.get_checked(&IVec3::new(0, 2, 0)).is_none());
    }

    #[test]
    fn test_occupancy_tracks_alpha() {
        let mut volume = Volume::new(UVec3::new(2, 1, 1));
        volume.set(&UVec3::new(1, 0, 0), Vec4::new(0.2, 0.2, 0.2, 0.5));
        assert!(!volume.is_occupied(&UVec3::new(0, 0, 0)));
        assert!(volume.is_occupied(&UVec3::new(1, 0, 0)));
        assert_eq!(volume.occupied_count(), 1);
    }

    #[test]
    fn test_accumulation_resolve_quantizes() {
        let mut buffer = AccumulationBuffer::new(UVec3::new(1, 1, 1));
        buffer.volume_mut().set(&UVec3::zeros(), Vec4::new(0.5004, 2.0, 0.0, 1.0));
        let resolved = buffer.resolve(TexelFormat::Rgba8Unorm);
        let texel = resolved.get(&UVec3::zeros());
        assert_eq!(texel.y, 1.0);
        assert!((texel.x - 128.0 / 255.0).abs() < 1e-6);
    }
}
