//! Fixed-layout light records shared by the encoder and the light kernels
//!
//! Every field is a little-endian `f32` and the structs are `#[repr(C)]`
//! without padding, so the byte stride of each type is exactly the sum of its
//! fields. The sizes are checked at compile time.

use bytemuck::{Pod, Zeroable};

use crate::foundation::math::{Vec2, Vec3};
use crate::lighting::LightEncodeError;

/// Directional light: direction of travel and linear color
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct DirectionalLightRecord {
    /// Unit direction the light travels
    pub direction: [f32; 3],
    /// Linear color, intensity applied
    pub color: [f32; 3],
}

/// Point light
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PointLightRecord {
    /// World position
    pub position: [f32; 3],
    /// Linear color, intensity applied
    pub color: [f32; 3],
    /// Hard cutoff distance
    pub range: f32,
}

/// Spot light
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SpotLightRecord {
    /// World position
    pub position: [f32; 3],
    /// Unit cone axis
    pub direction: [f32; 3],
    /// Linear color, intensity applied
    pub color: [f32; 3],
    /// Hard cutoff distance
    pub range: f32,
    /// Full cone angle in degrees
    pub angle: f32,
}

/// Rectangular area light with an orthonormal frame
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct AreaLightRecord {
    /// Rectangle center
    pub position: [f32; 3],
    /// Unit emission direction
    pub forward: [f32; 3],
    /// Unit width axis
    pub right: [f32; 3],
    /// Unit height axis
    pub up: [f32; 3],
    /// Width and height
    pub size: [f32; 2],
    /// Linear color, intensity applied
    pub color: [f32; 3],
    /// Hard cutoff distance
    pub range: f32,
}

const _: () = assert!(std::mem::size_of::<DirectionalLightRecord>() == 24);
const _: () = assert!(std::mem::size_of::<PointLightRecord>() == 28);
const _: () = assert!(std::mem::size_of::<SpotLightRecord>() == 44);
const _: () = assert!(std::mem::size_of::<AreaLightRecord>() == 72);

/// Common behaviour of the four record types
pub trait LightRecord: Pod {
    /// Name used in buffer labels and errors
    const TYPE_NAME: &'static str;

    /// Byte stride of one record
    const STRIDE: usize = std::mem::size_of::<Self>();
}

impl LightRecord for DirectionalLightRecord {
    const TYPE_NAME: &'static str = "directional";
}

impl LightRecord for PointLightRecord {
    const TYPE_NAME: &'static str = "point";
}

impl LightRecord for SpotLightRecord {
    const TYPE_NAME: &'static str = "spot";
}

impl LightRecord for AreaLightRecord {
    const TYPE_NAME: &'static str = "area";
}

/// Serialize records into their raw byte layout
pub fn encode_records<T: LightRecord>(records: &[T]) -> Vec<u8> {
    bytemuck::cast_slice(records).to_vec()
}

/// Parse raw bytes back into records
///
/// The input may be unaligned; its length must be a multiple of the stride.
pub fn decode_records<T: LightRecord>(bytes: &[u8]) -> Result<Vec<T>, LightEncodeError> {
    if bytes.len() % T::STRIDE != 0 {
        return Err(LightEncodeError::InvalidStride {
            kind: T::TYPE_NAME,
            len: bytes.len(),
            stride: T::STRIDE,
        });
    }
    Ok(bytes
        .chunks_exact(T::STRIDE)
        .map(bytemuck::pod_read_unaligned)
        .collect())
}

/// Convenience conversions used by the light kernels
impl DirectionalLightRecord {
    /// Direction as a vector
    pub fn direction(&self) -> Vec3 {
        Vec3::from(self.direction)
    }

    /// Color as a vector
    pub fn color(&self) -> Vec3 {
        Vec3::from(self.color)
    }
}

impl PointLightRecord {
    /// Position as a vector
    pub fn position(&self) -> Vec3 {
        Vec3::from(self.position)
    }

    /// Color as a vector
    pub fn color(&self) -> Vec3 {
        Vec3::from(self.color)
    }
}

impl SpotLightRecord {
    /// Position as a vector
    pub fn position(&self) -> Vec3 {
        Vec3::from(self.position)
    }

    /// Cone axis as a vector
    pub fn direction(&self) -> Vec3 {
        Vec3::from(self.direction)
    }

    /// Color as a vector
    pub fn color(&self) -> Vec3 {
        Vec3::from(self.color)
    }
}

impl AreaLightRecord {
    /// Center as a vector
    pub fn position(&self) -> Vec3 {
        Vec3::from(self.position)
    }

    /// Emission direction as a vector
    pub fn forward(&self) -> Vec3 {
        Vec3::from(self.forward)
    }

    /// Width axis as a vector
    pub fn right(&self) -> Vec3 {
        Vec3::from(self.right)
    }

    /// Height axis as a vector
    pub fn up(&self) -> Vec3 {
        Vec3::from(self.up)
    }

    /// Size as a vector
    pub fn size(&self) -> Vec2 {
        Vec2::from(self.size)
    }

    /// Color as a vector
    pub fn color(&self) -> Vec3 {
        Vec3::from(self.color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_offsets_are_packed() {
        let record = SpotLightRecord {
            position: [1.0, 2.0, 3.0],
            direction: [4.0, 5.0, 6.0],
            color: [7.0, 8.0, 9.0],
            range: 10.0,
            angle: 11.0,
        };
        let bytes = encode_records(&[record]);
        let floats: Vec<f32> = bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        assert_eq!(floats, (1..=11).map(|i| i as f32).collect::<Vec<_>>());
    }

    #[test]
    fn test_decode_unaligned_and_bad_stride() {
        let record = PointLightRecord {
            position: [1.0, 0.0, -1.0],
            color: [0.5, 0.5, 0.5],
            range: 4.0,
        };
        let mut bytes = vec![0u8];
        bytes.extend(encode_records(&[record, record]));
        let decoded: Vec<PointLightRecord> = decode_records(&bytes[1..]).unwrap();
        assert_eq!(decoded, vec![record, record]);

        let err = decode_records::<PointLightRecord>(&bytes[1..30]).unwrap_err();
        assert!(matches!(err, LightEncodeError::InvalidStride { stride: 28, .. }));
    }
}
