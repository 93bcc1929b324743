//! Texel storage formats and volume roles

use half::f16;
use serde::{Deserialize, Serialize};

use super::VolumeError;
use crate::foundation::math::Vec4;

/// Per-channel precision of a persisted or resolved volume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TexelFormat {
    /// 8-bit unsigned normalized RGBA, enough for albedo and occupancy
    Rgba8Unorm,
    /// 16-bit float RGBA, required for HDR radiance and signed normals
    RgbaHalf,
    /// 32-bit float RGBA, lossless
    RgbaFloat,
}

impl TexelFormat {
    /// Bytes per texel
    pub fn bytes_per_texel(self) -> usize {
        match self {
            Self::Rgba8Unorm => 4,
            Self::RgbaHalf => 8,
            Self::RgbaFloat => 16,
        }
    }

    /// Stable tag stored in persisted file headers
    pub fn tag(self) -> u32 {
        match self {
            Self::Rgba8Unorm => 1,
            Self::RgbaHalf => 2,
            Self::RgbaFloat => 3,
        }
    }

    /// Reverse of [`TexelFormat::tag`]
    pub fn from_tag(tag: u32) -> Result<Self, VolumeError> {
        match tag {
            1 => Ok(Self::Rgba8Unorm),
            2 => Ok(Self::RgbaHalf),
            3 => Ok(Self::RgbaFloat),
            other => Err(VolumeError::UnknownFormat(other)),
        }
    }

    /// Round a texel to the precision of this format
    pub fn quantize(self, texel: &Vec4) -> Vec4 {
        match self {
            Self::Rgba8Unorm => texel.map(|c| f32::from(unorm8(c)) / 255.0),
            Self::RgbaHalf => texel.map(|c| f16::from_f32(c).to_f32()),
            Self::RgbaFloat => *texel,
        }
    }

    /// Encode texels into raw little-endian bytes
    pub fn encode(self, texels: &[Vec4]) -> Vec<u8> {
        match self {
            Self::Rgba8Unorm => texels
                .iter()
                .flat_map(|t| [unorm8(t.x), unorm8(t.y), unorm8(t.z), unorm8(t.w)])
                .collect(),
            Self::RgbaHalf => {
                let halves: Vec<f16> = texels
                    .iter()
                    .flat_map(|t| [t.x, t.y, t.z, t.w].map(f16::from_f32))
                    .collect();
                halves.iter().flat_map(|h| h.to_le_bytes()).collect()
            }
            Self::RgbaFloat => texels
                .iter()
                .flat_map(|t| [t.x, t.y, t.z, t.w])
                .flat_map(f32::to_le_bytes)
                .collect(),
        }
    }

    /// Decode `count` texels from raw bytes
    pub fn decode(self, bytes: &[u8], count: usize) -> Result<Vec<Vec4>, VolumeError> {
        let needed = count * self.bytes_per_texel();
        if bytes.len() < needed {
            return Err(VolumeError::Truncated {
                expected: needed,
                found: bytes.len(),
            });
        }
        let bytes = &bytes[..needed];
        let texels = match self {
            Self::Rgba8Unorm => bytes
                .chunks_exact(4)
                .map(|c| Vec4::new(c[0].into(), c[1].into(), c[2].into(), c[3].into()) / 255.0)
                .collect(),
            Self::RgbaHalf => bytes
                .chunks_exact(8)
                .map(|c| {
                    let ch = |i: usize| f16::from_le_bytes([c[i], c[i + 1]]).to_f32();
                    Vec4::new(ch(0), ch(2), ch(4), ch(6))
                })
                .collect(),
            Self::RgbaFloat => bytes
                .chunks_exact(16)
                .map(|c| {
                    let ch = |i: usize| f32::from_le_bytes([c[i], c[i + 1], c[i + 2], c[i + 3]]);
                    Vec4::new(ch(0), ch(4), ch(8), ch(12))
                })
                .collect(),
        };
        Ok(texels)
    }
}

fn unorm8(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Purpose of a baked volume, which fixes its file suffix and storage format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VolumeRole {
    /// Scene albedo, alpha is occupancy
    Albedo,
    /// Scene surface normals (signed)
    Normal,
    /// Scene emission
    Emissive,
    /// Direct light on surfaces
    DirectSurface,
    /// Direct light through empty space
    DirectVolumetric,
    /// Bounced light on surfaces
    BounceSurface,
    /// Bounced light through empty space
    BounceVolumetric,
    /// Environment light on surfaces
    EnvironmentSurface,
    /// Environment light through empty space
    EnvironmentVolumetric,
    /// Final surface lighting
    CombinedSurface,
    /// Final volumetric lighting
    CombinedVolumetric,
}

impl VolumeRole {
    /// Every role, in pipeline order
    pub const ALL: [Self; 11] = [
        Self::Albedo,
        Self::Normal,
        Self::Emissive,
        Self::DirectSurface,
        Self::DirectVolumetric,
        Self::EnvironmentSurface,
        Self::EnvironmentVolumetric,
        Self::BounceSurface,
        Self::BounceVolumetric,
        Self::CombinedSurface,
        Self::CombinedVolumetric,
    ];

    /// Suffix appended to the bake name when persisting
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Albedo => "_albedo",
            Self::Normal => "_normal",
            Self::Emissive => "_emissive",
            Self::DirectSurface => "_directSurface",
            Self::DirectVolumetric => "_directVolumetric",
            Self::BounceSurface => "_bounceSurface",
            Self::BounceVolumetric => "_bounceVolumetric",
            Self::EnvironmentSurface => "_environmentSurface",
            Self::EnvironmentVolumetric => "_environmentVolumetric",
            Self::CombinedSurface => "_combinedSurface",
            Self::CombinedVolumetric => "_combinedVolumetric",
        }
    }

    /// Storage format for this role
    pub fn format(self) -> TexelFormat {
        match self {
            Self::Albedo => TexelFormat::Rgba8Unorm,
            _ => TexelFormat::RgbaHalf,
        }
    }

    /// Whether the role is a scene attribute rather than a light volume
    pub fn is_scene_attribute(self) -> bool {
        matches!(self, Self::Albedo | Self::Normal | Self::Emissive)
    }

    /// Whether the role is a final output
    pub fn is_combined(self) -> bool {
        matches!(self, Self::CombinedSurface | Self::CombinedVolumetric)
    }
}
