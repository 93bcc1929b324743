//! Reading and writing baked volumes
//!
//! A persisted volume is a fixed 48 byte header followed by the raw texels in
//! `x`-fastest order, encoded with the format named in the header. The header
//! also carries the grid placement so a runtime sampler can map world space
//! into the volume without any side data.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use super::{TexelFormat, Volume, VolumeError, VolumeGrid, VolumeRole};
use crate::foundation::math::{UVec3, Vec3};

/// File magic of persisted volumes
pub const VOLUME_MAGIC: [u8; 4] = *b"VXGI";

/// Current persisted volume version
pub const VOLUME_VERSION: u32 = 1;

/// File extension of persisted volumes
pub const VOLUME_EXTENSION: &str = "vxv";

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct VolumeFileHeader {
    magic: [u8; 4],
    version: u32,
    format: u32,
    resolution: [u32; 3],
    center: [f32; 3],
    size: [f32; 3],
}

const HEADER_SIZE: usize = std::mem::size_of::<VolumeFileHeader>();
const _: () = assert!(HEADER_SIZE == 48);

/// A volume read back from disk
#[derive(Debug, Clone)]
pub struct PersistedVolume {
    /// Grid placement stored with the volume
    pub grid: VolumeGrid,
    /// Storage format of the texels
    pub format: TexelFormat,
    /// Decoded texels
    pub volume: Volume,
}

/// Serialize a volume into its persisted byte representation
pub fn encode_volume(volume: &Volume, grid: &VolumeGrid, format: TexelFormat) -> Result<Vec<u8>, VolumeError> {
    if volume.resolution() != grid.resolution {
        return Err(VolumeError::ShapeMismatch {
            expected: grid.resolution,
            found: volume.resolution(),
        });
    }
    let header = VolumeFileHeader {
        magic: VOLUME_MAGIC,
        version: VOLUME_VERSION,
        format: format.tag(),
        resolution: [grid.resolution.x, grid.resolution.y, grid.resolution.z],
        center: [grid.center.x, grid.center.y, grid.center.z],
        size: [grid.size.x, grid.size.y, grid.size.z],
    };
    let mut bytes = Vec::with_capacity(HEADER_SIZE + volume.len() * format.bytes_per_texel());
    bytes.extend_from_slice(bytemuck::bytes_of(&header));
    bytes.extend_from_slice(&format.encode(volume.texels()));
    Ok(bytes)
}

/// Parse the persisted byte representation of a volume
pub fn decode_volume(bytes: &[u8]) -> Result<PersistedVolume, VolumeError> {
    if bytes.len() < HEADER_SIZE {
        return Err(VolumeError::Truncated {
            expected: HEADER_SIZE,
            found: bytes.len(),
        });
    }
    let header: VolumeFileHeader = bytemuck::pod_read_unaligned(&bytes[..HEADER_SIZE]);
    if header.magic != VOLUME_MAGIC {
        return Err(VolumeError::BadMagic(header.magic));
    }
    if header.version != VOLUME_VERSION {
        return Err(VolumeError::UnsupportedVersion(header.version));
    }
    let format = TexelFormat::from_tag(header.format)?;
    let grid = VolumeGrid::with_resolution(
        Vec3::from(header.center),
        Vec3::from(header.size),
        UVec3::from(header.resolution),
    )?;
    let texels = format.decode(&bytes[HEADER_SIZE..], grid.voxel_count())?;
    let volume = Volume::from_texels(grid.resolution, texels)?;
    Ok(PersistedVolume {
        grid,
        format,
        volume,
    })
}

/// Write a volume to `path`
pub fn write_volume(
    path: impl AsRef<Path>,
    volume: &Volume,
    grid: &VolumeGrid,
    format: TexelFormat,
) -> Result<(), VolumeError> {
    let path = path.as_ref();
    let bytes = encode_volume(volume, grid, format)?;
    let mut file = fs::File::create(path)?;
    file.write_all(&bytes)?;
    log::debug!("Wrote {} ({} bytes, {:?})", path.display(), bytes.len(), format);
    Ok(())
}

/// Read a volume from `path`
pub fn read_volume(path: impl AsRef<Path>) -> Result<PersistedVolume, VolumeError> {
    let bytes = fs::read(path)?;
    decode_volume(&bytes)
}

/// File name of a persisted volume: `<name><role suffix>.vxv`
pub fn volume_file_name(name: &str, role: VolumeRole) -> String {
    format!("{}{}.{}", name, role.suffix(), VOLUME_EXTENSION)
}

/// One persisted volume listed in a manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Purpose of the volume
    pub role: VolumeRole,
    /// File name relative to the manifest
    pub file: String,
    /// Storage format of the file
    pub format: TexelFormat,
}

/// Index of every volume written by one bake
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BakeManifest {
    /// Bake name, the prefix of every file
    pub name: String,
    /// Grid shared by every volume
    pub grid: VolumeGrid,
    /// Persisted volumes in write order
    pub entries: Vec<ManifestEntry>,
}

impl BakeManifest {
    /// Start an empty manifest
    pub fn new(name: impl Into<String>, grid: VolumeGrid) -> Self {
        Self {
            name: name.into(),
            grid,
            entries: Vec::new(),
        }
    }

    /// Manifest file name for a bake
    pub fn file_name(name: &str) -> String {
        format!("{name}_manifest.ron")
    }

    /// Look up the entry for a role
    pub fn entry(&self, role: VolumeRole) -> Option<&ManifestEntry> {
        self.entries.iter().find(|e| e.role == role)
    }

    /// Write the manifest as RON into `directory`, returning its path
    pub fn save(&self, directory: &Path) -> Result<PathBuf, VolumeError> {
        let path = directory.join(Self::file_name(&self.name));
        let text = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| VolumeError::Manifest(e.to_string()))?;
        fs::write(&path, text)?;
        Ok(path)
    }

    /// Read a manifest written by [`BakeManifest::save`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, VolumeError> {
        let text = fs::read_to_string(path)?;
        ron::from_str(&text).map_err(|e| VolumeError::Manifest(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec4;
    use approx::assert_abs_diff_eq;

    fn sample_volume() -> (VolumeGrid, Volume) {
        let grid = VolumeGrid::with_resolution(
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::new(2.0, 2.0, 4.0),
            UVec3::new(2, 2, 4),
        )
        .unwrap();
        let mut volume = Volume::new(grid.resolution);
        for (i, texel) in volume.texels_mut().iter_mut().enumerate() {
            *texel = Vec4::new(i as f32 * 0.25, 1.0, 0.5, 1.0);
        }
        (grid, volume)
    }

    #[test]
    fn test_encode_decode_half() {
        let (grid, volume) = sample_volume();
        let bytes = encode_volume(&volume, &grid, TexelFormat::RgbaHalf).unwrap();
        assert_eq!(bytes.len(), HEADER_SIZE + volume.len() * 8);

        let persisted = decode_volume(&bytes).unwrap();
        assert_eq!(persisted.format, TexelFormat::RgbaHalf);
        assert_eq!(persisted.grid, grid);
        assert_abs_diff_eq!(persisted.volume.max_abs_difference(&volume).unwrap(), 0.0, epsilon = 1e-2);
    }

    #[test]
    fn test_decode_rejects_bad_magic() {
        let (grid, volume) = sample_volume();
        let mut bytes = encode_volume(&volume, &grid, TexelFormat::RgbaFloat).unwrap();
        bytes[0] = b'X';
        assert!(matches!(decode_volume(&bytes), Err(VolumeError::BadMagic(_))));
    }

    #[test]
    fn test_decode_rejects_truncated_payload() {
        let (grid, volume) = sample_volume();
        let bytes = encode_volume(&volume, &grid, TexelFormat::RgbaFloat).unwrap();
        let result = decode_volume(&bytes[..bytes.len() - 4]);
        assert!(matches!(result, Err(VolumeError::Truncated { .. })));
    }

    #[test]
    fn test_encode_rejects_shape_mismatch() {
        let (grid, _) = sample_volume();
        let other = Volume::new(UVec3::new(1, 1, 1));
        assert!(encode_volume(&other, &grid, TexelFormat::RgbaHalf).is_err());
    }

    #[test]
    fn test_file_round_trip_and_manifest() {
        let dir = std::env::temp_dir().join(format!("voxel_gi_io_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let (grid, volume) = sample_volume();

        let file = volume_file_name("room", VolumeRole::CombinedSurface);
        assert_eq!(file, "room_combinedSurface.vxv");
        write_volume(dir.join(&file), &volume, &grid, TexelFormat::RgbaFloat).unwrap();
        let persisted = read_volume(dir.join(&file)).unwrap();
        assert_eq!(persisted.volume, volume);

        let mut manifest = BakeManifest::new("room", grid);
        manifest.entries.push(ManifestEntry {
            role: VolumeRole::CombinedSurface,
            file,
            format: TexelFormat::RgbaFloat,
        });
        let path = manifest.save(&dir).unwrap();
        let loaded = BakeManifest::load(path).unwrap();
        assert_eq!(loaded, manifest);
        assert!(loaded.entry(VolumeRole::Albedo).is_none());

        fs::remove_dir_all(&dir).unwrap();
    }
}
