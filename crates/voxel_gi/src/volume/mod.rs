//! Voxel volumes
//!
//! Dense 3D texel grids, their world-space placement, storage formats and the
//! on-disk representation of baked volumes.

mod format;
mod grid;
pub mod io;
mod storage;

pub use format::{TexelFormat, VolumeRole};
pub use grid::VolumeGrid;
pub use io::{BakeManifest, ManifestEntry, PersistedVolume};
pub use storage::{AccumulationBuffer, Volume};

use crate::foundation::math::{UVec3, Vec3};

/// Volume construction, shape and persistence errors
#[derive(thiserror::Error, Debug)]
pub enum VolumeError {
    /// Voxel density must be a positive finite number
    #[error("Invalid voxel density: {0}")]
    InvalidDensity(f32),

    /// Volume size must be positive and finite on every axis
    #[error("Invalid volume size: {0:?}")]
    InvalidSize(Vec3),

    /// Every axis needs at least one voxel
    #[error("Invalid volume resolution: {0:?}")]
    InvalidResolution(UVec3),

    /// Grid holds more voxels than a single volume may store
    #[error("Volume resolution {resolution:?} exceeds {limit} voxels")]
    TooLarge {
        /// Requested resolution, saturated per axis
        resolution: UVec3,
        /// Largest allowed voxel count
        limit: usize,
    },

    /// Two volumes combined elementwise differ in shape
    #[error("Volume shape mismatch: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        /// Resolution of the reference volume
        expected: UVec3,
        /// Resolution of the offending volume
        found: UVec3,
    },

    /// Texel data does not match the resolution
    #[error("Expected {expected} texels, found {found}")]
    TexelCount {
        /// Texels implied by the resolution
        expected: usize,
        /// Texels supplied
        found: usize,
    },

    /// Persisted data ended early
    #[error("Truncated volume data: expected {expected} bytes, found {found}")]
    Truncated {
        /// Bytes required
        expected: usize,
        /// Bytes available
        found: usize,
    },

    /// Persisted file does not start with the volume magic
    #[error("Not a volume file (magic {0:?})")]
    BadMagic([u8; 4]),

    /// Persisted file version is not understood
    #[error("Unsupported volume file version {0}")]
    UnsupportedVersion(u32),

    /// Persisted texel format tag is not understood
    #[error("Unknown texel format tag {0}")]
    UnknownFormat(u32),

    /// Manifest (de)serialization failed
    #[error("Manifest error: {0}")]
    Manifest(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
