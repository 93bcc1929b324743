//! # Core Baker Module
//!
//! Shared error types and the bake settings that every stage reads.
//!
//! ## Organization
//!
//! - **Error**: the bake error taxonomy and stage names
//! - **Config**: `BakeSettings` and its groups, loadable from TOML or RON

pub mod config;
pub mod error;

pub use config::{
    BakeSettings, CombineMode, CombineSettings, DeviceSettings, LightingSettings, OutputSettings,
    VolumeSettings, VoxelizeSettings,
};
pub use error::{BakeError, BakeResult, BakeStage};
