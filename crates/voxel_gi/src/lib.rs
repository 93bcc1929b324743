//! # Voxel GI
//!
//! Voxelization and progressive light baking of static global illumination
//! into 3D volumes.
//!
//! ## Features
//!
//! - **Six-Axis Voxelization**: orthographic slab capture into albedo, normal and emissive volumes
//! - **Light Encoding**: fixed-layout light records shared with the solver kernels
//! - **Direct, Bounce and Environment Light**: per-voxel solves on a throttled compute device
//! - **Buffer Combination**: add, average and separable Gaussian blur passes
//! - **Persistence**: half-float volume files indexed by a RON manifest
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use voxel_gi::prelude::*;
//!
//! fn main() -> Result<(), BakeError> {
//!     let mut scene = Scene::new();
//!     scene.add_light(SceneLight::directional(-Vec3::y(), Vec3::repeat(1.0), 1.0));
//!
//!     let settings = BakeSettings::load_or_default("bake.toml")?;
//!     let mut pipeline = BakePipeline::new(settings)?;
//!     let manifest = pipeline.run(&scene, &SurfaceMetaProvider::default())?;
//!     println!("Baked {}", manifest.display());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

// Baker core
pub mod core;

pub mod foundation;
pub mod config;
pub mod volume;
pub mod scene;
pub mod meta;
pub mod capture;
pub mod compute;
pub mod lighting;
pub mod kernels;
pub mod bake;

/// Common imports for baker users
pub mod prelude {
    pub use crate::{
        bake::{BakeObserver, BakePipeline, LogObserver, NullObserver},
        config::Config,
        core::{BakeError, BakeResult, BakeSettings, BakeStage, CombineMode},
        foundation::math::{Transform, UVec3, Vec3, Vec4},
        meta::{MetaBufferProvider, SurfaceMetaProvider},
        scene::{EnvironmentMap, Material, Mesh, Renderable, Scene, SceneLight},
        volume::{BakeManifest, Volume, VolumeGrid, VolumeRole},
    };
}
