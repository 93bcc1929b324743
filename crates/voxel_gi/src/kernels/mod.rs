//! # Bake Kernels
//!
//! The compute programs dispatched by the bake pipeline, each registered
//! under a fixed name in the [`KernelLibrary`].
//!
//! | kernel                  | reads                                         |
//! |-------------------------|-----------------------------------------------|
//! | `VoxelizeSlice`         | captured slice                                |
//! | `DirectSurface`         | `SceneAlbedo`, `SceneNormal`, `SceneEmissive` |
//! | `DirectVolumetric`      | `SceneAlbedo`                                 |
//! | `BounceSurface`         | `SceneAlbedo`, `SceneNormal`, `Seed`          |
//! | `BounceVolumetric`      | `SceneAlbedo`, `Seed`                         |
//! | `EnvironmentSurface`    | `SceneAlbedo`, `SceneNormal`, environment     |
//! | `EnvironmentVolumetric` | `SceneAlbedo`, environment                    |
//! | `CombineAdd`            | `InputA`, `InputB`                            |
//! | `CombineAverage`        | `InputA`, `InputB`                            |
//! | `GaussianBlur1D`        | `InputA`                                      |

mod bounce;
mod combine;
mod direct;
mod environment;
pub mod march;
pub mod sampling;
mod voxelize;

use std::sync::Arc;

use crate::compute::KernelLibrary;

pub use bounce::{BounceSurfaceKernel, BounceVolumetricKernel};
pub use combine::{gaussian_weights, CombineAddKernel, CombineAverageKernel, GaussianBlurKernel};
pub use direct::{DirectSurfaceKernel, DirectVolumetricKernel};
pub use environment::{EnvironmentSurfaceKernel, EnvironmentVolumetricKernel};
pub use voxelize::VoxelizeSliceKernel;

/// Slice to volume write
pub const VOXELIZE_SLICE: &str = "VoxelizeSlice";
/// Direct light on surfaces
pub const DIRECT_SURFACE: &str = "DirectSurface";
/// Direct light everywhere
pub const DIRECT_VOLUMETRIC: &str = "DirectVolumetric";
/// One bounce sample on surfaces
pub const BOUNCE_SURFACE: &str = "BounceSurface";
/// One bounce sample everywhere
pub const BOUNCE_VOLUMETRIC: &str = "BounceVolumetric";
/// One sky sample on surfaces
pub const ENVIRONMENT_SURFACE: &str = "EnvironmentSurface";
/// One sky sample everywhere
pub const ENVIRONMENT_VOLUMETRIC: &str = "EnvironmentVolumetric";
/// Elementwise sum
pub const COMBINE_ADD: &str = "CombineAdd";
/// Elementwise mean
pub const COMBINE_AVERAGE: &str = "CombineAverage";
/// One axis of the separable blur
pub const GAUSSIAN_BLUR: &str = "GaussianBlur1D";

/// Every built-in kernel name
pub const ALL: [&str; 10] = [
    VOXELIZE_SLICE,
    DIRECT_SURFACE,
    DIRECT_VOLUMETRIC,
    BOUNCE_SURFACE,
    BOUNCE_VOLUMETRIC,
    ENVIRONMENT_SURFACE,
    ENVIRONMENT_VOLUMETRIC,
    COMBINE_ADD,
    COMBINE_AVERAGE,
    GAUSSIAN_BLUR,
];

/// Register every built-in kernel
pub fn register_builtin(library: &mut KernelLibrary) {
    library
        .register(Arc::new(VoxelizeSliceKernel))
        .register(Arc::new(DirectSurfaceKernel))
        .register(Arc::new(DirectVolumetricKernel))
        .register(Arc::new(BounceSurfaceKernel))
        .register(Arc::new(BounceVolumetricKernel))
        .register(Arc::new(EnvironmentSurfaceKernel))
        .register(Arc::new(EnvironmentVolumetricKernel))
        .register(Arc::new(CombineAddKernel))
        .register(Arc::new(CombineAverageKernel))
        .register(Arc::new(GaussianBlurKernel));
}
