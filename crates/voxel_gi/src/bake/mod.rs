//! # Bake Stages
//!
//! The light baking pipeline: six-axis voxelization, direct, environment and
//! bounce light solves, buffer combination and persistence. Every stage
//! dispatches its kernels through one shared [`BakeContext`], so the dispatch
//! throttle and the kernel library are the same for the whole bake.
//!
//! ## Organization
//!
//! - **Context**: device, throttle, kernel library and progress observer
//! - **Voxelizer**: scene capture into albedo, normal and emissive volumes
//! - **Direct / Environment / Bounce**: the light solvers
//! - **Combinator**: add, average and blur passes
//! - **Output**: volume files and the manifest
//! - **Pipeline**: stage driver tying it all together

mod bounce;
mod combinator;
mod context;
mod direct;
mod environment;
mod observer;
mod output;
mod pipeline;
mod voxelizer;

#[cfg(test)]
mod tests;

pub use bounce::{BounceLight, BounceLightSolver};
pub use combinator::BufferCombinator;
pub use context::BakeContext;
pub use direct::{DirectLight, DirectLightSolver};
pub use environment::{EnvironmentLight, EnvironmentLightSolver};
pub use observer::{BakeObserver, LogObserver, NullObserver};
pub use output::VolumeWriter;
pub use pipeline::{BakePipeline, CombinedLight};
pub use voxelizer::{SceneVolumes, SceneVoxelizer};

use rand::rngs::StdRng;
use rand::SeedableRng;

/// Random seed stream of one kernel
///
/// The stream name is hashed (FNV-1a) into the bake seed so that every
/// kernel draws an independent, reproducible sequence.
pub(crate) fn sample_seeds(seed: u64, stream: &str) -> StdRng {
    let hash = stream
        .bytes()
        .fold(0xcbf2_9ce4_8422_2325_u64, |h, b| (h ^ u64::from(b)).wrapping_mul(0x0100_0000_01b3));
    StdRng::seed_from_u64(seed ^ hash)
}
