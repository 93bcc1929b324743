//! Per-object meta buffers
//!
//! A meta buffer is a set of 2D textures unwrapped into a mesh's lightmap UV
//! space (UV1) that hold the shading inputs the voxelizer needs: albedo,
//! world-space normal and emission. Extraction is a collaborator of the
//! baker: anything implementing [`MetaBufferProvider`] can feed the
//! voxelizer, and [`SurfaceMetaProvider`] is the built-in CPU extractor.

mod surface;

pub use surface::{SurfaceMetaProvider, DEFAULT_META_RESOLUTION};

use std::sync::Arc;

use crate::foundation::math::{Aabb, Transform};
use crate::scene::{Mesh, Renderable, Texture2D};

/// Shading inputs of one renderable, unwrapped into UV1 space
///
/// Lives for one voxelization run and is dropped once the six-axis capture
/// completes.
#[derive(Debug, Clone)]
pub struct ObjectMetaBuffer {
    /// Renderable name, for logs
    pub name: String,
    /// Albedo, alpha is coverage
    pub albedo: Texture2D,
    /// World-space normal in RGB, alpha is 1 where the texel is valid
    pub normal: Texture2D,
    /// Emitted radiance in RGB
    pub emissive: Texture2D,
    /// Geometry the buffers were unwrapped from
    pub mesh: Arc<Mesh>,
    /// Object-to-world transform
    pub transform: Transform,
    /// World-space bounds
    pub bounds: Aabb,
}

/// Source of meta buffers for renderables
pub trait MetaBufferProvider {
    /// Extract the meta buffers of a renderable
    ///
    /// `None` means the object has nothing to contribute (no UV1 set, no
    /// usable geometry, ...). The voxelizer skips it silently.
    fn extract(&self, renderable: &Renderable) -> Option<ObjectMetaBuffer>;
}
