//! Scene model consumed by the baker
//!
//! A [`Scene`] is a flat list of renderables (mesh + material + transform),
//! light sources and an optional environment map. Nothing here is specific
//! to a host editor; scenes are built in code or loaded from a description
//! file by the command-line baker.

mod environment;
mod light;
mod material;
mod mesh;
pub mod obj;
mod texture;

pub use environment::{CubeFace, EnvironmentMap};
pub use light::{LightKind, SceneLight};
pub use material::Material;
pub use mesh::{Mesh, MeshTriangle};
pub use texture::Texture2D;

use std::sync::Arc;

use crate::foundation::math::{Aabb, Transform};

/// Errors raised while building or loading scene content
#[derive(thiserror::Error, Debug)]
pub enum SceneError {
    /// Mesh attribute counts or indices are inconsistent
    #[error("Invalid mesh: {0}")]
    InvalidMesh(String),

    /// Texture data could not be decoded or has the wrong size
    #[error("Invalid texture: {0}")]
    InvalidTexture(String),

    /// OBJ parse failure
    #[error("OBJ parse error at line {line}: {message}")]
    Obj {
        /// 1-based line number
        line: usize,
        /// What went wrong
        message: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One drawable object: geometry, shading inputs and placement
#[derive(Debug, Clone)]
pub struct Renderable {
    /// Display name used in logs
    pub name: String,
    /// Shared geometry
    pub mesh: Arc<Mesh>,
    /// Shading inputs
    pub material: Material,
    /// Object-to-world transform
    pub transform: Transform,
    /// Disabled renderables are skipped by every stage
    pub enabled: bool,
}

impl Renderable {
    /// Create an enabled renderable
    pub fn new(name: impl Into<String>, mesh: Arc<Mesh>, material: Material, transform: Transform) -> Self {
        Self {
            name: name.into(),
            mesh,
            material,
            transform,
            enabled: true,
        }
    }

    /// World-space bounds
    pub fn world_bounds(&self) -> Option<Aabb> {
        self.mesh.bounds().map(|b| b.transformed(&self.transform))
    }
}

/// Everything the baker reads from the world
#[derive(Debug, Clone, Default)]
pub struct Scene {
    /// Drawable objects
    pub renderables: Vec<Renderable>,
    /// Light sources
    pub lights: Vec<SceneLight>,
    /// Sky / ambient lighting, if any
    pub environment: Option<EnvironmentMap>,
}

impl Scene {
    /// Create an empty scene
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a renderable
    pub fn add_renderable(&mut self, renderable: Renderable) -> &mut Self {
        self.renderables.push(renderable);
        self
    }

    /// Add a light
    pub fn add_light(&mut self, light: SceneLight) -> &mut Self {
        self.lights.push(light);
        self
    }

    /// Set the environment map
    pub fn set_environment(&mut self, environment: EnvironmentMap) -> &mut Self {
        self.environment = Some(environment);
        self
    }

    /// Enabled renderables
    pub fn active_renderables(&self) -> impl Iterator<Item = &Renderable> {
        self.renderables.iter().filter(|r| r.enabled)
    }

    /// Enabled lights
    pub fn active_lights(&self) -> impl Iterator<Item = &SceneLight> {
        self.lights.iter().filter(|l| l.enabled)
    }

    /// Union of the world bounds of every enabled renderable
    pub fn bounds(&self) -> Option<Aabb> {
        self.active_renderables()
            .filter_map(Renderable::world_bounds)
            .reduce(|a, b| Aabb::new(a.min.inf(&b.min), a.max.sup(&b.max)))
    }
}
