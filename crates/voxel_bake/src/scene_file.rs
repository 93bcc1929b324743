//! RON scene description
//!
//! ```ron
//! (
//!     objects: [
//!         (name: "floor", shape: Quad(width: 8.0, depth: 8.0), position: (0.0, -2.0, 0.0)),
//!         (name: "lamp", shape: Cuboid(half_extents: (0.5, 0.5, 0.5)), emission: (1.0, 0.9, 0.7), emission_intensity: 4.0),
//!     ],
//!     lights: [
//!         Directional(direction: (0.3, -1.0, 0.2), color: (1.0, 1.0, 1.0), intensity: 1.0),
//!     ],
//!     environment: Some(Gradient(sky: (0.3, 0.5, 0.9), horizon: (0.8, 0.8, 0.8), ground: (0.2, 0.2, 0.2))),
//! )
//! ```
//!
//! Relative paths (OBJ meshes, textures, environment images) are resolved
//! against the directory of the scene file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Deserialize;

use voxel_gi::foundation::math::{Transform, Vec2, Vec3};
use voxel_gi::scene::obj::load_obj;
use voxel_gi::scene::{EnvironmentMap, Material, Mesh, Renderable, Scene, SceneLight, Texture2D};

/// Default cubemap face size for gradient and equirect environments
const DEFAULT_FACE_SIZE: u32 = 32;

/// Geometry of one object
#[derive(Debug, Clone, Deserialize)]
pub enum ShapeDescription {
    /// Axis-aligned box
    Cuboid {
        /// Half size per axis
        half_extents: Vec3,
    },
    /// Horizontal quad facing +Y
    Quad {
        /// Extent along X
        width: f32,
        /// Extent along Z
        depth: f32,
    },
    /// Wavefront OBJ with a lightmap UV set
    Obj {
        /// Mesh file
        path: PathBuf,
    },
}

/// One renderable
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectDescription {
    /// Name used in logs
    pub name: String,
    /// Geometry
    pub shape: ShapeDescription,
    /// World position
    #[serde(default = "zero")]
    pub position: Vec3,
    /// Scale factors
    #[serde(default = "one")]
    pub scale: Vec3,
    /// Base color
    #[serde(default = "grey")]
    pub color: Vec3,
    /// Optional albedo texture (PNG)
    #[serde(default)]
    pub albedo_texture: Option<PathBuf>,
    /// Emission color
    #[serde(default = "zero")]
    pub emission: Vec3,
    /// Emission strength
    #[serde(default)]
    pub emission_intensity: f32,
    /// Disabled objects are not baked
    #[serde(default = "enabled")]
    pub enabled: bool,
}

/// One light source
#[derive(Debug, Clone, Deserialize)]
pub enum LightDescription {
    /// Sun-like light
    Directional {
        /// Direction the light travels
        direction: Vec3,
        /// Display-space color
        color: Vec3,
        /// Scalar intensity
        intensity: f32,
    },
    /// Omnidirectional light
    Point {
        /// World position
        position: Vec3,
        /// Display-space color
        color: Vec3,
        /// Scalar intensity
        intensity: f32,
        /// Maximum distance reached
        range: f32,
    },
    /// Cone light
    Spot {
        /// World position
        position: Vec3,
        /// Cone axis
        direction: Vec3,
        /// Display-space color
        color: Vec3,
        /// Scalar intensity
        intensity: f32,
        /// Maximum distance reached
        range: f32,
        /// Full cone angle in degrees
        angle: f32,
    },
    /// Rectangular emitter
    Area {
        /// Rectangle center
        position: Vec3,
        /// Emission direction
        forward: Vec3,
        /// Up vector of the rectangle
        up: Vec3,
        /// Width and height
        size: Vec2,
        /// Display-space color
        color: Vec3,
        /// Scalar intensity
        intensity: f32,
        /// Maximum distance reached
        range: f32,
    },
}

/// Sky lighting
#[derive(Debug, Clone, Deserialize)]
pub enum EnvironmentDescription {
    /// Constant radiance
    Uniform {
        /// Radiance
        color: Vec3,
    },
    /// Vertical gradient
    Gradient {
        /// Straight up
        sky: Vec3,
        /// At the horizon
        horizon: Vec3,
        /// Straight down
        ground: Vec3,
    },
    /// Equirectangular image
    Equirect {
        /// Image file
        path: PathBuf,
    },
}

/// Whole scene file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SceneDescription {
    /// Renderables
    pub objects: Vec<ObjectDescription>,
    /// Light sources
    pub lights: Vec<LightDescription>,
    /// Sky lighting
    pub environment: Option<EnvironmentDescription>,
}

fn zero() -> Vec3 {
    Vec3::zeros()
}

fn one() -> Vec3 {
    Vec3::repeat(1.0)
}

fn grey() -> Vec3 {
    Vec3::repeat(0.8)
}

const fn enabled() -> bool {
    true
}

impl SceneDescription {
    /// Parse a scene description
    pub fn from_ron(text: &str) -> Result<Self> {
        ron::from_str(text).context("Failed to parse scene description")
    }

    /// Load a scene description file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_ron(&text).with_context(|| format!("In {}", path.display()))
    }

    /// Build the scene, resolving relative paths against `base`
    pub fn build(&self, base: &Path) -> Result<Scene> {
        let mut scene = Scene::new();
        for object in &self.objects {
            scene.add_renderable(object.build(base)?);
        }
        for light in &self.lights {
            scene.add_light(light.build());
        }
        if let Some(environment) = &self.environment {
            scene.set_environment(environment.build(base)?);
        }
        log::info!(
            "Scene: {} objects, {} lights, environment: {}",
            scene.renderables.len(),
            scene.lights.len(),
            scene.environment.is_some()
        );
        Ok(scene)
    }
}

impl ObjectDescription {
    fn build(&self, base: &Path) -> Result<Renderable> {
        let mesh = match &self.shape {
            ShapeDescription::Cuboid { half_extents } => Mesh::cuboid(*half_extents),
            ShapeDescription::Quad { width, depth } => Mesh::quad(*width, *depth),
            ShapeDescription::Obj { path } => {
                let path = base.join(path);
                load_obj(&path).with_context(|| format!("Failed to load mesh {}", path.display()))?
            }
        };

        let mut material = Material::diffuse(self.color).with_emission(self.emission, self.emission_intensity);
        if let Some(texture) = &self.albedo_texture {
            let path = base.join(texture);
            let texture =
                Texture2D::load(&path).with_context(|| format!("Failed to load texture {}", path.display()))?;
            material = material.with_albedo_texture(Arc::new(texture));
        }

        let transform = Transform::from_position(self.position).with_scale(self.scale);
        let mut renderable = Renderable::new(self.name.clone(), Arc::new(mesh), material, transform);
        renderable.enabled = self.enabled;
        Ok(renderable)
    }
}

impl LightDescription {
    fn build(&self) -> SceneLight {
        match *self {
            Self::Directional {
                direction,
                color,
                intensity,
            } => SceneLight::directional(direction, color, intensity),
            Self::Point {
                position,
                color,
                intensity,
                range,
            } => SceneLight::point(position, color, intensity, range),
            Self::Spot {
                position,
                direction,
                color,
                intensity,
                range,
                angle,
            } => SceneLight::spot(position, direction, color, intensity, range, angle),
            Self::Area {
                position,
                forward,
                up,
                size,
                color,
                intensity,
                range,
            } => SceneLight::area(position, forward, up, size, color, intensity, range),
        }
    }
}

impl EnvironmentDescription {
    fn build(&self, base: &Path) -> Result<EnvironmentMap> {
        Ok(match self {
            Self::Uniform { color } => EnvironmentMap::uniform(*color),
            Self::Gradient { sky, horizon, ground } => {
                EnvironmentMap::gradient(DEFAULT_FACE_SIZE, *sky, *horizon, *ground)
            }
            Self::Equirect { path } => {
                let path = base.join(path);
                EnvironmentMap::from_equirect(&path, DEFAULT_FACE_SIZE)
                    .with_context(|| format!("Failed to load environment {}", path.display()))?
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scene_description() {
        let text = r#"(
            objects: [
                (name: "floor", shape: Quad(width: 8.0, depth: 8.0), position: (0.0, -2.0, 0.0)),
                (name: "lamp", shape: Cuboid(half_extents: (0.5, 0.5, 0.5)), emission: (1.0, 0.9, 0.7), emission_intensity: 4.0, enabled: false),
            ],
            lights: [
                Directional(direction: (0.0, -1.0, 0.0), color: (1.0, 1.0, 1.0), intensity: 2.0),
                Point(position: (0.0, 1.0, 0.0), color: (1.0, 0.5, 0.5), intensity: 1.0, range: 5.0),
            ],
            environment: Some(Uniform(color: (0.1, 0.1, 0.2))),
        )"#;
        let description = SceneDescription::from_ron(text).unwrap();
        assert_eq!(description.objects.len(), 2);
        assert_eq!(description.objects[0].scale, Vec3::repeat(1.0));

        let scene = description.build(Path::new(".")).unwrap();
        assert_eq!(scene.renderables.len(), 2);
        assert_eq!(scene.active_renderables().count(), 1);
        assert_eq!(scene.lights.len(), 2);
        assert!(scene.environment.is_some());
        assert!(scene.renderables[1].material.is_emissive());
    }

    #[test]
    fn test_empty_description_is_an_empty_scene() {
        let scene = SceneDescription::from_ron("()").unwrap().build(Path::new(".")).unwrap();
        assert!(scene.renderables.is_empty());
        assert!(scene.environment.is_none());
    }

    #[test]
    fn test_missing_mesh_reports_path() {
        let text = r#"(objects: [(name: "ghost", shape: Obj(path: "does_not_exist.obj"))])"#;
        let err = SceneDescription::from_ron(text).unwrap().build(Path::new("/nonexistent")).unwrap_err();
        assert!(format!("{err:#}").contains("does_not_exist.obj"));
    }
}
