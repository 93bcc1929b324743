//! Surface shading inputs sampled into meta buffers

use std::sync::Arc;

use crate::foundation::math::{Vec2, Vec3, Vec4};
use crate::scene::Texture2D;

/// Diffuse material as seen by the baker
///
/// Only the terms that influence diffuse light transport are kept: albedo
/// (with alpha), and emission.
#[derive(Debug, Clone)]
pub struct Material {
    /// Base color, alpha is coverage
    pub albedo: Vec4,
    /// Optional albedo texture sampled at UV1, multiplied with `albedo`
    pub albedo_texture: Option<Arc<Texture2D>>,
    /// Emission color
    pub emission: Vec3,
    /// Emission strength multiplier
    pub emission_intensity: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            albedo: Vec4::new(0.8, 0.8, 0.8, 1.0),
            albedo_texture: None,
            emission: Vec3::zeros(),
            emission_intensity: 0.0,
        }
    }
}

impl Material {
    /// Opaque material with a flat color
    pub fn diffuse(color: Vec3) -> Self {
        Self {
            albedo: color.push(1.0),
            ..Self::default()
        }
    }

    /// Builder: set emission
    pub fn with_emission(mut self, color: Vec3, intensity: f32) -> Self {
        self.emission = color;
        self.emission_intensity = intensity;
        self
    }

    /// Builder: set the albedo texture
    pub fn with_albedo_texture(mut self, texture: Arc<Texture2D>) -> Self {
        self.albedo_texture = Some(texture);
        self
    }

    /// Albedo at a lightmap UV
    pub fn albedo_at(&self, uv: &Vec2) -> Vec4 {
        match &self.albedo_texture {
            Some(texture) => self.albedo.component_mul(&texture.sample(uv)),
            None => self.albedo,
        }
    }

    /// Emitted radiance
    pub fn emissive(&self) -> Vec3 {
        self.emission * self.emission_intensity
    }

    /// Whether the material emits any light
    pub fn is_emissive(&self) -> bool {
        self.emissive().iter().any(|c| *c > 0.0)
    }
}
