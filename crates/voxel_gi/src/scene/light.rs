//! Scene light sources

use crate::foundation::math::{Vec2, Vec3};

/// Geometry of a light source
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightKind {
    /// Infinitely distant light (like sunlight)
    Directional {
        /// Direction the light travels
        direction: Vec3,
    },
    /// Omnidirectional light with a hard range cutoff
    Point {
        /// World position
        position: Vec3,
        /// Maximum distance reached
        range: f32,
    },
    /// Cone light
    Spot {
        /// World position
        position: Vec3,
        /// Cone axis, the direction the light travels
        direction: Vec3,
        /// Maximum distance reached
        range: f32,
        /// Full cone angle in degrees
        angle: f32,
    },
    /// One-sided rectangular emitter
    Area {
        /// Rectangle center
        position: Vec3,
        /// Emission direction (rectangle normal)
        forward: Vec3,
        /// Approximate up vector of the rectangle
        up: Vec3,
        /// Width and height of the rectangle
        size: Vec2,
        /// Maximum distance reached
        range: f32,
    },
}

/// Light source in display-space color with a scalar intensity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneLight {
    /// Geometry
    pub kind: LightKind,
    /// Display-space color
    pub color: Vec3,
    /// Scalar intensity
    pub intensity: f32,
    /// Disabled lights are ignored by the encoder
    pub enabled: bool,
}

impl SceneLight {
    fn new(kind: LightKind, color: Vec3, intensity: f32) -> Self {
        Self {
            kind,
            color,
            intensity,
            enabled: true,
        }
    }

    /// Create a directional light
    pub fn directional(direction: Vec3, color: Vec3, intensity: f32) -> Self {
        Self::new(
            LightKind::Directional {
                direction: direction.normalize(),
            },
            color,
            intensity,
        )
    }

    /// Create a point light
    pub fn point(position: Vec3, color: Vec3, intensity: f32, range: f32) -> Self {
        Self::new(LightKind::Point { position, range }, color, intensity)
    }

    /// Create a spot light with a full cone angle in degrees
    pub fn spot(position: Vec3, direction: Vec3, color: Vec3, intensity: f32, range: f32, angle: f32) -> Self {
        Self::new(
            LightKind::Spot {
                position,
                direction: direction.normalize(),
                range,
                angle,
            },
            color,
            intensity,
        )
    }

    /// Create a rectangular area light
    pub fn area(
        position: Vec3,
        forward: Vec3,
        up: Vec3,
        size: Vec2,
        color: Vec3,
        intensity: f32,
        range: f32,
    ) -> Self {
        Self::new(
            LightKind::Area {
                position,
                forward: forward.normalize(),
                up: up.normalize(),
                size,
                range,
            },
            color,
            intensity,
        )
    }

    /// Builder: enable or disable the light
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Short type name for logs
    pub fn type_name(&self) -> &'static str {
        match self.kind {
            LightKind::Directional { .. } => "directional",
            LightKind::Point { .. } => "point",
            LightKind::Spot { .. } => "spot",
            LightKind::Area { .. } => "area",
        }
    }
}
