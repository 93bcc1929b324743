//! Environment cubemap used for sky / ambient light

use std::path::Path;

use image::Rgb32FImage;

use crate::foundation::math::{constants, Vec3};
use crate::scene::SceneError;

/// Cubemap face, in storage order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CubeFace {
    /// +X
    PositiveX = 0,
    /// -X
    NegativeX = 1,
    /// +Y
    PositiveY = 2,
    /// -Y
    NegativeY = 3,
    /// +Z
    PositiveZ = 4,
    /// -Z
    NegativeZ = 5,
}

impl CubeFace {
    /// Faces in storage order
    pub const ALL: [Self; 6] = [
        Self::PositiveX,
        Self::NegativeX,
        Self::PositiveY,
        Self::NegativeY,
        Self::PositiveZ,
        Self::NegativeZ,
    ];
}

/// HDR linear RGB cubemap
///
/// Face texel `(x, y)` of a `size`-wide face looks along
/// [`EnvironmentMap::texel_direction`]; [`EnvironmentMap::sample`] is its
/// inverse with nearest filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentMap {
    size: u32,
    faces: [Vec<Vec3>; 6],
}

impl EnvironmentMap {
    /// Build from six square faces of `size * size` texels each
    pub fn from_faces(size: u32, faces: [Vec<Vec3>; 6]) -> Result<Self, SceneError> {
        let expected = (size * size) as usize;
        if size == 0 || faces.iter().any(|f| f.len() != expected) {
            return Err(SceneError::InvalidTexture(format!(
                "cubemap faces must hold {size}x{size} texels"
            )));
        }
        Ok(Self { size, faces })
    }

    /// Constant radiance in every direction
    pub fn uniform(color: Vec3) -> Self {
        Self {
            size: 1,
            faces: std::array::from_fn(|_| vec![color]),
        }
    }

    /// Vertical sky gradient: `sky` straight up, `horizon` at the horizon,
    /// `ground` straight down
    pub fn gradient(size: u32, sky: Vec3, horizon: Vec3, ground: Vec3) -> Self {
        Self::from_fn(size.max(1), |dir| {
            if dir.y >= 0.0 {
                horizon.lerp(&sky, dir.y)
            } else {
                horizon.lerp(&ground, -dir.y)
            }
        })
    }

    /// Build by evaluating a function of direction at every texel center
    pub fn from_fn(size: u32, f: impl Fn(&Vec3) -> Vec3) -> Self {
        let faces = std::array::from_fn(|face| {
            (0..size * size)
                .map(|i| f(&texel_direction(face, i % size, i / size, size)))
                .collect()
        });
        Self { size, faces }
    }

    /// Resample an equirectangular (latitude/longitude) image
    pub fn from_equirect_image(image: &Rgb32FImage, face_size: u32) -> Self {
        let (width, height) = image.dimensions();
        Self::from_fn(face_size.max(1), |dir| {
            let u = dir.z.atan2(dir.x) / constants::TAU + 0.5;
            let v = dir.y.clamp(-1.0, 1.0).acos() / constants::PI;
            let x = ((u * width as f32) as u32).min(width.saturating_sub(1));
            let y = ((v * height as f32) as u32).min(height.saturating_sub(1));
            let p = image.get_pixel(x, y);
            Vec3::new(p.0[0], p.0[1], p.0[2])
        })
    }

    /// Load an equirectangular image from disk and convert it to a cubemap
    pub fn from_equirect(path: impl AsRef<Path>, face_size: u32) -> Result<Self, SceneError> {
        let path = path.as_ref();
        let img = image::open(path)
            .map_err(|e| SceneError::InvalidTexture(format!("{}: {}", path.display(), e)))?;
        let rgb = img.to_rgb32f();
        log::info!(
            "Loaded environment {}x{} from {:?}, resampling to {}px faces",
            rgb.width(),
            rgb.height(),
            path,
            face_size
        );
        Ok(Self::from_equirect_image(&rgb, face_size))
    }

    /// Face edge length in texels
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Texels of one face, row-major
    pub fn face(&self, face: CubeFace) -> &[Vec3] {
        &self.faces[face as usize]
    }

    /// Direction through the center of a face texel
    pub fn texel_direction(&self, face: CubeFace, x: u32, y: u32) -> Vec3 {
        texel_direction(face as usize, x, y, self.size)
    }

    /// Nearest-texel radiance along a direction
    pub fn sample(&self, direction: &Vec3) -> Vec3 {
        let (face, a, b) = face_coords(direction);
        let to_texel = |t: f32| {
            let texel = ((t + 1.0) * 0.5 * self.size as f32).floor();
            texel.clamp(0.0, (self.size - 1) as f32) as u32
        };
        let (x, y) = (to_texel(a), to_texel(b));
        self.faces[face][(y * self.size + x) as usize]
    }

    /// Copy with every texel multiplied by `factor`
    pub fn scaled(&self, factor: f32) -> Self {
        Self {
            size: self.size,
            faces: self.faces.clone().map(|f| f.into_iter().map(|c| c * factor).collect()),
        }
    }
}

fn texel_direction(face: usize, x: u32, y: u32, size: u32) -> Vec3 {
    let a = (2.0 * (x as f32 + 0.5) / size as f32) - 1.0;
    let b = (2.0 * (y as f32 + 0.5) / size as f32) - 1.0;
    match face {
        0 => Vec3::new(1.0, -b, -a),
        1 => Vec3::new(-1.0, -b, a),
        2 => Vec3::new(a, 1.0, b),
        3 => Vec3::new(a, -1.0, -b),
        4 => Vec3::new(a, -b, 1.0),
        _ => Vec3::new(-a, -b, -1.0),
    }
    .normalize()
}

/// Face index and face-space `(a, b)` in `[-1, 1]` for a direction
fn face_coords(d: &Vec3) -> (usize, f32, f32) {
    let abs = d.abs();
    if abs.x >= abs.y && abs.x >= abs.z {
        let m = abs.x.max(f32::EPSILON);
        if d.x >= 0.0 {
            (0, -d.z / m, -d.y / m)
        } else {
            (1, d.z / m, -d.y / m)
        }
    } else if abs.y >= abs.z {
        let m = abs.y.max(f32::EPSILON);
        if d.y >= 0.0 {
            (2, d.x / m, d.z / m)
        } else {
            (3, d.x / m, -d.z / m)
        }
    } else {
        let m = abs.z.max(f32::EPSILON);
        if d.z >= 0.0 {
            (4, d.x / m, -d.y / m)
        } else {
            (5, -d.x / m, -d.y / m)
        }
    }
}
