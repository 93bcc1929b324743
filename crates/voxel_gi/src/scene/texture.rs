//! CPU-side 2D textures used for material inputs and meta buffers

use std::path::Path;

use crate::foundation::math::{Vec2, Vec4};
use crate::scene::SceneError;

/// RGBA float texture addressed by UV in `[0, 1]`
///
/// `v = 0` is the first row. Sampling is nearest-texel with clamp-to-edge
/// addressing, matching how the meta buffers are read during capture.
#[derive(Debug, Clone, PartialEq)]
pub struct Texture2D {
    width: u32,
    height: u32,
    texels: Vec<Vec4>,
}

impl Texture2D {
    /// Create a texture filled with one value
    pub fn filled(width: u32, height: u32, value: Vec4) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            width,
            height,
            texels: vec![value; (width * height) as usize],
        }
    }

    /// Single texel texture
    pub fn solid(value: Vec4) -> Self {
        Self::filled(1, 1, value)
    }

    /// Wrap row-major texel data
    pub fn from_texels(width: u32, height: u32, texels: Vec<Vec4>) -> Result<Self, SceneError> {
        if width == 0 || height == 0 || texels.len() != (width * height) as usize {
            return Err(SceneError::InvalidTexture(format!(
                "{}x{} texture with {} texels",
                width,
                height,
                texels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            texels,
        })
    }

    /// Load a PNG (or other enabled image format) as linear RGBA
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SceneError> {
        let path = path.as_ref();
        log::debug!("Loading texture from: {:?}", path);

        let img = image::open(path)
            .map_err(|e| SceneError::InvalidTexture(format!("{}: {}", path.display(), e)))?;
        let rgba = img.to_rgba32f();
        let (width, height) = rgba.dimensions();
        let texels = rgba
            .pixels()
            .map(|p| Vec4::new(p.0[0], p.0[1], p.0[2], p.0[3]))
            .collect();

        log::info!("Loaded texture {}x{} from {:?}", width, height, path);
        Self::from_texels(width, height, texels)
    }

    /// Width in texels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in texels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Texels in row-major order
    pub fn texels(&self) -> &[Vec4] {
        &self.texels
    }

    /// Read one texel
    pub fn texel(&self, x: u32, y: u32) -> Vec4 {
        self.texels[(y * self.width + x) as usize]
    }

    /// Write one texel
    pub fn set_texel(&mut self, x: u32, y: u32, value: Vec4) {
        let index = (y * self.width + x) as usize;
        self.texels[index] = value;
    }

    /// Texel containing a UV coordinate
    pub fn texel_coord(&self, uv: &Vec2) -> (u32, u32) {
        let x = (uv.x * self.width as f32).floor();
        let y = (uv.y * self.height as f32).floor();
        (
            x.clamp(0.0, (self.width - 1) as f32) as u32,
            y.clamp(0.0, (self.height - 1) as f32) as u32,
        )
    }

    /// UV of a texel center
    pub fn texel_center(&self, x: u32, y: u32) -> Vec2 {
        Vec2::new(
            (x as f32 + 0.5) / self.width as f32,
            (y as f32 + 0.5) / self.height as f32,
        )
    }

    /// Nearest-texel sample with clamped addressing
    pub fn sample(&self, uv: &Vec2) -> Vec4 {
        let (x, y) = self.texel_coord(uv);
        self.texel(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_nearest_and_clamped() {
        let texels = vec![
            Vec4::new(1.0, 0.0, 0.0, 1.0),
            Vec4::new(0.0, 1.0, 0.0, 1.0),
            Vec4::new(0.0, 0.0, 1.0, 1.0),
            Vec4::new(1.0, 1.0, 1.0, 1.0),
        ];
        let texture = Texture2D::from_texels(2, 2, texels).unwrap();
        assert_eq!(texture.sample(&Vec2::new(0.25, 0.25)).x, 1.0);
        assert_eq!(texture.sample(&Vec2::new(0.75, 0.25)).y, 1.0);
        assert_eq!(texture.sample(&Vec2::new(0.25, 0.75)).z, 1.0);
        assert_eq!(texture.sample(&Vec2::new(5.0, 5.0)), Vec4::new(1.0, 1.0, 1.0, 1.0));
        assert_eq!(texture.sample(&Vec2::new(-1.0, -1.0)).x, 1.0);
    }

    #[test]
    fn test_from_texels_validates_size() {
        assert!(Texture2D::from_texels(2, 2, vec![Vec4::zeros(); 3]).is_err());
        assert!(Texture2D::from_texels(0, 2, Vec::new()).is_err());
    }
}
