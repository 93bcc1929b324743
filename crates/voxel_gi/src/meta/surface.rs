//! Built-in meta buffer extraction on the CPU
//!
//! Every triangle is rasterized in UV1 space at texel centers. Albedo comes
//! from the material (modulated by its albedo texture), normals from the
//! interpolated vertex normals in world space, emission from the material
//! constants. Uncovered texels keep zero alpha.

use crate::foundation::math::{Vec2, Vec3, Vec4};
use crate::meta::{MetaBufferProvider, ObjectMetaBuffer};
use crate::scene::{MeshTriangle, Renderable, Texture2D};

/// Default meta texture edge length
pub const DEFAULT_META_RESOLUTION: u32 = 64;

/// CPU meta buffer extractor
#[derive(Debug, Clone, Copy)]
pub struct SurfaceMetaProvider {
    resolution: u32,
}

impl Default for SurfaceMetaProvider {
    fn default() -> Self {
        Self::new(DEFAULT_META_RESOLUTION)
    }
}

impl SurfaceMetaProvider {
    /// Provider producing `resolution * resolution` textures
    pub fn new(resolution: u32) -> Self {
        Self {
            resolution: resolution.max(1),
        }
    }

    /// Meta texture edge length
    pub fn resolution(&self) -> u32 {
        self.resolution
    }
}

impl MetaBufferProvider for SurfaceMetaProvider {
    fn extract(&self, renderable: &Renderable) -> Option<ObjectMetaBuffer> {
        if !renderable.enabled {
            return None;
        }
        let mesh = &renderable.mesh;
        if !mesh.has_uv1() {
            log::debug!("'{}' has no UV1 set, skipping meta extraction", renderable.name);
            return None;
        }
        let bounds = renderable.world_bounds()?;

        let size = self.resolution;
        let mut albedo = Texture2D::filled(size, size, Vec4::zeros());
        let mut normal = Texture2D::filled(size, size, Vec4::zeros());
        let mut emissive = Texture2D::filled(size, size, Vec4::zeros());
        let emission = renderable.material.emissive().push(1.0);

        let mut covered = 0usize;
        for tri in mesh.triangles() {
            let world_normals = tri.normals.map(|n| renderable.transform.transform_normal(&n));
            covered += rasterize_uv(&tri, size, |x, y, uv, bary| {
                let n = world_normals[0] * bary.x + world_normals[1] * bary.y + world_normals[2] * bary.z;
                let n = n.try_normalize(f32::EPSILON).map_or_else(Vec4::zeros, |n| n.push(1.0));
                albedo.set_texel(x, y, renderable.material.albedo_at(uv));
                normal.set_texel(x, y, n);
                emissive.set_texel(x, y, emission);
            });
        }

        if covered == 0 {
            log::warn!("'{}' covers no meta texels at {}px", renderable.name, size);
            return None;
        }

        log::debug!("Extracted meta buffers for '{}' ({} texels)", renderable.name, covered);
        Some(ObjectMetaBuffer {
            name: renderable.name.clone(),
            albedo,
            normal,
            emissive,
            mesh: mesh.clone(),
            transform: renderable.transform,
            bounds,
        })
    }
}

/// Visit every texel whose center lies inside the UV1 triangle
///
/// Returns the number of texels visited.
fn rasterize_uv(tri: &MeshTriangle, size: u32, mut visit: impl FnMut(u32, u32, &Vec2, &Vec3)) -> usize {
    let [a, b, c] = tri.uv1;
    let area = edge(&a, &b, &c);
    if area.abs() <= f32::EPSILON {
        return 0;
    }

    let scale = size as f32;
    let min = a.inf(&b).inf(&c) * scale;
    let max = a.sup(&b).sup(&c) * scale;
    let x0 = (min.x.floor().max(0.0)) as u32;
    let y0 = (min.y.floor().max(0.0)) as u32;
    let x1 = (max.x.ceil() as u32).min(size);
    let y1 = (max.y.ceil() as u32).min(size);

    let mut count = 0;
    for y in y0..y1 {
        for x in x0..x1 {
            let p = Vec2::new((x as f32 + 0.5) / scale, (y as f32 + 0.5) / scale);
            let bary = Vec3::new(edge(&b, &c, &p), edge(&c, &a, &p), edge(&a, &b, &p)) / area;
            if bary.iter().all(|w| *w >= 0.0) {
                visit(x, y, &p, &bary);
                count += 1;
            }
        }
    }
    count
}

fn edge(a: &Vec2, b: &Vec2, p: &Vec2) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}
