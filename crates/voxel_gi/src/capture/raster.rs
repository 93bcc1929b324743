//! Orthographic slice rendering of meta-buffered geometry

use crate::capture::CaptureAxis;
use crate::foundation::math::{Vec2, Vec3, Vec4};
use crate::meta::ObjectMetaBuffer;
use crate::volume::VolumeGrid;

/// Below this capture-space area a triangle is edge-on and skipped
const DEGENERATE_AREA: f32 = 1e-8;

/// One rendered slab of the scene
///
/// Pixels hold the closest fragment inside the slab. `albedo.w == 0` marks a
/// pixel without a fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct SliceBuffer {
    width: u32,
    height: u32,
    /// Albedo, alpha is coverage
    pub albedo: Vec<Vec4>,
    /// World-space normal, alpha 1
    pub normal: Vec<Vec4>,
    /// Emission, alpha 1
    pub emissive: Vec<Vec4>,
    depth: Vec<f32>,
}

impl SliceBuffer {
    /// Empty slice
    pub fn new(width: u32, height: u32) -> Self {
        let count = (width * height) as usize;
        Self {
            width,
            height,
            albedo: vec![Vec4::zeros(); count],
            normal: vec![Vec4::zeros(); count],
            emissive: vec![Vec4::zeros(); count],
            depth: vec![f32::INFINITY; count],
        }
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Reset every pixel to empty
    pub fn clear(&mut self) {
        self.albedo.fill(Vec4::zeros());
        self.normal.fill(Vec4::zeros());
        self.emissive.fill(Vec4::zeros());
        self.depth.fill(f32::INFINITY);
    }

    /// Whether pixel `index` holds a fragment
    pub fn is_covered(&self, index: usize) -> bool {
        self.albedo[index].w > 0.0
    }

    /// Pixels holding a fragment
    pub fn covered_count(&self) -> usize {
        (0..self.albedo.len()).filter(|i| self.is_covered(*i)).count()
    }
}

/// A world triangle projected into capture space with its shading inputs
#[derive(Debug, Clone, Copy)]
struct CaptureTriangle<'m> {
    points: [Vec3; 3],
    uv1: [Vec2; 3],
    geometric_normal: Vec3,
    min_depth: f32,
    max_depth: f32,
    meta: &'m ObjectMetaBuffer,
}

/// Renders depth slabs of a set of meta buffers along one capture axis
pub struct SliceRasterizer<'m> {
    axis: CaptureAxis,
    width: u32,
    height: u32,
    triangles: Vec<CaptureTriangle<'m>>,
}

impl<'m> SliceRasterizer<'m> {
    /// Project every triangle of `metas` for `axis`
    pub fn new(axis: CaptureAxis, grid: &VolumeGrid, metas: &'m [ObjectMetaBuffer]) -> Self {
        let (width, height) = axis.slice_size(&grid.resolution);
        let mut triangles = Vec::new();

        for meta in metas {
            for tri in meta.mesh.triangles() {
                let world = tri.transformed(&meta.transform);
                let points = world
                    .positions
                    .map(|p| axis.to_capture_space(&grid.world_to_voxel_space(&p), &grid.resolution));
                let area = cross2(&(points[1] - points[0]), &(points[2] - points[0]));
                if area.abs() <= DEGENERATE_AREA {
                    continue;
                }
                let Some(geometric_normal) = world.face_normal().try_normalize(f32::EPSILON) else {
                    continue;
                };
                let depths = points.map(|p| p.z);
                triangles.push(CaptureTriangle {
                    points,
                    uv1: tri.uv1,
                    geometric_normal,
                    min_depth: depths.iter().copied().fold(f32::INFINITY, f32::min),
                    max_depth: depths.iter().copied().fold(f32::NEG_INFINITY, f32::max),
                    meta,
                });
            }
        }

        log::debug!("{:?}: {} capturable triangles", axis, triangles.len());
        Self {
            axis,
            width,
            height,
            triangles,
        }
    }

    /// Capture axis
    pub fn axis(&self) -> CaptureAxis {
        self.axis
    }

    /// Empty slice sized for this axis
    pub fn new_slice(&self) -> SliceBuffer {
        SliceBuffer::new(self.width, self.height)
    }

    /// Render depth layer `layer` (capture depth `[layer, layer + 1)`)
    pub fn render(&self, layer: u32, slice: &mut SliceBuffer) {
        slice.clear();
        let near = layer as f32;
        let far = near + 1.0;

        for tri in &self.triangles {
            if tri.max_depth < near || tri.min_depth >= far {
                continue;
            }
            self.rasterize(tri, near, far, slice);
        }
    }

    fn rasterize(&self, tri: &CaptureTriangle<'_>, near: f32, far: f32, slice: &mut SliceBuffer) {
        let [a, b, c] = tri.points;
        let area = cross2(&(b - a), &(c - a));

        let min_u = a.x.min(b.x).min(c.x).floor().max(0.0) as u32;
        let min_v = a.y.min(b.y).min(c.y).floor().max(0.0) as u32;
        let max_u = (a.x.max(b.x).max(c.x).ceil().max(0.0) as u32).min(self.width);
        let max_v = (a.y.max(b.y).max(c.y).ceil().max(0.0) as u32).min(self.height);

        for v in min_v..max_v {
            for u in min_u..max_u {
                let p = Vec3::new(u as f32 + 0.5, v as f32 + 0.5, 0.0);
                let w = Vec3::new(
                    cross2(&(c - b), &(p - b)),
                    cross2(&(a - c), &(p - c)),
                    cross2(&(b - a), &(p - a)),
                ) / area;
                if w.iter().any(|x| *x < 0.0) {
                    continue;
                }

                let depth = w.x * a.z + w.y * b.z + w.z * c.z;
                let index = (v * self.width + u) as usize;
                if depth < near || depth >= far || depth >= slice.depth[index] {
                    continue;
                }

                let uv = tri.uv1[0] * w.x + tri.uv1[1] * w.y + tri.uv1[2] * w.z;
                let albedo = tri.meta.albedo.sample(&uv);
                if albedo.w <= 0.0 {
                    continue;
                }
                let sampled_normal = tri.meta.normal.sample(&uv);
                let normal = if sampled_normal.w > 0.0 {
                    sampled_normal.xyz().try_normalize(f32::EPSILON).unwrap_or(tri.geometric_normal)
                } else {
                    tri.geometric_normal
                };
                let emissive = tri.meta.emissive.sample(&uv);

                slice.depth[index] = depth;
                slice.albedo[index] = albedo;
                slice.normal[index] = normal.push(1.0);
                slice.emissive[index] = Vec4::new(emissive.x, emissive.y, emissive.z, 1.0);
            }
        }
    }
}

fn cross2(a: &Vec3, b: &Vec3) -> f32 {
    a.x * b.y - a.y * b.x
}
