//! Triangle meshes with a secondary (lightmap) UV set

use crate::foundation::math::{Aabb, Transform, Vec2, Vec3};
use crate::scene::SceneError;

/// Padding left around each face of the primitive UV1 atlases, in cell units
const ATLAS_MARGIN: f32 = 0.02;

/// Indexed triangle mesh
///
/// `uv1` is the lightmap UV set that meta buffers are unwrapped into. Meshes
/// without it cannot produce meta buffers and contribute nothing to a bake.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    /// Object-space vertex positions
    pub positions: Vec<Vec3>,
    /// Object-space vertex normals
    pub normals: Vec<Vec3>,
    /// Lightmap UVs, one per vertex
    pub uv1: Option<Vec<Vec2>>,
    /// Triangle list indices
    pub indices: Vec<u32>,
}

/// One triangle with its vertex attributes resolved
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshTriangle {
    /// Vertex positions
    pub positions: [Vec3; 3],
    /// Vertex normals
    pub normals: [Vec3; 3],
    /// Vertex lightmap UVs (zero when the mesh has none)
    pub uv1: [Vec2; 3],
}

impl MeshTriangle {
    /// Unnormalised geometric normal (`(b - a) x (c - a)`)
    pub fn face_normal(&self) -> Vec3 {
        let [a, b, c] = self.positions;
        (b - a).cross(&(c - a))
    }

    /// Apply an object-to-world transform
    pub fn transformed(&self, transform: &Transform) -> Self {
        Self {
            positions: self.positions.map(|p| transform.transform_point(&p)),
            normals: self.normals.map(|n| transform.transform_normal(&n)),
            uv1: self.uv1,
        }
    }
}

impl Mesh {
    /// Create a mesh, validating attribute counts and indices
    pub fn new(
        positions: Vec<Vec3>,
        normals: Vec<Vec3>,
        uv1: Option<Vec<Vec2>>,
        indices: Vec<u32>,
    ) -> Result<Self, SceneError> {
        let mesh = Self {
            positions,
            normals,
            uv1,
            indices,
        };
        mesh.validate()?;
        Ok(mesh)
    }

    /// Check attribute counts and index bounds
    pub fn validate(&self) -> Result<(), SceneError> {
        let count = self.positions.len();
        if self.normals.len() != count {
            return Err(SceneError::InvalidMesh(format!(
                "{} normals for {} positions",
                self.normals.len(),
                count
            )));
        }
        if let Some(uv1) = &self.uv1 {
            if uv1.len() != count {
                return Err(SceneError::InvalidMesh(format!(
                    "{} uv1 coordinates for {} positions",
                    uv1.len(),
                    count
                )));
            }
        }
        if self.indices.len() % 3 != 0 {
            return Err(SceneError::InvalidMesh(format!(
                "index count {} is not a multiple of 3",
                self.indices.len()
            )));
        }
        if let Some(bad) = self.indices.iter().find(|i| **i as usize >= count) {
            return Err(SceneError::InvalidMesh(format!(
                "index {bad} out of bounds for {count} vertices"
            )));
        }
        Ok(())
    }

    /// Whether the mesh carries lightmap UVs
    pub fn has_uv1(&self) -> bool {
        self.uv1.is_some()
    }

    /// Number of triangles
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Iterate triangles with resolved attributes
    pub fn triangles(&self) -> impl Iterator<Item = MeshTriangle> + '_ {
        self.indices.chunks_exact(3).map(move |tri| {
            let idx = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let uv1 = self
                .uv1
                .as_ref()
                .map_or([Vec2::zeros(); 3], |uv| idx.map(|i| uv[i]));
            MeshTriangle {
                positions: idx.map(|i| self.positions[i]),
                normals: idx.map(|i| self.normals[i]),
                uv1,
            }
        })
    }

    /// Object-space bounds
    pub fn bounds(&self) -> Option<Aabb> {
        Aabb::from_points(self.positions.iter())
    }

    /// Axis-aligned box centered at the origin
    ///
    /// UV1 is a 3x2 atlas with one non-overlapping cell per face, ordered
    /// `+X, -X, +Y, -Y, +Z, -Z`.
    pub fn cuboid(half_extents: Vec3) -> Self {
        // (normal, u axis, v axis) with u x v == normal
        let faces = [
            (Vec3::x(), -Vec3::z(), Vec3::y()),
            (-Vec3::x(), Vec3::z(), Vec3::y()),
            (Vec3::y(), Vec3::x(), -Vec3::z()),
            (-Vec3::y(), Vec3::x(), Vec3::z()),
            (Vec3::z(), Vec3::x(), Vec3::y()),
            (-Vec3::z(), -Vec3::x(), Vec3::y()),
        ];

        let mut positions = Vec::with_capacity(24);
        let mut normals = Vec::with_capacity(24);
        let mut uv1 = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);

        for (face, (normal, u_axis, v_axis)) in faces.iter().enumerate() {
            let cell = Vec2::new((face % 3) as f32 / 3.0, (face / 3) as f32 / 2.0);
            let cell_size = Vec2::new(1.0 / 3.0, 1.0 / 2.0);
            let base = positions.len() as u32;

            for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                let corner = normal + u_axis * su + v_axis * sv;
                positions.push(corner.component_mul(&half_extents));
                normals.push(*normal);

                let local = Vec2::new(
                    ATLAS_MARGIN + (su + 1.0) * 0.5 * (1.0 - 2.0 * ATLAS_MARGIN),
                    ATLAS_MARGIN + (sv + 1.0) * 0.5 * (1.0 - 2.0 * ATLAS_MARGIN),
                );
                uv1.push(cell + local.component_mul(&cell_size));
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        Self {
            positions,
            normals,
            uv1: Some(uv1),
            indices,
        }
    }

    /// Horizontal quad in the XZ plane facing +Y, centered at the origin
    pub fn quad(width: f32, depth: f32) -> Self {
        let hx = width * 0.5;
        let hz = depth * 0.5;
        let positions = vec![
            Vec3::new(-hx, 0.0, hz),
            Vec3::new(hx, 0.0, hz),
            Vec3::new(hx, 0.0, -hz),
            Vec3::new(-hx, 0.0, -hz),
        ];
        let uv1 = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ];
        Self {
            positions,
            normals: vec![Vec3::y(); 4],
            uv1: Some(uv1),
            indices: vec![0, 1, 2, 0, 2, 3],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_cuboid_topology() {
        let mesh = Mesh::cuboid(Vec3::new(1.0, 2.0, 3.0));
        assert!(mesh.validate().is_ok());
        assert_eq!(mesh.triangle_count(), 12);
        let bounds = mesh.bounds().unwrap();
        assert_relative_eq!(bounds.max, Vec3::new(1.0, 2.0, 3.0));
        assert_relative_eq!(bounds.min, Vec3::new(-1.0, -2.0, -3.0));
    }

    #[test]
    fn test_cuboid_face_normals_point_outward() {
        let mesh = Mesh::cuboid(Vec3::new(1.0, 1.0, 1.0));
        for tri in mesh.triangles() {
            let geometric = tri.face_normal().normalize();
            assert_relative_eq!(geometric, tri.normals[0], epsilon = 1e-5);
            let centroid = (tri.positions[0] + tri.positions[1] + tri.positions[2]) / 3.0;
            assert!(centroid.dot(&geometric) > 0.0);
        }
    }

    #[test]
    fn test_cuboid_uv1_in_unit_square() {
        let mesh = Mesh::cuboid(Vec3::new(1.0, 1.0, 1.0));
        for uv in mesh.uv1.as_ref().unwrap() {
            assert!(uv.x > 0.0 && uv.x < 1.0 && uv.y > 0.0 && uv.y < 1.0);
        }
    }

    #[test]
    fn test_validate_rejects_bad_index() {
        let result = Mesh::new(
            vec![Vec3::zeros(); 3],
            vec![Vec3::y(); 3],
            None,
            vec![0, 1, 3],
        );
        assert!(matches!(result, Err(SceneError::InvalidMesh(_))));
    }

    #[test]
    fn test_triangles_without_uv1() {
        let mut mesh = Mesh::quad(2.0, 2.0);
        mesh.uv1 = None;
        assert!(!mesh.has_uv1());
        let tri = mesh.triangles().next().unwrap();
        assert_eq!(tri.uv1, [Vec2::zeros(); 3]);
    }
}
