//! Direction sampling shared by the bounce and environment kernels

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::foundation::math::{constants::TAU, utils, Vec3};

type SampleRng = SmallRng;

/// Direction distribution of a sampling pass
///
/// `CosineNormal` gives the best quality but trusts the voxel normal, which
/// is unreliable on thin geometry and at voxel-scale curvature. The
/// unoriented modes do not depend on the normal as much.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HemisphereMode {
    /// Cosine-weighted around the surface normal
    #[default]
    CosineNormal,
    /// Uniform over the half-space on the normal's side
    UniformHemisphere,
    /// Uniform over the full sphere, the normal is ignored
    UniformSphere,
}

/// A sampled direction and the weight that turns it into a cosine-weighted
/// estimate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionSample {
    /// Unit direction
    pub direction: Vec3,
    /// Estimator weight
    pub weight: f32,
}

impl HemisphereMode {
    /// Draw one direction around `normal`
    ///
    /// A zero normal falls back to uniform sphere sampling.
    pub fn sample(self, normal: &Vec3, rng: &mut impl Rng) -> DirectionSample {
        let xi = (rng.gen::<f32>(), rng.gen::<f32>());
        let Some(n) = normal.try_normalize(f32::EPSILON) else {
            return DirectionSample {
                direction: uniform_sphere(xi),
                weight: 1.0,
            };
        };
        match self {
            Self::CosineNormal => DirectionSample {
                direction: cosine_hemisphere(&n, xi),
                weight: 1.0,
            },
            Self::UniformHemisphere => {
                let mut direction = uniform_sphere(xi);
                let mut cos_theta = direction.dot(&n);
                if cos_theta < 0.0 {
                    direction = -direction;
                    cos_theta = -cos_theta;
                }
                DirectionSample {
                    direction,
                    weight: 2.0 * cos_theta,
                }
            }
            Self::UniformSphere => DirectionSample {
                direction: uniform_sphere(xi),
                weight: 1.0,
            },
        }
    }
}

/// Cosine-weighted direction around a unit normal
pub fn cosine_hemisphere(normal: &Vec3, xi: (f32, f32)) -> Vec3 {
    let r = xi.0.sqrt();
    let theta = TAU * xi.1;
    let x = r * theta.cos();
    let y = r * theta.sin();
    let z = (1.0 - xi.0).max(0.0).sqrt();
    tangent_to_world(normal, &Vec3::new(x, y, z))
}

/// Uniform direction on the unit sphere
pub fn uniform_sphere(xi: (f32, f32)) -> Vec3 {
    let z = 1.0 - 2.0 * xi.0;
    let r = (1.0 - z * z).max(0.0).sqrt();
    let phi = TAU * xi.1;
    Vec3::new(r * phi.cos(), r * phi.sin(), z)
}

fn tangent_to_world(normal: &Vec3, v: &Vec3) -> Vec3 {
    let (tangent, bitangent) = utils::orthonormal_basis(normal);
    (tangent * v.x + bitangent * v.y + normal * v.z).normalize()
}

/// Per-voxel generator derived from the dispatch `RandomSeed`
pub fn voxel_rng(random_seed: f32, voxel_index: usize) -> SampleRng {
    let seed = (u64::from(random_seed.to_bits()) << 32) ^ voxel_index as u64;
    SampleRng::seed_from_u64(seed)
}
